//! Shared Kernel - Domain-crossing minimal core
//!
//! The smallest vocabulary every service crate agrees on:
//! - Unified error type and result alias
//! - Error classification mapped to HTTP status codes
//!
//! **Design Principle**: only things that are hard to change and mean
//! the same thing in every domain belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
