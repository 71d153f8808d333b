//! Presentation Layer
//!
//! HTTP handlers, DTOs, access-policy middleware and router.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
