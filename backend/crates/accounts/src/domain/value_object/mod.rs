//! Value Objects

pub mod email;
pub mod username;
