//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations:
//! - Password hashing (Argon2id)
//! - Password strength policy (length, common passwords, numeric-only,
//!   similarity to account attributes)

pub mod password;
