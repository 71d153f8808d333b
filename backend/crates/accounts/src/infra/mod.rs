//! Infrastructure Layer
//!
//! Repository implementations and identity-provider clients.

pub mod google;
pub mod postgres;

#[cfg(test)]
pub mod memory;
