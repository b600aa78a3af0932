//! Weather API integration
//!
//! Typed client for the upstream weather provider.

pub mod client;
pub mod types;
