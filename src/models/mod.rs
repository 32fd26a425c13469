//! Models Module - Data Structures & Configuration
//!
//! Snapshot types, error codes, environment configuration and the
//! per-network fallback constants.

pub mod config;
pub mod errors;
pub mod types;

pub use config::*;
pub use errors::*;
pub use types::*;
