//! Utils Module - shared constants

pub mod constants;

pub use constants::*;
