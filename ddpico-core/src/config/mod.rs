//! Configuration types
//!
//! Board-agnostic settings for the limiter, outputs, and controller.
//! Buffer capacities are compile-time constants.

pub mod types;

pub use types::*;
