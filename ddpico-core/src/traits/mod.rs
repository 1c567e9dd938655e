//! Hardware abstraction traits
//!
//! These traits define the interface between the packet pipeline
//! and board-specific implementations.

pub mod led;
pub mod transport;

pub use led::LedDriver;
pub use transport::ByteSource;
