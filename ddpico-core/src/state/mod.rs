//! Controller lifecycle state machine
//!
//! The lifecycle is explicit, finite, and deterministic. Packet handling is
//! only active while [`ControllerState::Running`].

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::ControllerState;
