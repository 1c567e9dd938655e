//! Board-agnostic core logic for the DDPico LED controller
//!
//! This crate contains the packet pipeline that does not depend on a
//! specific board:
//!
//! - Bounded frame queue shared between the receive and apply contexts
//! - Brightness limiter
//! - Controller lifecycle and packet routing to LED outputs
//! - Hardware abstraction traits (LED strip, byte transport)
//! - Configuration type definitions

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod controller;
pub mod limiter;
pub mod queue;
pub mod state;
pub mod stats;
pub mod strip;
pub mod traits;

pub use controller::{
    Applied, Controller, ControllerError, Link, Output, ReceiveRate, Receiver, Update,
};
pub use limiter::BrightnessLimiter;
pub use queue::{FrameQueue, QueueError};
pub use state::{ControllerState, Event};
pub use stats::{Statistics, StatsSnapshot};
pub use strip::SmartLedsStrip;
pub use traits::{ByteSource, LedDriver};

pub use smart_leds::RGB8;
