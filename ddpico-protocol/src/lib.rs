//! DDP-over-serial wire protocol
//!
//! This crate defines how DDP (Distributed Display Protocol) packets travel
//! over a serial byte stream to the LED controller. Each packet is COBS
//! encoded and terminated by a single `0x00` delimiter:
//!
//! ```text
//! ┌──────────────────────────────────────┬──────┐
//! │ COBS( DDP header ‖ RGB payload )     │ 0x00 │
//! │ up to MAX_FRAME_SIZE bytes           │ 1B   │
//! └──────────────────────────────────────┴──────┘
//! ```
//!
//! The DDP packet inside a frame has a fixed 10-byte header:
//!
//! ```text
//! ┌───────┬─────┬──────┬──────┬──────────┬────────┬─────────────┐
//! │ FLAGS │ SEQ │ TYPE │ DEST │ OFFSET   │ LENGTH │ PAYLOAD     │
//! │ 1B    │ 1B  │ 1B   │ 1B   │ 4B (BE)  │ 2B (BE)│ 1–1440B     │
//! └───────┴─────┴──────┴──────┴──────────┴────────┴─────────────┘
//! ```
//!
//! [`FrameDecoder`] turns the byte stream back into frames and
//! [`Packet::parse`] validates a frame and borrows its payload. Neither
//! allocates; all buffers are fixed-size and owned by their component.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod cobs;
pub mod packet;

pub use cobs::{FrameDecoder, FrameError, FRAME_DELIMITER, MAX_FRAME_SIZE};
pub use packet::{Packet, PacketError, PacketHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE};
