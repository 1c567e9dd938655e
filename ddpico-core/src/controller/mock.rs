//! Test doubles for the collaborator traits

use std::collections::VecDeque;

use smart_leds::RGB8;

use crate::traits::{ByteSource, LedDriver};

/// In-memory strip that records flushes
#[derive(Debug)]
pub struct MockStrip {
    pub pixels: Vec<RGB8>,
    pub shows: usize,
    pub brightness: u8,
    pub fail_show: bool,
}

impl MockStrip {
    pub fn new(len: usize) -> Self {
        Self {
            pixels: std::vec![RGB8::default(); len],
            shows: 0,
            brightness: 255,
            fail_show: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowFailed;

impl LedDriver for MockStrip {
    type Error = ShowFailed;

    fn led_count(&self) -> u16 {
        self.pixels.len() as u16
    }

    fn set_pixel(&mut self, index: u16, color: RGB8) {
        if let Some(pixel) = self.pixels.get_mut(usize::from(index)) {
            *pixel = color;
        }
    }

    fn pixel(&self, index: u16) -> Option<RGB8> {
        self.pixels.get(usize::from(index)).copied()
    }

    fn show(&mut self) -> Result<(), ShowFailed> {
        if self.fail_show {
            return Err(ShowFailed);
        }
        self.shows += 1;
        Ok(())
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
    }
}

/// Byte source fed from a buffer
#[derive(Debug, Default)]
pub struct MockSource {
    pub bytes: VecDeque<u8>,
}

impl MockSource {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.iter().copied().collect(),
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.bytes.extend(bytes.iter().copied());
    }
}

impl ByteSource for MockSource {
    fn bytes_available(&self) -> usize {
        self.bytes.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }
}

/// COBS-framed DDP packet with the given header fields
pub fn framed_packet(flags: u8, dest_id: u8, offset: u32, payload: &[u8]) -> Vec<u8> {
    let mut packet = std::vec![0u8; ddpico_protocol::HEADER_SIZE + payload.len()];
    packet[0] = flags;
    packet[2] = 0x00;
    packet[3] = dest_id;
    packet[4..8].copy_from_slice(&offset.to_be_bytes());
    packet[8..10].copy_from_slice(&(payload.len() as u16).to_be_bytes());
    packet[10..].copy_from_slice(payload);

    let mut encoded = std::vec![0u8; ddpico_protocol::cobs::max_encoded_len(packet.len())];
    let n = ddpico_protocol::cobs::encode(&packet, &mut encoded).unwrap();
    encoded.truncate(n);
    encoded
}
