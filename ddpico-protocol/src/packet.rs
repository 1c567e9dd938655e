//! DDP packet header parsing
//!
//! Header layout (all multi-byte fields big-endian):
//! - 0: flags (bits 7-6 version, bit 4 timecode, bit 3 storage, bit 2 reply,
//!   bit 1 query, bit 0 push)
//! - 1: sequence number (low 4 bits)
//! - 2: data type
//! - 3: destination id
//! - 4-7: data offset in bytes
//! - 8-9: payload length in bytes

use core::ops::Range;

/// Fixed DDP header size
pub const HEADER_SIZE: usize = 10;

/// Maximum payload per packet (480 RGB pixels)
pub const MAX_PAYLOAD_SIZE: usize = 1440;

/// Bytes per RGB pixel
pub const BYTES_PER_PIXEL: usize = 3;

// Flag bits: byte 0
pub const FLAG_VERSION_MASK: u8 = 0xC0;
pub const FLAG_VERSION_1: u8 = 0x40;
pub const FLAG_TIMECODE: u8 = 0x10;
pub const FLAG_STORAGE: u8 = 0x08;
pub const FLAG_REPLY: u8 = 0x04;
pub const FLAG_QUERY: u8 = 0x02;
pub const FLAG_PUSH: u8 = 0x01;

/// Sequence bits: byte 1
const SEQUENCE_MASK: u8 = 0x0F;

// Data types: byte 2
/// Undefined type, sent by xLights and accepted as RGB
pub const DATA_TYPE_UNDEFINED: u8 = 0x00;
pub const DATA_TYPE_RGB: u8 = 0x01;

/// Default destination id for a single display
pub const DEST_ID_DEFAULT: u8 = 1;

/// Reasons a frame is rejected as a DDP packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketError {
    /// Version bits are not DDP version 1
    BadVersion,
    /// Data type is neither undefined nor RGB
    BadDataType,
    /// Declared payload length is zero or above [`MAX_PAYLOAD_SIZE`]
    BadLength,
    /// Frame is shorter than the header or the declared payload
    Truncated,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A validated DDP header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketHeader {
    /// Raw flag byte
    pub flags: u8,
    /// Sequence number (0-15)
    pub sequence: u8,
    /// Data type byte
    pub data_type: u8,
    /// Destination id
    pub dest_id: u8,
    /// Byte offset of the payload within the destination's pixel data
    pub offset: u32,
    /// Payload length in bytes
    pub length: u16,
}

impl PacketHeader {
    /// Header for an RGB payload starting at pixel byte `offset`
    pub fn rgb(dest_id: u8, offset: u32, length: u16, push: bool) -> Self {
        Self {
            flags: FLAG_VERSION_1 | if push { FLAG_PUSH } else { 0 },
            sequence: 0,
            data_type: DATA_TYPE_RGB,
            dest_id,
            offset,
            length,
        }
    }

    /// Parse and validate the header at the start of `frame`.
    ///
    /// Also checks that `frame` holds the full declared payload.
    pub fn parse(frame: &[u8]) -> Result<Self, PacketError> {
        let header: &[u8; HEADER_SIZE] = frame
            .get(..HEADER_SIZE)
            .and_then(|h| h.try_into().ok())
            .ok_or(PacketError::Truncated)?;

        let parsed = Self {
            flags: header[0],
            sequence: header[1] & SEQUENCE_MASK,
            data_type: header[2],
            dest_id: header[3],
            offset: u32::from_be_bytes([header[4], header[5], header[6], header[7]]),
            length: u16::from_be_bytes([header[8], header[9]]),
        };

        parsed.validate()?;

        if frame.len() < HEADER_SIZE + usize::from(parsed.length) {
            return Err(PacketError::Truncated);
        }

        Ok(parsed)
    }

    /// Check the header fields on their own
    pub fn validate(&self) -> Result<(), PacketError> {
        if self.flags & FLAG_VERSION_MASK != FLAG_VERSION_1 {
            return Err(PacketError::BadVersion);
        }
        if self.data_type != DATA_TYPE_UNDEFINED && self.data_type != DATA_TYPE_RGB {
            return Err(PacketError::BadDataType);
        }
        if self.length == 0 || usize::from(self.length) > MAX_PAYLOAD_SIZE {
            return Err(PacketError::BadLength);
        }
        Ok(())
    }

    /// Encode this header into the first [`HEADER_SIZE`] bytes of `buffer`
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, PacketError> {
        let out = buffer
            .get_mut(..HEADER_SIZE)
            .ok_or(PacketError::BufferTooSmall)?;

        out[0] = self.flags;
        out[1] = self.sequence & SEQUENCE_MASK;
        out[2] = self.data_type;
        out[3] = self.dest_id;
        out[4..8].copy_from_slice(&self.offset.to_be_bytes());
        out[8..10].copy_from_slice(&self.length.to_be_bytes());

        Ok(HEADER_SIZE)
    }

    /// Whether the display should be refreshed after this packet
    pub fn is_push(&self) -> bool {
        self.flags & FLAG_PUSH != 0
    }

    pub fn has_timecode(&self) -> bool {
        self.flags & FLAG_TIMECODE != 0
    }

    pub fn is_storage(&self) -> bool {
        self.flags & FLAG_STORAGE != 0
    }

    pub fn is_reply(&self) -> bool {
        self.flags & FLAG_REPLY != 0
    }

    pub fn is_query(&self) -> bool {
        self.flags & FLAG_QUERY != 0
    }

    /// Whole pixels in the payload; a trailing partial pixel is ignored
    pub fn pixel_count(&self) -> usize {
        usize::from(self.length) / BYTES_PER_PIXEL
    }

    /// First destination pixel written by this packet
    pub fn start_pixel(&self) -> u32 {
        self.offset / BYTES_PER_PIXEL as u32
    }

    /// Byte range of the payload within the frame
    pub fn payload_range(&self) -> Range<usize> {
        HEADER_SIZE..HEADER_SIZE + usize::from(self.length)
    }
}

/// A parsed DDP packet borrowing its payload from the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    pub header: PacketHeader,
    /// Exactly `header.length` bytes of RGB data
    pub payload: &'a [u8],
}

impl<'a> Packet<'a> {
    /// Parse a DDP packet from a decoded frame
    pub fn parse(frame: &'a [u8]) -> Result<Self, PacketError> {
        let header = PacketHeader::parse(frame)?;
        Ok(Self {
            header,
            payload: &frame[header.payload_range()],
        })
    }

    /// Iterate over the whole RGB pixels of the payload
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + 'a {
        self.payload
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|px| [px[0], px[1], px[2]])
    }
}

/// Write a complete packet (header and payload) into `buffer`
pub fn encode_packet(
    header: &PacketHeader,
    payload: &[u8],
    buffer: &mut [u8],
) -> Result<usize, PacketError> {
    let total = HEADER_SIZE + payload.len();
    let out = buffer.get_mut(..total).ok_or(PacketError::BufferTooSmall)?;
    header.encode(out)?;
    out[HEADER_SIZE..].copy_from_slice(payload);
    Ok(total)
}
