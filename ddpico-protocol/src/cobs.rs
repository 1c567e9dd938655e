//! COBS framing for the serial link.
//!
//! Frame format on the wire:
//! - BODY: Consistent Overhead Byte Stuffing of one DDP packet. The body
//!   never contains `0x00`.
//! - DELIMITER (1 byte): `0x00`
//!
//! Each COBS run starts with a code byte `R`. The next `R - 1` bytes are copied
//! verbatim, and an implicit zero follows unless the run is the last one or
//! `R == 0xFF`.

use heapless::Vec;

/// Frame delimiter byte
pub const FRAME_DELIMITER: u8 = 0x00;

/// Default maximum encoded frame size (excluding the delimiter)
pub const MAX_FRAME_SIZE: usize = 2048;

/// Longest run a single code byte can describe
const MAX_RUN_CODE: u8 = 0xFF;

/// Errors that can occur during frame decoding or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Raw bytes overflowed the accumulation buffer before a delimiter arrived
    FrameTooLarge,
    /// Zero code byte, run past the end of input, or decoded output overflow
    InvalidEncoding,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// Worst-case encoded size of `len` bytes, including the trailing delimiter
pub const fn max_encoded_len(len: usize) -> usize {
    len + len / 254 + 2
}

/// Decode one COBS body (without its delimiter) into `output`.
///
/// Returns the number of decoded bytes. An empty body decodes to zero bytes.
pub fn decode(input: &[u8], output: &mut [u8]) -> Result<usize, FrameError> {
    let mut in_pos = 0;
    let mut out_pos = 0;

    while in_pos < input.len() {
        let code = input[in_pos];
        in_pos += 1;

        if code == FRAME_DELIMITER {
            return Err(FrameError::InvalidEncoding);
        }

        let run = usize::from(code) - 1;
        let run_end = in_pos + run;
        let src = input
            .get(in_pos..run_end)
            .ok_or(FrameError::InvalidEncoding)?;
        output
            .get_mut(out_pos..out_pos + run)
            .ok_or(FrameError::InvalidEncoding)?
            .copy_from_slice(src);
        in_pos = run_end;
        out_pos += run;

        if code != MAX_RUN_CODE && in_pos < input.len() {
            *output.get_mut(out_pos).ok_or(FrameError::InvalidEncoding)? = 0;
            out_pos += 1;
        }
    }

    Ok(out_pos)
}

/// Encode `input` as one COBS frame, delimiter included.
///
/// Returns the number of bytes written.
pub fn encode(input: &[u8], output: &mut [u8]) -> Result<usize, FrameError> {
    if output.len() < max_encoded_len(input.len()) {
        return Err(FrameError::BufferTooSmall);
    }

    let mut code_idx = 0;
    let mut out_pos = 1;
    let mut code: u8 = 1;

    for &byte in input {
        if byte == 0 {
            output[code_idx] = code;
            code_idx = out_pos;
            out_pos += 1;
            code = 1;
        } else {
            output[out_pos] = byte;
            out_pos += 1;
            code += 1;
            if code == MAX_RUN_CODE {
                output[code_idx] = code;
                code_idx = out_pos;
                out_pos += 1;
                code = 1;
            }
        }
    }

    output[code_idx] = code;
    output[out_pos] = FRAME_DELIMITER;
    Ok(out_pos + 1)
}

/// Encode `input` into a heapless Vec, delimiter included
pub fn encode_to_vec<const N: usize>(input: &[u8]) -> Result<Vec<u8, N>, FrameError> {
    let mut vec = Vec::new();
    vec.resize(max_encoded_len(input.len()), 0)
        .map_err(|_| FrameError::BufferTooSmall)?;
    let len = encode(input, &mut vec)?;
    vec.truncate(len);
    Ok(vec)
}

/// Streaming decoder that turns a serial byte stream into frames.
///
/// Both the raw accumulation buffer and the decoded buffer are inline arrays
/// of `N` bytes, so a decoder never allocates after construction.
#[derive(Debug, Clone)]
pub struct FrameDecoder<const N: usize = MAX_FRAME_SIZE> {
    state: DecodeState,
    raw: [u8; N],
    raw_len: usize,
    decoded: [u8; N],
    decoded_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Collecting body bytes until the next delimiter
    Accumulating,
    /// Overflowed; dropping everything up to the next delimiter
    Discarding,
}

impl<const N: usize> Default for FrameDecoder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameDecoder<N> {
    /// Create a new frame decoder
    pub const fn new() -> Self {
        Self {
            state: DecodeState::Accumulating,
            raw: [0; N],
            raw_len: 0,
            decoded: [0; N],
            decoded_len: 0,
        }
    }

    /// Reset the decoder state
    pub fn reset(&mut self) {
        self.state = DecodeState::Accumulating;
        self.raw_len = 0;
        self.decoded_len = 0;
    }

    /// Feed a single byte to the decoder
    ///
    /// Returns `Ok(Some(frame))` when a delimiter completes a non-empty frame,
    /// `Ok(None)` when more bytes are needed, or `Err` when the pending frame
    /// is dropped. After [`FrameError::FrameTooLarge`] the decoder ignores
    /// input until the next delimiter, then starts over.
    pub fn feed(&mut self, byte: u8) -> Result<Option<&[u8]>, FrameError> {
        self.decoded_len = 0;

        if byte == FRAME_DELIMITER {
            let raw_len = core::mem::replace(&mut self.raw_len, 0);
            if self.state == DecodeState::Discarding {
                self.state = DecodeState::Accumulating;
                return Ok(None);
            }
            if raw_len == 0 {
                return Ok(None);
            }

            let len = decode(&self.raw[..raw_len], &mut self.decoded)?;
            if len == 0 {
                return Ok(None);
            }
            self.decoded_len = len;
            return Ok(Some(&self.decoded[..len]));
        }

        match self.state {
            DecodeState::Discarding => Ok(None),
            DecodeState::Accumulating => match self.raw.get_mut(self.raw_len) {
                Some(slot) => {
                    *slot = byte;
                    self.raw_len += 1;
                    Ok(None)
                }
                None => {
                    self.raw_len = 0;
                    self.state = DecodeState::Discarding;
                    Err(FrameError::FrameTooLarge)
                }
            },
        }
    }

    /// The most recently completed frame
    ///
    /// Empty unless the last byte fed completed a frame.
    pub fn frame(&self) -> &[u8] {
        &self.decoded[..self.decoded_len]
    }

    /// Whether the decoder is skipping an oversize frame
    pub fn is_discarding(&self) -> bool {
        self.state == DecodeState::Discarding
    }

    /// Number of body bytes buffered since the last delimiter
    pub fn pending(&self) -> usize {
        self.raw_len
    }
}
