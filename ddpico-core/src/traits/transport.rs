//! Serial transport trait

/// Trait for a non-blocking byte stream (USB CDC, UART, ...)
pub trait ByteSource {
    /// Bytes that can be read without waiting
    fn bytes_available(&self) -> usize;

    /// Read one byte, `None` if nothing is pending
    fn read_byte(&mut self) -> Option<u8>;
}
