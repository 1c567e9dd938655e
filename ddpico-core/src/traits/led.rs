//! LED strip driver trait

use smart_leds::RGB8;

/// Black, used for clearing
pub const OFF: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// Trait for an addressable LED strip
///
/// Pixel writes only touch a staging buffer. Nothing reaches the LEDs
/// until [`LedDriver::show`] is called.
pub trait LedDriver {
    /// Error returned when flushing to the strip fails
    type Error;

    /// Number of LEDs on the strip
    fn led_count(&self) -> u16;

    /// Stage one pixel. Out-of-range indices are ignored.
    fn set_pixel(&mut self, index: u16, color: RGB8);

    /// Read back a staged pixel
    fn pixel(&self, index: u16) -> Option<RGB8>;

    /// Flush staged pixels to the strip
    fn show(&mut self) -> Result<(), Self::Error>;

    /// Set driver-level brightness (255 = unscaled)
    fn set_brightness(&mut self, level: u8);

    /// Stage every pixel as off
    fn clear(&mut self) {
        self.fill(OFF);
    }

    /// Stage every pixel as `color`
    fn fill(&mut self, color: RGB8) {
        for index in 0..self.led_count() {
            self.set_pixel(index, color);
        }
    }
}
