//! [`LedDriver`] over any `smart_leds` writer

use smart_leds::{brightness, SmartLedsWrite, RGB8};

use crate::traits::led::{LedDriver, OFF};

/// Buffered strip of `N` LEDs flushed through a [`SmartLedsWrite`] writer
/// (e.g. a WS2812 PIO driver).
///
/// Brightness is applied on the way out, so staged pixels keep full range.
pub struct SmartLedsStrip<W, const N: usize> {
    writer: W,
    pixels: [RGB8; N],
    brightness: u8,
}

impl<W, const N: usize> SmartLedsStrip<W, N>
where
    W: SmartLedsWrite<Color = RGB8>,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pixels: [OFF; N],
            brightness: 255,
        }
    }

    /// Staged pixels
    pub fn pixels(&self) -> &[RGB8; N] {
        &self.pixels
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W, const N: usize> LedDriver for SmartLedsStrip<W, N>
where
    W: SmartLedsWrite<Color = RGB8>,
{
    type Error = W::Error;

    fn led_count(&self) -> u16 {
        u16::try_from(N).unwrap_or(u16::MAX)
    }

    fn set_pixel(&mut self, index: u16, color: RGB8) {
        if let Some(pixel) = self.pixels.get_mut(usize::from(index)) {
            *pixel = color;
        }
    }

    fn pixel(&self, index: u16) -> Option<RGB8> {
        self.pixels.get(usize::from(index)).copied()
    }

    fn show(&mut self) -> Result<(), Self::Error> {
        self.writer
            .write(brightness(self.pixels.iter().copied(), self.brightness))
    }

    fn set_brightness(&mut self, level: u8) {
        self.brightness = level;
    }

    fn clear(&mut self) {
        self.pixels = [OFF; N];
    }

    fn fill(&mut self, color: RGB8) {
        self.pixels = [color; N];
    }
}
