//! One LED strip addressed by a DDP destination id

use ddpico_protocol::PacketHeader;
use smart_leds::RGB8;

use crate::config::OutputConfig;
use crate::limiter::BrightnessLimiter;
use crate::traits::LedDriver;

/// What applying one packet to an output did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Applied {
    /// First pixel written
    pub start: usize,
    /// Pixels written after clamping (0 if the write started past the end)
    pub pixels: usize,
    /// Limiter scale used
    pub scale: u8,
    /// A push was requested and the flush succeeded
    pub shown: bool,
}

/// LED driver plus its limiter
pub struct Output<D: LedDriver> {
    dest_id: u8,
    driver: D,
    limiter: BrightnessLimiter,
}

impl<D: LedDriver> Output<D> {
    pub(crate) fn new(driver: D, config: OutputConfig) -> Self {
        let limiter = BrightnessLimiter::new(driver.led_count(), config.limiter);
        Self {
            dest_id: config.dest_id,
            driver,
            limiter,
        }
    }

    pub fn dest_id(&self) -> u8 {
        self.dest_id
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn limiter(&self) -> &BrightnessLimiter {
        &self.limiter
    }

    /// Limit `payload` in place and write it to the strip
    ///
    /// Writes starting past the end of the strip are skipped; writes running
    /// off the end are clamped. The push flag is honored either way.
    pub fn apply(&mut self, header: &PacketHeader, payload: &mut [u8]) -> Applied {
        let led_count = usize::from(self.driver.led_count());
        let start = header.start_pixel() as usize;
        let mut pixels = header.pixel_count().min(payload.len() / 3);
        let mut scale = 0;

        if start >= led_count {
            warn!(
                "Start pixel {} past end of strip ({} LEDs), skipping",
                start,
                led_count
            );
            pixels = 0;
        } else {
            pixels = pixels.min(led_count - start);
            scale = self.limiter.apply(payload, pixels);

            for (i, px) in payload.chunks_exact(3).take(pixels).enumerate() {
                // start + i < led_count <= u16::MAX
                self.driver
                    .set_pixel((start + i) as u16, RGB8::new(px[0], px[1], px[2]));
            }
        }

        let shown = header.is_push() && self.show();

        Applied {
            start,
            pixels,
            scale,
            shown,
        }
    }

    /// Stage all pixels off and flush
    pub fn blank(&mut self) -> bool {
        self.driver.clear();
        self.show()
    }

    fn show(&mut self) -> bool {
        match self.driver.show() {
            Ok(()) => true,
            Err(_) => {
                warn!("Strip {} flush failed", self.dest_id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::MockStrip;
    use super::*;
    use crate::config::LimiterConfig;

    fn output(len: usize) -> Output<MockStrip> {
        Output::new(MockStrip::new(len), OutputConfig::new(1))
    }

    fn header(offset: u32, length: u16, push: bool) -> PacketHeader {
        PacketHeader::rgb(1, offset, length, push)
    }

    #[test]
    fn test_apply_writes_pixels() {
        let mut out = output(4);
        let mut payload = [10, 20, 30, 40, 50, 60];

        let applied = out.apply(&header(0, 6, true), &mut payload);

        assert_eq!(applied.pixels, 2);
        assert!(applied.shown);
        assert_eq!(out.driver().pixel(0), Some(RGB8::new(9, 19, 29)));
        assert_eq!(out.driver().pixel(1), Some(RGB8::new(39, 49, 59)));
        assert_eq!(out.driver().shows, 1);
    }

    #[test]
    fn test_apply_uses_byte_offset() {
        let mut out = output(4);
        let mut payload = [0, 0, 255];

        let applied = out.apply(&header(6, 3, false), &mut payload);

        assert_eq!(applied.start, 2);
        assert_eq!(out.driver().pixel(2), Some(RGB8::new(0, 0, 254)));
        assert_eq!(out.driver().pixel(0), Some(RGB8::default()));
    }

    #[test]
    fn test_apply_without_push_does_not_show() {
        let mut out = output(2);
        let applied = out.apply(&header(0, 3, false), &mut [1, 1, 1]);
        assert!(!applied.shown);
        assert_eq!(out.driver().shows, 0);
    }

    #[test]
    fn test_apply_clamps_to_strip() {
        let mut out = output(3);
        let mut payload = [200u8; 12];

        let applied = out.apply(&header(3, 12, true), &mut payload);

        assert_eq!(applied.start, 1);
        assert_eq!(applied.pixels, 2);
        // Pixels past the strip stay untouched in the payload too
        assert_eq!(&payload[6..], &[200u8; 6]);
    }

    #[test]
    fn test_apply_past_end_is_skipped() {
        let mut out = output(3);
        let mut payload = [200u8; 3];

        let applied = out.apply(&header(9, 3, true), &mut payload);

        assert_eq!(applied.pixels, 0);
        assert_eq!(payload, [200u8; 3]);
        assert!(out.driver().pixels.iter().all(|px| *px == RGB8::default()));
        // Push still flushes what is already staged
        assert!(applied.shown);
    }

    #[test]
    fn test_apply_limits_brightness() {
        let mut out = Output::new(
            MockStrip::new(6),
            OutputConfig {
                dest_id: 1,
                limiter: LimiterConfig::default(),
            },
        );
        let mut payload = [200u8; 18];

        let applied = out.apply(&header(0, 18, true), &mut payload);

        assert_eq!(applied.scale, 102);
        assert_eq!(out.driver().pixel(5), Some(RGB8::new(79, 79, 79)));
    }

    #[test]
    fn test_failed_show_is_reported() {
        let mut out = output(1);
        out.driver_mut().fail_show = true;
        let applied = out.apply(&header(0, 3, true), &mut [1, 2, 3]);
        assert!(!applied.shown);
        assert!(!out.blank());
    }

    #[test]
    fn test_blank_clears_and_shows() {
        let mut out = output(2);
        out.driver_mut().set_pixel(1, RGB8::new(5, 5, 5));
        assert!(out.blank());
        assert_eq!(out.driver().pixel(1), Some(RGB8::default()));
        assert_eq!(out.driver().shows, 1);
    }
}
