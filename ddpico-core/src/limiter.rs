//! Dynamic brightness limiter
//!
//! Scales pixel data down as more LEDs light up, so total current draw stays
//! roughly constant:
//! - `max_scale` for `threshold` or fewer lit pixels
//! - `min_scale` when every LED is lit
//! - linear in between
//!
//! Integer math only; channels are scaled with `(c * scale) >> 8`.

use crate::config::LimiterConfig;

/// Bytes per RGB pixel
const BYTES_PER_PIXEL: usize = 3;

/// Per-output brightness limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BrightnessLimiter {
    total_leds: u16,
    max_scale: u8,
    min_scale: u8,
    threshold: u16,
}

impl BrightnessLimiter {
    /// Create a limiter for a strip of `total_leds` LEDs
    pub fn new(total_leds: u16, config: LimiterConfig) -> Self {
        Self {
            total_leds,
            max_scale: config.max_scale,
            min_scale: config.min_scale,
            threshold: config.threshold,
        }
    }

    /// Number of LEDs this limiter assumes when interpolating
    pub fn total_leds(&self) -> u16 {
        self.total_leds
    }

    /// Count pixels with any nonzero channel among the first `pixel_count`
    pub fn count_lit(payload: &[u8], pixel_count: usize) -> usize {
        let len = (pixel_count * BYTES_PER_PIXEL).min(payload.len());
        payload[..len]
            .chunks_exact(BYTES_PER_PIXEL)
            .filter(|px| px[0] | px[1] | px[2] != 0)
            .count()
    }

    /// Scale factor (0-255) for `lit` lit pixels
    pub fn scale_for(&self, lit: usize) -> u8 {
        let threshold = usize::from(self.threshold);
        let total = usize::from(self.total_leds);

        if lit <= threshold {
            return self.max_scale;
        }
        if lit >= total {
            return self.min_scale;
        }

        // threshold < lit < total, so range > diff > 0
        let range = (total - threshold) as u32;
        let diff = (lit - threshold) as u32;
        let span = u32::from(self.max_scale.saturating_sub(self.min_scale));
        let reduction = (diff * span) / range;

        // reduction <= span <= max_scale
        self.max_scale - reduction as u8
    }

    /// Limit the first `pixel_count` pixels of `payload` in place
    ///
    /// Lit pixels are counted within this payload only. Returns the scale
    /// that was applied.
    pub fn apply(&self, payload: &mut [u8], pixel_count: usize) -> u8 {
        let scale = self.scale_for(Self::count_lit(payload, pixel_count));

        let len = (pixel_count * BYTES_PER_PIXEL).min(payload.len());
        for channel in &mut payload[..len - len % BYTES_PER_PIXEL] {
            *channel = scale_channel(*channel, scale);
        }

        scale
    }
}

#[inline]
fn scale_channel(value: u8, scale: u8) -> u8 {
    ((u16::from(value) * u16::from(scale)) >> 8) as u8
}
