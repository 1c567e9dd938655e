//! Pipeline statistics
//!
//! Counters are shared between the receive and apply contexts. Each one is
//! independent, so relaxed ordering is enough.

use portable_atomic::{AtomicU32, Ordering};

/// Packet counters
#[derive(Debug, Default)]
pub struct Statistics {
    received: AtomicU32,
    processed: AtomicU32,
    dropped: AtomicU32,
    framing_errors: AtomicU32,
}

/// Point-in-time copy of [`Statistics`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsSnapshot {
    /// Frames decoded and queued
    pub received: u32,
    /// Packets parsed and routed
    pub processed: u32,
    /// Frames lost to a full queue, a bad header or an unknown destination
    pub dropped: u32,
    /// Oversize or undecodable frames
    pub framing_errors: u32,
    /// Queue occupancy at the time of the snapshot
    pub queue_usage_percent: f32,
}

impl Statistics {
    pub const fn new() -> Self {
        Self {
            received: AtomicU32::new(0),
            processed: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            framing_errors: AtomicU32::new(0),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.received.store(0, Ordering::Relaxed);
        self.processed.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.framing_errors.store(0, Ordering::Relaxed);
    }

    /// Count a frame queued; returns the new total
    pub fn record_received(&self) -> u32 {
        self.received.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Count a packet applied; returns the new total
    pub fn record_processed(&self) -> u32 {
        self.processed.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Count a dropped frame; returns the new total
    pub fn record_dropped(&self) -> u32 {
        self.dropped.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Count a framing error; returns the new total
    pub fn record_framing_error(&self) -> u32 {
        self.framing_errors
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1)
    }

    pub fn received(&self) -> u32 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> u32 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn framing_errors(&self) -> u32 {
        self.framing_errors.load(Ordering::Relaxed)
    }

    /// Copy the counters, tagging them with the current queue usage
    pub fn snapshot(&self, queue_usage_percent: f32) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received(),
            processed: self.processed(),
            dropped: self.dropped(),
            framing_errors: self.framing_errors(),
            queue_usage_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = Statistics::new();
        assert_eq!(stats.snapshot(0.0), StatsSnapshot::default());
    }

    #[test]
    fn test_record_returns_new_total() {
        let stats = Statistics::new();
        assert_eq!(stats.record_received(), 1);
        assert_eq!(stats.record_received(), 2);
        assert_eq!(stats.record_dropped(), 1);
        assert_eq!(stats.record_processed(), 1);
        assert_eq!(stats.record_framing_error(), 1);
        assert_eq!(stats.received(), 2);
    }

    #[test]
    fn test_reset() {
        let stats = Statistics::new();
        stats.record_received();
        stats.record_processed();
        stats.record_dropped();
        stats.record_framing_error();
        stats.reset();

        let snapshot = stats.snapshot(12.5);
        assert_eq!(snapshot.received, 0);
        assert_eq!(snapshot.processed, 0);
        assert_eq!(snapshot.dropped, 0);
        assert_eq!(snapshot.framing_errors, 0);
        assert_eq!(snapshot.queue_usage_percent, 12.5);
    }
}
