//! State shared between the receive and apply contexts

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::queue::{FrameQueue, QUEUE_CAPACITY};
use crate::stats::{Statistics, StatsSnapshot};

/// Queue, counters, the running flag and the run epoch
///
/// Every start and stop bumps the epoch, so a receive context handed out
/// for an earlier run stays halted after a restart.
///
/// On firmware this lives in a `static`; both contexts borrow it.
///
/// ```ignore
/// static LINK: Link = Link::new();
/// ```
pub struct Link<const C: usize = QUEUE_CAPACITY> {
    queue: FrameQueue<C>,
    stats: Statistics,
    running: AtomicBool,
    epoch: AtomicU32,
}

impl<const C: usize> Default for Link<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const C: usize> Link<C> {
    pub const fn new() -> Self {
        Self {
            queue: FrameQueue::new(),
            stats: Statistics::new(),
            running: AtomicBool::new(false),
            epoch: AtomicU32::new(0),
        }
    }

    pub fn queue(&self) -> &FrameQueue<C> {
        &self.queue
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    /// Whether the receive context should keep consuming bytes
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Current run epoch
    pub fn epoch(&self) -> u32 {
        self.epoch.load(Ordering::Relaxed)
    }

    /// Whether a receive context started in `epoch` may keep running
    pub fn is_current(&self, epoch: u32) -> bool {
        self.is_running() && self.epoch() == epoch
    }

    /// Open a new run; returns its epoch
    pub(crate) fn start(&self) -> u32 {
        let epoch = self.epoch.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        self.running.store(true, Ordering::Relaxed);
        epoch
    }

    /// Close the current run
    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        self.epoch.fetch_add(1, Ordering::Relaxed);
    }

    /// Empty the queue and zero the counters
    pub(crate) fn reset(&self) {
        self.queue.clear();
        self.stats.reset();
    }

    /// Current counters plus queue usage
    pub fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot(self.queue.usage_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_link_is_stopped() {
        let link: Link<64> = Link::new();
        assert!(!link.is_running());
        assert!(link.queue().is_empty());
        assert_eq!(link.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_reset_clears_queue_and_stats() {
        let link: Link<64> = Link::new();
        link.queue().write(&[1, 2, 3]).unwrap();
        link.stats().record_received();
        link.start();

        link.reset();

        assert!(link.queue().is_empty());
        assert_eq!(link.stats().received(), 0);
        // Running flag is owned by the lifecycle, not by reset
        assert!(link.is_running());
    }

    #[test]
    fn test_snapshot_reports_usage() {
        let link: Link<100> = Link::new();
        link.queue().write(&[0xAA; 8]).unwrap();
        assert_eq!(link.snapshot().queue_usage_percent, 10.0);
    }

    #[test]
    fn test_epoch_changes_on_start_and_stop() {
        let link: Link<64> = Link::new();

        let first = link.start();
        assert!(link.is_current(first));

        link.stop();
        assert!(!link.is_current(first));

        let second = link.start();
        assert_ne!(first, second);
        assert!(link.is_current(second));
        assert!(!link.is_current(first));
    }
}
