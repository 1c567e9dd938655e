//! Bounded frame queue between the receive and apply contexts
//!
//! Frames are stored back to back in one circular byte buffer, each behind a
//! 2-byte big-endian length prefix. A single blocking mutex guards the whole
//! buffer for the duration of one `write` or `read`.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Default queue capacity in bytes (holds ~10 full DDP packets)
pub const QUEUE_CAPACITY: usize = 16 * 1024;

/// Size of the per-entry length prefix
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Reasons a frame is refused by [`FrameQueue::write`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// Zero-length frames are never queued
    Empty,
    /// Frame can never fit in this queue
    TooLarge,
    /// Not enough free space right now; the frame is shed
    Full,
}

/// Outcome of a single dequeue, computed under the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadOutcome {
    Nothing,
    Frame(usize),
    /// Length prefix was inconsistent; the queue was reset
    Corrupt { declared: usize, buffered: usize },
}

struct Ring<const C: usize> {
    buf: [u8; C],
    write_idx: usize,
    read_idx: usize,
    count: usize,
}

impl<const C: usize> Ring<C> {
    const fn new() -> Self {
        Self {
            buf: [0; C],
            write_idx: 0,
            read_idx: 0,
            count: 0,
        }
    }

    fn clear(&mut self) {
        self.write_idx = 0;
        self.read_idx = 0;
        self.count = 0;
    }

    fn copy_in(&mut self, data: &[u8]) {
        let first = (C - self.write_idx).min(data.len());
        let (head, tail) = data.split_at(first);
        self.buf[self.write_idx..self.write_idx + first].copy_from_slice(head);
        self.buf[..tail.len()].copy_from_slice(tail);
        self.write_idx = (self.write_idx + data.len()) % C;
    }

    fn copy_out(&mut self, out: &mut [u8]) {
        let first = (C - self.read_idx).min(out.len());
        let (head, tail) = out.split_at_mut(first);
        head.copy_from_slice(&self.buf[self.read_idx..self.read_idx + first]);
        let rest = tail.len();
        tail.copy_from_slice(&self.buf[..rest]);
        self.read_idx = (self.read_idx + out.len()) % C;
    }

    fn write(&mut self, data: &[u8]) -> Result<(), QueueError> {
        if data.is_empty() {
            return Err(QueueError::Empty);
        }
        if data.len() > C || data.len() > usize::from(u16::MAX) {
            return Err(QueueError::TooLarge);
        }

        let required = data.len() + LENGTH_PREFIX_SIZE;
        if self.count + required > C {
            return Err(QueueError::Full);
        }

        // Fits in u16, checked above
        let prefix = (data.len() as u16).to_be_bytes();
        self.copy_in(&prefix);
        self.copy_in(data);
        self.count += required;
        Ok(())
    }

    fn read(&mut self, out: &mut [u8]) -> ReadOutcome {
        if self.count < LENGTH_PREFIX_SIZE {
            return ReadOutcome::Nothing;
        }

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        self.copy_out(&mut prefix);
        let length = usize::from(u16::from_be_bytes(prefix));

        if length == 0 || length > out.len() || self.count < length + LENGTH_PREFIX_SIZE {
            let buffered = self.count;
            self.read_idx = self.write_idx;
            self.count = 0;
            return ReadOutcome::Corrupt {
                declared: length,
                buffered,
            };
        }

        self.copy_out(&mut out[..length]);
        self.count -= length + LENGTH_PREFIX_SIZE;
        ReadOutcome::Frame(length)
    }
}

/// Fixed-capacity, length-prefixed frame queue shared by two contexts.
///
/// `const fn new` lets it live in a `static`. Only whole frames cross the
/// queue; cursors stay private.
pub struct FrameQueue<const C: usize = QUEUE_CAPACITY> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Ring<C>>>,
}

impl<const C: usize> Default for FrameQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const C: usize> FrameQueue<C> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Ring::new())),
        }
    }

    /// Total capacity in bytes, prefixes included
    pub const fn capacity(&self) -> usize {
        C
    }

    /// Enqueue one frame
    ///
    /// Fails without side effects when the frame is empty, can never fit, or
    /// does not fit in the space currently free.
    pub fn write(&self, data: &[u8]) -> Result<(), QueueError> {
        self.inner.lock(|ring| ring.borrow_mut().write(data))
    }

    /// Dequeue the oldest frame into `out`
    ///
    /// Returns the frame length, or 0 when nothing is queued. A length prefix
    /// that is zero, larger than `out`, or larger than the buffered bytes
    /// means the queue is corrupt: everything queued is discarded and 0 is
    /// returned.
    pub fn read(&self, out: &mut [u8]) -> usize {
        match self.inner.lock(|ring| ring.borrow_mut().read(out)) {
            ReadOutcome::Nothing => 0,
            ReadOutcome::Frame(length) => length,
            ReadOutcome::Corrupt { declared, buffered } => {
                warn!(
                    "Queue corrupt (declared {} bytes, {} buffered), resetting",
                    declared,
                    buffered
                );
                0
            }
        }
    }

    /// Whether at least a length prefix is buffered
    pub fn available(&self) -> bool {
        self.len() >= LENGTH_PREFIX_SIZE
    }

    /// Bytes in flight, prefixes included
    pub fn len(&self) -> usize {
        self.inner.lock(|ring| ring.borrow().count)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes still free, prefixes included
    pub fn free_space(&self) -> usize {
        C - self.len()
    }

    /// Drop everything and rewind both cursors
    pub fn clear(&self) {
        self.inner.lock(|ring| ring.borrow_mut().clear());
    }

    /// Occupancy in percent, for monitoring only
    pub fn usage_percent(&self) -> f32 {
        if C == 0 {
            return 0.0;
        }
        self.len() as f32 * 100.0 / C as f32
    }
}
