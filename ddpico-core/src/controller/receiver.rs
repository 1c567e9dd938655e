//! Receive context: serial bytes to queued frames

use ddpico_protocol::FrameDecoder;

use super::link::Link;
use crate::config::RECEIVE_RATE_INTERVAL_MS;
use crate::queue::QUEUE_CAPACITY;
use crate::traits::ByteSource;

/// Frames queued over one reporting window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveRate {
    pub frames: u32,
    pub elapsed_ms: u32,
}

/// Owns the transport and the frame decoder for one run of the controller.
///
/// Created by [`Controller::begin`](super::Controller::begin). Stops
/// consuming bytes as soon as that run ends, even if a later run has
/// started on the same link.
pub struct Receiver<'a, T: ByteSource, const C: usize = QUEUE_CAPACITY> {
    link: &'a Link<C>,
    epoch: u32,
    transport: T,
    decoder: FrameDecoder,
    log_first: u32,
    window_start_ms: Option<u32>,
    window_received: u32,
}

impl<'a, T: ByteSource, const C: usize> Receiver<'a, T, C> {
    pub(crate) fn new(link: &'a Link<C>, epoch: u32, transport: T, log_first: u32) -> Self {
        Self {
            link,
            epoch,
            transport,
            decoder: FrameDecoder::new(),
            log_first,
            window_start_ms: None,
            window_received: 0,
        }
    }

    /// Whether this receiver's run is still active
    pub fn is_active(&self) -> bool {
        self.link.is_current(self.epoch)
    }

    /// Drain the bytes the transport has ready
    ///
    /// Returns the number of bytes consumed. The run is checked before
    /// every byte.
    pub fn poll(&mut self) -> usize {
        let stats = self.link.stats();
        let mut consumed = 0;

        while self.is_active() && self.transport.bytes_available() > 0 {
            let Some(byte) = self.transport.read_byte() else {
                break;
            };
            consumed += 1;

            match self.decoder.feed(byte) {
                Ok(Some(frame)) => match self.link.queue().write(frame) {
                    Ok(()) => {
                        let received = stats.record_received();
                        if received <= self.log_first {
                            debug!("Frame #{} queued ({} bytes)", received, frame.len());
                        }
                    }
                    Err(e) => {
                        stats.record_dropped();
                        warn!("Queue full, dropping {} byte frame: {:?}", frame.len(), e);
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    stats.record_framing_error();
                    debug!("Frame error: {:?}", e);
                }
            }
        }

        consumed
    }

    /// Summarize the receive rate once per reporting window
    ///
    /// Returns the frames queued since the previous summary once
    /// `RECEIVE_RATE_INTERVAL_MS` has elapsed.
    pub fn tick(&mut self, now_ms: u32) -> Option<ReceiveRate> {
        let received = self.link.stats().received();
        let start = match self.window_start_ms {
            Some(start) => start,
            None => {
                self.window_start_ms = Some(now_ms);
                self.window_received = received;
                return None;
            }
        };

        let elapsed_ms = now_ms.wrapping_sub(start);
        if elapsed_ms < RECEIVE_RATE_INTERVAL_MS {
            return None;
        }

        let rate = ReceiveRate {
            frames: received.wrapping_sub(self.window_received),
            elapsed_ms,
        };
        self.window_start_ms = Some(now_ms);
        self.window_received = received;

        if rate.frames > 0 {
            debug!("{} frames received in last {} ms", rate.frames, rate.elapsed_ms);
        }
        Some(rate)
    }

    /// Poll until this run ends
    pub fn run(&mut self) {
        while self.is_active() {
            if self.poll() == 0 {
                idle();
            }
        }
        trace!("Receiver stopped");
    }

    /// Like [`run`](Self::run), also reporting the receive rate from `now_ms`
    pub fn run_with_clock(&mut self, mut now_ms: impl FnMut() -> u32) {
        while self.is_active() {
            let consumed = self.poll();
            self.tick(now_ms());
            if consumed == 0 {
                idle();
            }
        }
        trace!("Receiver stopped");
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn into_transport(self) -> T {
        self.transport
    }
}

#[cfg(feature = "std")]
fn idle() {
    std::thread::yield_now();
}

#[cfg(not(feature = "std"))]
fn idle() {
    core::hint::spin_loop();
}

#[cfg(test)]
mod tests {
    use super::super::mock::{framed_packet, MockSource};
    use super::*;

    fn receiver<'a, const C: usize>(link: &'a Link<C>, bytes: &[u8]) -> Receiver<'a, MockSource, C> {
        let epoch = link.start();
        Receiver::new(link, epoch, MockSource::new(bytes), 5)
    }

    /// Source that ends the run after handing out `left` bytes
    struct HaltingSource<'a> {
        link: &'a Link<256>,
        left: usize,
    }

    impl ByteSource for HaltingSource<'_> {
        fn bytes_available(&self) -> usize {
            usize::MAX
        }

        fn read_byte(&mut self) -> Option<u8> {
            self.left -= 1;
            if self.left == 0 {
                self.link.stop();
            }
            Some(0x11)
        }
    }

    #[test]
    fn test_poll_queues_frame() {
        let link: Link<256> = Link::new();
        let bytes = framed_packet(0x41, 1, 0, &[1, 2, 3]);
        let mut receiver = receiver(&link, &bytes);

        assert_eq!(receiver.poll(), bytes.len());
        assert_eq!(link.stats().received(), 1);

        let mut out = [0u8; 64];
        assert_eq!(link.queue().read(&mut out), 13);
        assert_eq!(&out[10..13], &[1, 2, 3]);
    }

    #[test]
    fn test_poll_stops_when_not_running() {
        let link: Link<256> = Link::new();
        let mut receiver = Receiver::new(&link, link.epoch(), MockSource::new(&[1, 2, 0]), 5);

        assert!(!receiver.is_active());
        assert_eq!(receiver.poll(), 0);
        assert_eq!(receiver.transport().bytes_available(), 3);
    }

    #[test]
    fn test_halt_seen_between_bytes() {
        let link: Link<256> = Link::new();
        let epoch = link.start();
        let source = HaltingSource {
            link: &link,
            left: 4,
        };
        let mut receiver = Receiver::new(&link, epoch, source, 5);

        assert_eq!(receiver.poll(), 4);
        assert_eq!(receiver.poll(), 0);
    }

    #[test]
    fn test_stale_receiver_stays_halted_after_restart() {
        let link: Link<256> = Link::new();
        let bytes = framed_packet(0x41, 1, 0, &[1, 2, 3]);
        let mut old = receiver(&link, &bytes);

        link.stop();
        let mut current = receiver(&link, &[]);

        assert_eq!(old.poll(), 0);
        assert!(!old.is_active());
        assert!(current.is_active());
        assert_eq!(current.poll(), 0);
        assert_eq!(link.stats().received(), 0);
        assert!(link.queue().is_empty());
    }

    #[test]
    fn test_poll_counts_full_queue_as_dropped() {
        let link: Link<16> = Link::new();
        // 13 byte frame + 2 byte prefix fills 15 of 16 bytes
        let mut bytes = framed_packet(0x41, 1, 0, &[1, 2, 3]);
        bytes.extend(framed_packet(0x41, 1, 0, &[4, 5, 6]));
        let mut receiver = receiver(&link, &bytes);

        receiver.poll();

        assert_eq!(link.stats().received(), 1);
        assert_eq!(link.stats().dropped(), 1);
    }

    #[test]
    fn test_poll_counts_framing_errors() {
        let link: Link<256> = Link::new();
        // Code byte promises 4 bytes but only 1 follows
        let mut receiver = receiver(&link, &[0x05, 0x11, 0x00]);

        receiver.poll();

        assert_eq!(link.stats().framing_errors(), 1);
        assert_eq!(link.stats().received(), 0);
        assert!(link.queue().is_empty());
    }

    #[test]
    fn test_only_delimiters_yield_nothing() {
        let link: Link<256> = Link::new();
        let mut receiver = receiver(&link, &[0u8; 500]);

        assert_eq!(receiver.poll(), 500);
        assert_eq!(link.snapshot(), crate::stats::StatsSnapshot::default());
    }

    #[test]
    fn test_frame_split_across_polls() {
        let link: Link<256> = Link::new();
        let bytes = framed_packet(0x41, 1, 0, &[9, 9, 9]);
        let (head, tail) = bytes.split_at(5);
        let mut receiver = receiver(&link, head);

        receiver.poll();
        assert_eq!(link.stats().received(), 0);

        receiver.transport_mut().push(tail);
        receiver.poll();
        assert_eq!(link.stats().received(), 1);
    }

    #[test]
    fn test_tick_reports_rate_per_window() {
        let link: Link<256> = Link::new();
        let mut bytes = framed_packet(0x41, 1, 0, &[1, 1, 1]);
        bytes.extend(framed_packet(0x41, 1, 3, &[2, 2, 2]));
        let mut receiver = receiver(&link, &bytes);

        assert_eq!(receiver.tick(100), None);
        receiver.poll();
        assert_eq!(receiver.tick(600), None);
        assert_eq!(
            receiver.tick(1100),
            Some(ReceiveRate {
                frames: 2,
                elapsed_ms: 1000
            })
        );
        assert_eq!(
            receiver.tick(2150),
            Some(ReceiveRate {
                frames: 0,
                elapsed_ms: 1050
            })
        );
    }

    #[test]
    fn test_into_transport_returns_unread_bytes() {
        let link: Link<256> = Link::new();
        let receiver = Receiver::new(&link, link.epoch(), MockSource::new(&[7, 8]), 5);
        let source = receiver.into_transport();
        assert_eq!(source.bytes.len(), 2);
    }
}
