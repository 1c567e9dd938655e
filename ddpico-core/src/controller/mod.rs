//! Packet pipeline controller
//!
//! Two execution contexts share one [`Link`]:
//! - the receive context ([`Receiver`]) decodes serial bytes into frames and
//!   queues them
//! - the apply context calls [`Controller::update`] once per tick, parses one
//!   frame, and writes it to the matching output
//!
//! The controller never blocks. An empty queue makes `update` return at once.

mod link;
mod output;
mod receiver;

#[cfg(test)]
mod mock;

pub use link::Link;
pub use output::{Applied, Output};
pub use receiver::{ReceiveRate, Receiver};

use ddpico_protocol::{PacketHeader, HEADER_SIZE, MAX_FRAME_SIZE};
use heapless::Vec;

use crate::config::{ConfigError, ControllerConfig, OutputConfig, MAX_OUTPUTS};
use crate::queue::QUEUE_CAPACITY;
use crate::state::{ControllerState, Event};
use crate::stats::StatsSnapshot;
use crate::traits::{ByteSource, LedDriver};

/// Lifecycle errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerError {
    /// `begin` called while already running
    AlreadyRunning,
    /// The receive thread could not be spawned
    #[cfg(feature = "std")]
    SpawnFailed,
}

/// Result of one [`Controller::update`] tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Update {
    /// Not running, or nothing queued
    Idle,
    /// A frame was dequeued and discarded
    Dropped,
    /// A packet was applied to output `index`
    Applied { index: usize, applied: Applied },
}

/// Apply-side controller
pub struct Controller<'a, D: LedDriver, const C: usize = QUEUE_CAPACITY> {
    link: &'a Link<C>,
    config: ControllerConfig,
    state: ControllerState,
    outputs: Vec<Output<D>, MAX_OUTPUTS>,
    /// Dequeued frame, parsed and limited in place
    frame: [u8; MAX_FRAME_SIZE],
    parse_failures: u32,
    last_report_ms: Option<u32>,
    #[cfg(feature = "std")]
    worker: Option<std::thread::JoinHandle<()>>,
}

impl<'a, D: LedDriver, const C: usize> Controller<'a, D, C> {
    /// Create a controller with no outputs
    pub fn new(link: &'a Link<C>, config: ControllerConfig) -> Self {
        Self {
            link,
            config,
            state: ControllerState::Idle,
            outputs: Vec::new(),
            frame: [0; MAX_FRAME_SIZE],
            parse_failures: 0,
            last_report_ms: None,
            #[cfg(feature = "std")]
            worker: None,
        }
    }

    /// Register a strip; returns its output index
    pub fn add_output(&mut self, driver: D, config: OutputConfig) -> Result<usize, ConfigError> {
        config.limiter.validate()?;
        if driver.led_count() == 0 {
            return Err(ConfigError::ZeroLengthStrip);
        }
        if self.outputs.iter().any(|o| o.dest_id() == config.dest_id) {
            return Err(ConfigError::DuplicateDestination(config.dest_id));
        }

        let leds = driver.led_count();
        self.outputs
            .push(Output::new(driver, config))
            .map_err(|_| ConfigError::TooManyOutputs)?;

        info!("Output {} added: {} LEDs", config.dest_id, leds);
        Ok(self.outputs.len() - 1)
    }

    /// Reset the link and start a receive context over `transport`
    ///
    /// The returned [`Receiver`] must be polled (or run) by the caller.
    pub fn begin<T: ByteSource>(
        &mut self,
        transport: T,
    ) -> Result<Receiver<'a, T, C>, ControllerError> {
        if !self.state.can_begin() {
            return Err(ControllerError::AlreadyRunning);
        }

        self.link.reset();
        self.parse_failures = 0;
        self.last_report_ms = None;
        let epoch = self.link.start();
        self.transition(Event::Begin);

        Ok(Receiver::new(
            self.link,
            epoch,
            transport,
            self.config.log_first_failures,
        ))
    }

    /// Halt the receive context
    ///
    /// Receivers from this run stay halted even after a later `begin`.
    /// Frames still queued stay there until the next `begin` clears them.
    pub fn end(&mut self) {
        if !self.state.is_running() {
            return;
        }

        self.link.stop();
        self.transition(Event::End);

        #[cfg(feature = "std")]
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Receive thread panicked");
            }
        }
    }

    /// Apply at most one queued packet
    ///
    /// Also emits a statistics report every `stats_interval_ms`.
    pub fn update(&mut self, now_ms: u32) -> Update {
        if !self.state.is_running() {
            return Update::Idle;
        }
        self.report_stats(now_ms);

        let len = self.link.queue().read(&mut self.frame);
        if len == 0 {
            return Update::Idle;
        }

        let stats = self.link.stats();
        let header = match PacketHeader::parse(&self.frame[..len]) {
            Ok(header) => header,
            Err(e) => {
                stats.record_dropped();
                self.parse_failures = self.parse_failures.saturating_add(1);
                if self.parse_failures <= self.config.log_first_failures {
                    warn!(
                        "Packet rejected: {:?} (len {}, header {:x})",
                        e,
                        len,
                        &self.frame[..len.min(HEADER_SIZE)]
                    );
                }
                return Update::Dropped;
            }
        };

        let Some(index) = self
            .outputs
            .iter()
            .position(|o| o.dest_id() == header.dest_id)
        else {
            stats.record_dropped();
            debug!("No output for destination {}", header.dest_id);
            return Update::Dropped;
        };
        stats.record_processed();

        let payload = &mut self.frame[header.payload_range()];
        let applied = self.outputs[index].apply(&header, payload);
        trace!(
            "Applied {} pixels at {} to output {}",
            applied.pixels,
            applied.start,
            index
        );

        Update::Applied { index, applied }
    }

    /// Turn every output off
    pub fn blank(&mut self) {
        for output in self.outputs.iter_mut() {
            output.blank();
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn link(&self) -> &'a Link<C> {
        self.link
    }

    /// Current counters and queue usage
    pub fn stats(&self) -> StatsSnapshot {
        self.link.snapshot()
    }

    pub fn outputs(&self) -> &[Output<D>] {
        &self.outputs
    }

    pub fn output(&self, index: usize) -> Option<&Output<D>> {
        self.outputs.get(index)
    }

    pub fn output_mut(&mut self, index: usize) -> Option<&mut Output<D>> {
        self.outputs.get_mut(index)
    }

    fn transition(&mut self, event: Event) {
        let next = self.state.transition(event);
        if next != self.state {
            info!("Controller {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn report_stats(&mut self, now_ms: u32) {
        let last = *self.last_report_ms.get_or_insert(now_ms);
        if now_ms.wrapping_sub(last) < self.config.stats_interval_ms {
            return;
        }
        self.last_report_ms = Some(now_ms);

        let s = self.stats();
        info!(
            "Stats: rx={} processed={} dropped={} framing={} queue={}%",
            s.received,
            s.processed,
            s.dropped,
            s.framing_errors,
            s.queue_usage_percent
        );
    }
}

#[cfg(feature = "std")]
impl<D: LedDriver, const C: usize> Controller<'static, D, C> {
    /// Like [`begin`](Self::begin), but runs the receive context on its own
    /// thread. [`end`](Self::end) joins it.
    pub fn begin_threaded<T>(&mut self, transport: T) -> Result<(), ControllerError>
    where
        T: ByteSource + Send + 'static,
    {
        let mut receiver = self.begin(transport)?;
        let spawned = std::thread::Builder::new()
            .name("ddpico-rx".into())
            .spawn(move || {
                let started = std::time::Instant::now();
                receiver.run_with_clock(|| started.elapsed().as_millis() as u32);
            });

        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(_) => {
                error!("Failed to spawn receive thread");
                self.end();
                Err(ControllerError::SpawnFailed)
            }
        }
    }
}

impl<D: LedDriver, const C: usize> Drop for Controller<'_, D, C> {
    fn drop(&mut self) {
        self.end();
    }
}
