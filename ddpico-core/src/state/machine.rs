//! State machine definition

use super::events::Event;

/// Controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerState {
    /// Constructed, never started
    #[default]
    Idle,
    /// Receive context active, `update` applies packets
    Running,
    /// Halted by `end`; `begin` may start it again
    Stopped,
}

impl ControllerState {
    /// Check if packets are being received and applied
    pub fn is_running(&self) -> bool {
        matches!(self, ControllerState::Running)
    }

    /// Check if `begin` is allowed from this state
    pub fn can_begin(&self) -> bool {
        matches!(self, ControllerState::Idle | ControllerState::Stopped)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: Event) -> Self {
        use ControllerState::*;
        use Event::*;

        match (self, event) {
            (Idle, Begin) => Running,
            (Stopped, Begin) => Running,
            (Running, End) => Stopped,

            // Default: stay in current state
            _ => self,
        }
    }
}
