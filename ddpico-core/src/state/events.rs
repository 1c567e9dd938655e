//! Events that trigger lifecycle transitions

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Queue and statistics reset, receive context launched
    Begin,
    /// Receive context asked to halt
    End,
}
