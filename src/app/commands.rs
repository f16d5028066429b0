//! Inbound commands to the controller.
//!
//! One variant per writable attribute.  The attribute surface parses raw
//! text into a [`PwmCommand`]; the
//! [`PwmTestController`](super::controller::PwmTestController) applies it.

/// A single requested change to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmCommand {
    /// Acquire (`true`) or release (`false`) the channel.
    Request(bool),

    /// Change the period, keeping the committed duty.
    SetPeriod(u64),

    /// Change the duty, keeping the committed period.
    SetDuty(u64),

    /// Enable or disable the output.
    SetRun(bool),

    /// Normal (`false`) or inversed (`true`) polarity.
    SetPolarity(bool),
}
