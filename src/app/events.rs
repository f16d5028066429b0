//! Outbound harness events.
//!
//! [`HarnessService`](super::service::HarnessService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters decide what to
//! do with them (serial log, test recorder, ...).

use crate::error::PwmTestError;

use super::commands::PwmCommand;
use super::controller::ChannelState;

/// Structured events emitted by the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PwmEvent {
    /// Startup finished; carries the provisioned channel state.
    Started(ChannelState),

    /// A command was applied and its value is now canonical.
    Committed(PwmCommand),

    /// A command failed and was rolled back.
    Rejected {
        command: PwmCommand,
        error: PwmTestError,
    },

    /// Shutdown parked the output and released the channel.
    ShutDown,
}
