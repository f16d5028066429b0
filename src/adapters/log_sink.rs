//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured harness events to the
//! ESP-IDF logger (UART / USB-CDC in production).

use log::{error, info, warn};

use crate::app::events::PwmEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`PwmEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &PwmEvent) {
        match event {
            PwmEvent::Started(s) => {
                info!(
                    "START | requested={} | period={} duty={} | run={} | polarity={}",
                    s.requested,
                    s.period,
                    s.duty,
                    if s.run { "Enabled" } else { "Disabled" },
                    if s.polarity { "inversed" } else { "normal" },
                );
            }
            PwmEvent::Committed(cmd) => {
                info!("COMMIT | {:?}", cmd);
            }
            PwmEvent::Rejected { command, error: e } => {
                error!("REJECT | {:?} | {} (errno {})", command, e, e.errno());
            }
            PwmEvent::ShutDown => {
                warn!("STOP | output parked and channel freed");
            }
        }
    }
}
