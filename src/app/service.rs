//! Application service: the hexagonal core.
//!
//! [`HarnessService`] owns the [`PwmTestController`] and wires it to the
//! outside world: startup provisioning, the attribute surface, and the
//! shutdown sequence.  All I/O flows through port traits, so the whole
//! service runs on the host against mock adapters.
//!
//! ```text
//!  ProvisioningSource ──▶ ┌──────────────────────┐ ──▶ EventSink
//!                         │    HarnessService     │
//!  attribute read/write ─▶│  PwmTestController    │──▶ PwmProvider
//!                         └──────────────────────┘
//! ```

use core::fmt;

use log::{info, warn};

use crate::config::HarnessConfig;
use crate::error::PwmTestError;

use super::attributes::{self, Attribute};
use super::controller::{ChannelState, PwmTestController};
use super::events::PwmEvent;
use super::ports::{EventSink, ProvisioningError, ProvisioningSource, PwmProvider};

/// Provisioning key: non-zero enables the output at startup.
pub const KEY_ENABLED: &str = "enabled";
/// Provisioning key: duty applied at startup.
pub const KEY_DUTY: &str = "duty";

// ───────────────────────────────────────────────────────────────
// Startup errors
// ───────────────────────────────────────────────────────────────

/// Fatal failures while bringing the harness up.  Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    /// The channel could not be requested.
    Acquisition(PwmTestError),
    /// A provisioning key was missing or unreadable.
    Provisioning {
        key: &'static str,
        error: ProvisioningError,
    },
    /// Enabling the output failed.
    Run(PwmTestError),
    /// Applying the provisioned duty failed.
    Duty(PwmTestError),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquisition(e) => write!(f, "unable to request PWM: {e}"),
            Self::Provisioning { key, error } => {
                write!(f, "provisioning key '{key}': {error}")
            }
            Self::Run(e) => write!(f, "unable to enable PWM: {e}"),
            Self::Duty(e) => write!(f, "unable to set pwm duty: {e}"),
        }
    }
}

impl std::error::Error for StartupError {}

// ───────────────────────────────────────────────────────────────
// HarnessService
// ───────────────────────────────────────────────────────────────

/// The harness: one controller, one channel.
pub struct HarnessService<P: PwmProvider> {
    controller: PwmTestController<P>,
}

impl<P: PwmProvider> HarnessService<P> {
    // ── Lifecycle ─────────────────────────────────────────────

    /// Build the controller and, if `config.auto_request` is set, request
    /// the channel and apply the provisioned `enabled` / `duty` values.
    ///
    /// The period is read back from the device, never written.  Any
    /// failure aborts startup; dropping the half-built controller parks and
    /// releases the channel.
    pub fn start(
        provider: P,
        provisioning: &impl ProvisioningSource,
        config: &HarnessConfig,
        sink: &mut impl EventSink,
    ) -> Result<Self, StartupError> {
        let mut controller = PwmTestController::new(provider, config);

        if config.auto_request {
            controller.request(true).map_err(StartupError::Acquisition)?;
            let period = controller
                .read_back_period()
                .map_err(StartupError::Acquisition)?;

            let enabled = read_key(provisioning, KEY_ENABLED)?;
            if enabled != 0 {
                controller.set_run(true).map_err(StartupError::Run)?;
            }

            let duty = read_key(provisioning, KEY_DUTY)?;
            controller
                .set_duty(u64::from(duty))
                .map_err(StartupError::Duty)?;

            info!(
                "{}: provisioned (period={}, duty={}, enabled={})",
                config.device_name, period, duty, enabled
            );
        } else {
            info!("{}: auto-request disabled, channel left freed", config.device_name);
        }

        let service = Self { controller };
        sink.emit(&PwmEvent::Started(service.controller.state()));
        Ok(service)
    }

    /// Park the output, release the channel and report it.
    pub fn shutdown(mut self, sink: &mut impl EventSink) {
        self.controller.shutdown();
        sink.emit(&PwmEvent::ShutDown);
    }

    // ── Attribute surface ─────────────────────────────────────

    /// Render an attribute for reading.
    pub fn read_attribute(&self, attr: Attribute) -> String {
        attributes::show(attr, &self.controller.state())
    }

    /// Parse and apply an attribute write.
    ///
    /// Returns the number of bytes consumed (the whole input) on success.
    pub fn write_attribute(
        &mut self,
        attr: Attribute,
        raw: &str,
        sink: &mut impl EventSink,
    ) -> Result<usize, PwmTestError> {
        let command = attributes::parse_command(attr, raw).map_err(|e| {
            warn!("{}: rejected input {:?} ({})", attr.name(), raw, e);
            PwmTestError::from(e)
        })?;

        match self.controller.handle_command(command) {
            Ok(()) => {
                sink.emit(&PwmEvent::Committed(command));
                Ok(raw.len())
            }
            Err(error) => {
                sink.emit(&PwmEvent::Rejected { command, error });
                Err(error)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ChannelState {
        self.controller.state()
    }

    pub fn controller(&self) -> &PwmTestController<P> {
        &self.controller
    }
}

fn read_key(source: &impl ProvisioningSource, key: &'static str) -> Result<u32, StartupError> {
    source
        .read_u32(key)
        .map_err(|error| StartupError::Provisioning { key, error })
}
