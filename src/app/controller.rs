//! PWM test controller: the staged-commit state machine.
//!
//! [`PwmTestController`] owns at most one provider handle and the canonical
//! (last successfully applied) period, duty, run and polarity values.
//! Every write is staged in a local, pushed to the provider, and committed
//! only if the provider accepts it; otherwise the canonical value is left
//! exactly as it was.
//!
//! ```text
//!              request(true)
//!  Unrequested ─────────────▶ Requested ──┐ set_period / set_duty
//!       ▲                         │  ▲     │ set_run / set_polarity
//!       └──── request(false) ─────┘  └─────┘
//! ```
//!
//! `run` is a field rather than a state: period, duty and polarity may be
//! changed while the output is running, and the provider alone decides
//! whether that is legal.
//!
//! ## Period / duty coupling
//!
//! The provider is always handed both values.  A period change carries the
//! committed duty and a duty change carries the committed period, so only
//! one logical field moves per call and `duty <= period` holds for every
//! committed pair.

use heapless::String;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::HarnessConfig;
use crate::error::{PwmTestError, Result};

use super::commands::PwmCommand;
use super::ports::PwmProvider;

// ───────────────────────────────────────────────────────────────
// Queryable state
// ───────────────────────────────────────────────────────────────

/// Readable fields of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Period,
    Duty,
    Run,
    Polarity,
    Requested,
}

/// Value of a [`Field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    /// Period or duty in device units.
    Units(u64),
    /// Run, polarity or requested flag.
    Flag(bool),
}

/// Point-in-time copy of the canonical channel state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelState {
    pub requested: bool,
    pub period: u64,
    pub duty: u64,
    pub run: bool,
    pub polarity: bool,
}

// ───────────────────────────────────────────────────────────────
// PwmTestController
// ───────────────────────────────────────────────────────────────

/// Controller for a single PWM channel.
pub struct PwmTestController<P: PwmProvider> {
    provider: P,
    /// Owner identity handed to [`PwmProvider::acquire`].
    owner: String<32>,
    /// Period programmed while parking the output at shutdown.
    safe_stop_period: u64,
    /// `Some` exactly while the channel is requested.
    resource: Option<P::Handle>,
    period: u64,
    duty: u64,
    run: bool,
    polarity: bool,
}

impl<P: PwmProvider> PwmTestController<P> {
    /// Construct an unrequested controller with all fields zeroed.
    pub fn new(provider: P, config: &HarnessConfig) -> Self {
        Self {
            provider,
            owner: config.device_name.clone(),
            safe_stop_period: config.safe_stop_period,
            resource: None,
            period: 0,
            duty: 0,
            run: false,
            polarity: false,
        }
    }

    // ── Request / release ─────────────────────────────────────

    /// Acquire (`true`) or release (`false`) the channel.
    ///
    /// Both directions are idempotent.  Acquisition does not configure the
    /// channel; release clears every field, even if the output was running.
    pub fn request(&mut self, want: bool) -> Result<()> {
        if want {
            if self.resource.is_some() {
                debug!("{}: already requested", self.owner);
                return Ok(());
            }
            match self.provider.acquire(&self.owner) {
                Ok(handle) => {
                    self.resource = Some(handle);
                    info!("{}: got PWM", self.owner);
                    Ok(())
                }
                Err(e) => {
                    error!("{}: unable to request PWM (rc={})", self.owner, e.code);
                    Err(PwmTestError::AcquisitionFailed(e.code))
                }
            }
        } else {
            if let Some(handle) = self.resource.take() {
                self.provider.release(handle);
                info!("{}: PWM freed", self.owner);
            }
            self.clear();
            Ok(())
        }
    }

    // ── Configuration ─────────────────────────────────────────

    /// Stage `new_period` against the committed duty.
    pub fn set_period(&mut self, new_period: u64) -> Result<()> {
        let handle = self.resource.as_mut().ok_or(PwmTestError::NotRequested)?;
        let staged = new_period;

        if let Err(e) = self.provider.configure(handle, self.duty, staged) {
            error!(
                "Unable to set pwm period. Err {}, (duty, period) = ({}, {})",
                e.code, self.duty, staged
            );
            return Err(PwmTestError::ConfigurationRejected(e.code));
        }

        self.period = staged;
        info!("period = {}", self.period);
        Ok(())
    }

    /// Stage `new_duty` against the committed period.
    pub fn set_duty(&mut self, new_duty: u64) -> Result<()> {
        let handle = self.resource.as_mut().ok_or(PwmTestError::NotRequested)?;
        let staged = new_duty;

        if let Err(e) = self.provider.configure(handle, staged, self.period) {
            error!(
                "Unable to set pwm duty. Err {}, (duty, period) = ({}, {})",
                e.code, staged, self.period
            );
            return Err(PwmTestError::ConfigurationRejected(e.code));
        }

        self.duty = staged;
        info!("duty = {}", self.duty);
        Ok(())
    }

    /// Enable or disable the output.  Disabling cannot fail.
    pub fn set_run(&mut self, want_run: bool) -> Result<()> {
        let handle = self.resource.as_mut().ok_or(PwmTestError::NotRequested)?;

        if want_run {
            if let Err(e) = self.provider.enable(handle) {
                error!("Unable to enable pwm. Err {}", e.code);
                return Err(PwmTestError::EnableFailed(e.code));
            }
        } else {
            self.provider.disable(handle);
        }

        self.run = want_run;
        info!("run = {}", if self.run { "Enabled" } else { "Disabled" });
        Ok(())
    }

    /// Select normal (`false`) or inversed (`true`) polarity.
    pub fn set_polarity(&mut self, want_inverted: bool) -> Result<()> {
        let handle = self.resource.as_mut().ok_or(PwmTestError::NotRequested)?;

        if let Err(e) = self.provider.set_polarity(handle, want_inverted) {
            error!("Unable to set pwm polarity. Err {}", e.code);
            return Err(PwmTestError::PolarityRejected(e.code));
        }

        self.polarity = want_inverted;
        info!("polarity = {}", if self.polarity { "inversed" } else { "normal" });
        Ok(())
    }

    /// Dispatch a parsed attribute write to the matching operation.
    pub fn handle_command(&mut self, cmd: PwmCommand) -> Result<()> {
        match cmd {
            PwmCommand::Request(want) => self.request(want),
            PwmCommand::SetPeriod(period) => self.set_period(period),
            PwmCommand::SetDuty(duty) => self.set_duty(duty),
            PwmCommand::SetRun(run) => self.set_run(run),
            PwmCommand::SetPolarity(inverted) => self.set_polarity(inverted),
        }
    }

    /// Adopt the period the provider currently has programmed as canonical.
    ///
    /// Used at startup: the period is read back, never written.
    pub fn read_back_period(&mut self) -> Result<u64> {
        let handle = self.resource.as_ref().ok_or(PwmTestError::NotRequested)?;
        self.period = self.provider.period(handle);
        debug!("period read back from device: {}", self.period);
        Ok(self.period)
    }

    // ── Shutdown ──────────────────────────────────────────────

    /// Park the output and release the channel.
    ///
    /// Programs `(duty = 0, period = safe_stop_period)`, disables, then
    /// releases.  Best effort: a configure failure is logged and the
    /// sequence continues.  No-op when unrequested.
    pub fn shutdown(&mut self) {
        let Some(mut handle) = self.resource.take() else {
            return;
        };

        if let Err(e) = self.provider.configure(&mut handle, 0, self.safe_stop_period) {
            warn!("{}: safe-stop configure failed (rc={})", self.owner, e.code);
        }
        self.provider.disable(&mut handle);
        warn!("PWM device disabled {}", self.owner);

        self.provider.release(handle);
        info!("PWM device freed {}", self.owner);
        self.clear();
    }

    // ── Queries ───────────────────────────────────────────────

    /// Read one canonical field.  Never touches the provider.
    pub fn query(&self, field: Field) -> FieldValue {
        match field {
            Field::Period => FieldValue::Units(self.period),
            Field::Duty => FieldValue::Units(self.duty),
            Field::Run => FieldValue::Flag(self.run),
            Field::Polarity => FieldValue::Flag(self.polarity),
            Field::Requested => FieldValue::Flag(self.is_requested()),
        }
    }

    /// Snapshot of every canonical field.
    pub fn state(&self) -> ChannelState {
        ChannelState {
            requested: self.is_requested(),
            period: self.period,
            duty: self.duty,
            run: self.run,
            polarity: self.polarity,
        }
    }

    pub fn is_requested(&self) -> bool {
        self.resource.is_some()
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn duty(&self) -> u64 {
        self.duty
    }

    pub fn is_running(&self) -> bool {
        self.run
    }

    pub fn is_inverted(&self) -> bool {
        self.polarity
    }

    /// The provider, for diagnostics.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The held handle, if requested.
    pub fn handle(&self) -> Option<&P::Handle> {
        self.resource.as_ref()
    }

    // ── Internal ──────────────────────────────────────────────

    /// A released channel carries no residual configuration.
    fn clear(&mut self) {
        self.period = 0;
        self.duty = 0;
        self.run = false;
        self.polarity = false;
    }
}

impl<P: PwmProvider> Drop for PwmTestController<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
