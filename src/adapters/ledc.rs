//! LEDC adapter: implements [`PwmProvider`] over one ESP32 LEDC channel.
//!
//! Period and duty are expressed in nanoseconds.  The LEDC timer runs at
//! `1e9 / period` Hz with a fixed duty resolution, so a period is only
//! accepted when that frequency fits the 80 MHz source clock.
//!
//! The frequency is a whole number of Hz, so the timer may run slightly
//! slower than asked.  The handle, and therefore [`PwmProvider::period`],
//! reports the period the timer actually produces: a 3 000 000 ns request
//! runs at 333 Hz and reads back as 3 003 003 ns.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real timer and channel via hw_init.
//! On host/test: identical validation, state tracked in the handle only.

use log::{debug, info};

use crate::app::ports::PwmProvider;
use crate::config::{self, HarnessConfig};
use crate::drivers::hw_init;
use crate::error::ProviderError;

/// Proof of ownership of the LEDC channel plus its programmed state.
#[derive(Debug, PartialEq, Eq)]
pub struct LedcHandle {
    /// Period the timer produces, not the one requested.
    period_ns: u64,
    duty_ns: u64,
    freq_hz: u32,
    enabled: bool,
    inverted: bool,
}

impl LedcHandle {
    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    pub fn duty_ns(&self) -> u64 {
        self.duty_ns
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }
}

pub struct LedcPwmProvider {
    channel: u32,
    timer: u32,
    gpio: i32,
    resolution_bits: u32,
    default_period_ns: u64,
    claimed: bool,
}

impl LedcPwmProvider {
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            channel: config.ledc_channel,
            timer: config.ledc_timer,
            gpio: config.pwm_gpio,
            resolution_bits: config.duty_resolution_bits,
            default_period_ns: config.default_period_ns(),
            claimed: false,
        }
    }

    /// Whether a handle is currently out.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Timer frequency for `period_ns`, or `EINVAL` if LEDC cannot produce it.
    fn frequency_for(&self, period_ns: u64) -> Result<u32, ProviderError> {
        config::ledc_frequency_hz(period_ns, self.resolution_bits).ok_or(ProviderError::invalid())
    }

    /// Duty in timer ticks for the given (duty, period) pair.
    fn duty_ticks(&self, duty_ns: u64, period_ns: u64) -> u32 {
        if period_ns == 0 {
            return 0;
        }
        ((duty_ns << self.resolution_bits) / period_ns) as u32
    }
}

/// Period (ns) of a timer running at `freq_hz`.
fn period_of(freq_hz: u32) -> u64 {
    1_000_000_000 / u64::from(freq_hz.max(1))
}

impl PwmProvider for LedcPwmProvider {
    type Handle = LedcHandle;

    fn acquire(&mut self, owner: &str) -> Result<LedcHandle, ProviderError> {
        if self.claimed {
            return Err(ProviderError::busy());
        }
        let freq_hz = self.frequency_for(self.default_period_ns)?;
        hw_init::ledc_timer_init(self.timer, freq_hz, self.resolution_bits)
            .map_err(ProviderError::new)?;
        hw_init::ledc_channel_init(self.channel, self.timer, self.gpio, false)
            .map_err(ProviderError::new)?;

        self.claimed = true;
        info!(
            "ledc: ch{} claimed by {} ({} Hz, {}-bit)",
            self.channel, owner, freq_hz, self.resolution_bits
        );
        Ok(LedcHandle {
            period_ns: period_of(freq_hz),
            duty_ns: 0,
            freq_hz,
            enabled: false,
            inverted: false,
        })
    }

    fn release(&mut self, handle: LedcHandle) {
        if handle.enabled {
            hw_init::ledc_halt(self.channel, handle.inverted);
        }
        self.claimed = false;
        info!("ledc: ch{} released", self.channel);
    }

    fn configure(
        &mut self,
        handle: &mut LedcHandle,
        duty: u64,
        period: u64,
    ) -> Result<(), ProviderError> {
        if duty > period {
            return Err(ProviderError::invalid());
        }
        let freq_hz = self.frequency_for(period)?;
        let actual_period = period_of(freq_hz);
        let ticks = self.duty_ticks(duty, actual_period);

        let freq_changed = freq_hz != handle.freq_hz;
        if freq_changed {
            hw_init::ledc_set_frequency(self.timer, freq_hz).map_err(ProviderError::new)?;
        }
        if handle.enabled {
            if let Err(rc) = hw_init::ledc_write_duty(self.channel, ticks) {
                if freq_changed {
                    // Put the old frequency back so the failure leaves no trace.
                    let _ = hw_init::ledc_set_frequency(self.timer, handle.freq_hz);
                }
                return Err(ProviderError::new(rc));
            }
        }

        handle.duty_ns = duty;
        handle.period_ns = actual_period;
        handle.freq_hz = freq_hz;
        debug!("ledc: ch{} {} Hz, duty {} ticks", self.channel, freq_hz, ticks);
        Ok(())
    }

    fn enable(&mut self, handle: &mut LedcHandle) -> Result<(), ProviderError> {
        let ticks = self.duty_ticks(handle.duty_ns, handle.period_ns);
        hw_init::ledc_write_duty(self.channel, ticks).map_err(ProviderError::new)?;
        handle.enabled = true;
        Ok(())
    }

    fn disable(&mut self, handle: &mut LedcHandle) {
        hw_init::ledc_halt(self.channel, handle.inverted);
        handle.enabled = false;
    }

    fn set_polarity(&mut self, handle: &mut LedcHandle, inverted: bool) -> Result<(), ProviderError> {
        if handle.enabled {
            return Err(ProviderError::busy());
        }
        if handle.inverted == inverted {
            return Ok(());
        }
        hw_init::ledc_channel_init(self.channel, self.timer, self.gpio, inverted)
            .map_err(ProviderError::new)?;
        handle.inverted = inverted;
        Ok(())
    }

    fn period(&self, handle: &LedcHandle) -> u64 {
        handle.period_ns
    }
}
