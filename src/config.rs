//! Harness configuration parameters
//!
//! Everything that selects *which* PWM output the harness drives and how it
//! is torn down.  Values can be overridden via NVS.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::pins;

/// Default owner label handed to the provider on acquisition.
pub const DEFAULT_DEVICE_NAME: &str = "pwm_test";

/// Period written during the shutdown safe-stop (ns, 1 kHz).
pub const SAFE_STOP_PERIOD: u64 = 1_000_000;

/// LEDC timer frequency for `period_ns` at `resolution_bits`, or `None` if
/// the timer cannot produce it (below 1 Hz or above the source clock).
///
/// The frequency is rounded down to a whole Hz.
pub fn ledc_frequency_hz(period_ns: u64, resolution_bits: u32) -> Option<u32> {
    if period_ns == 0 || resolution_bits >= 32 {
        return None;
    }
    let freq_hz = 1_000_000_000 / period_ns;
    if freq_hz == 0 || (freq_hz << resolution_bits) > pins::LEDC_SOURCE_CLOCK_HZ {
        return None;
    }
    Some(freq_hz as u32)
}

/// Core harness configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Owner identity passed to the provider when the channel is requested.
    pub device_name: String<32>,
    /// Request the channel and apply the provisioning values at startup.
    pub auto_request: bool,
    /// Period used when parking the output at shutdown.
    pub safe_stop_period: u64,

    // --- LEDC output ---
    /// GPIO carrying the PWM output.
    pub pwm_gpio: i32,
    /// LEDC channel number (0-7).
    pub ledc_channel: u32,
    /// LEDC timer number (0-3).
    pub ledc_timer: u32,
    /// Duty resolution in bits.
    pub duty_resolution_bits: u32,
    /// Frequency the channel comes up at after acquisition.
    pub default_frequency_hz: u32,
}

impl HarnessConfig {
    /// Range-check every field.  Called before persisting.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.device_name.is_empty() {
            return Err("device_name must not be empty");
        }
        if self.safe_stop_period == 0 {
            return Err("safe_stop_period must be non-zero");
        }
        if !(0..=48).contains(&self.pwm_gpio) {
            return Err("pwm_gpio must be 0–48");
        }
        if self.ledc_channel > 7 {
            return Err("ledc_channel must be 0–7");
        }
        if self.ledc_timer > 3 {
            return Err("ledc_timer must be 0–3");
        }
        if !(1..=14).contains(&self.duty_resolution_bits) {
            return Err("duty_resolution_bits must be 1–14");
        }
        if self.default_frequency_hz == 0 {
            return Err("default_frequency_hz must be non-zero");
        }
        if ledc_frequency_hz(self.default_period_ns(), self.duty_resolution_bits).is_none() {
            return Err("default_frequency_hz not reachable at this duty resolution");
        }
        if ledc_frequency_hz(self.safe_stop_period, self.duty_resolution_bits).is_none() {
            return Err("safe_stop_period not reachable at this duty resolution");
        }
        Ok(())
    }

    /// Period (ns) the channel reports right after acquisition.
    pub fn default_period_ns(&self) -> u64 {
        1_000_000_000 / u64::from(self.default_frequency_hz.max(1))
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let mut device_name = String::new();
        // Fits: the literal is well under the 32-byte capacity.
        let _ = device_name.push_str(DEFAULT_DEVICE_NAME);

        Self {
            device_name,
            auto_request: true,
            safe_stop_period: SAFE_STOP_PERIOD,

            pwm_gpio: pins::PWM_OUT_GPIO,
            ledc_channel: pins::PWM_LEDC_CHANNEL,
            ledc_timer: pins::PWM_LEDC_TIMER,
            duty_resolution_bits: pins::PWM_DUTY_RESOLUTION_BITS,
            default_frequency_hz: pins::PWM_DEFAULT_FREQ_HZ,
        }
    }
}
