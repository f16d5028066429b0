//! GPIO / peripheral assignments for the PWM test harness.
//!
//! Single source of truth for the defaults baked into
//! [`HarnessConfig`](crate::config::HarnessConfig).  NVS may override them.

// ---------------------------------------------------------------------------
// PWM output under test
// ---------------------------------------------------------------------------

/// GPIO the LEDC output is routed to.
pub const PWM_OUT_GPIO: i32 = 1;
/// LEDC channel driving the output.
pub const PWM_LEDC_CHANNEL: u32 = 0;
/// LEDC timer clocking the channel.
pub const PWM_LEDC_TIMER: u32 = 0;
/// Duty resolution in bits.
pub const PWM_DUTY_RESOLUTION_BITS: u32 = 10;
/// Frequency the channel comes up at after acquisition (1 ms period).
pub const PWM_DEFAULT_FREQ_HZ: u32 = 1_000;

// ---------------------------------------------------------------------------
// Clocking
// ---------------------------------------------------------------------------

/// APB clock feeding the LEDC timers.
pub const LEDC_SOURCE_CLOCK_HZ: u64 = 80_000_000;
