//! Low-level peripheral access for the PWM output.
//!
//! Pin selection plus thin wrappers over the ESP-IDF LEDC calls the
//! [`LedcPwmProvider`](crate::adapters::ledc::LedcPwmProvider) needs.
//! Every function returns the raw `esp_err_t` on failure.  On non-espidf
//! targets each one is a simulation stub that always succeeds.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot pin setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    InvalidPin(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidPin(pin)      => write!(f, "GPIO {} cannot carry PWM", pin),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Highest GPIO number on the ESP32-S3.
const MAX_GPIO: i32 = 48;

// ── Pin selection ─────────────────────────────────────────────

/// Reset `gpio` and make it an output so LEDC can be routed to it.
#[cfg(target_os = "espidf")]
pub fn select_pwm_pin(gpio: i32) -> Result<(), HwInitError> {
    if !(0..=MAX_GPIO).contains(&gpio) {
        return Err(HwInitError::InvalidPin(gpio));
    }
    // SAFETY: Called once from main() before the console loop starts.
    let ret = unsafe { gpio_reset_pin(gpio) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    let ret = unsafe { gpio_set_direction(gpio, gpio_mode_t_GPIO_MODE_OUTPUT) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    info!("hw_init: GPIO {} selected for PWM", gpio);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn select_pwm_pin(gpio: i32) -> Result<(), HwInitError> {
    if !(0..=MAX_GPIO).contains(&gpio) {
        return Err(HwInitError::InvalidPin(gpio));
    }
    log::info!("hw_init(sim): GPIO {} selected for PWM", gpio);
    Ok(())
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn ledc_timer_init(timer: u32, freq_hz: u32, resolution_bits: u32) -> Result<(), i32> {
    let cfg = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: timer,
        duty_resolution: resolution_bits,
        freq_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: LEDC is only touched from the single console task.
    let ret = unsafe { ledc_timer_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(ret); }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_timer_init(_timer: u32, _freq_hz: u32, _resolution_bits: u32) -> Result<(), i32> {
    Ok(())
}

/// (Re)configure `channel` on `timer`, routed to `gpio`, at zero duty.
#[cfg(target_os = "espidf")]
pub fn ledc_channel_init(channel: u32, timer: u32, gpio: i32, inverted: bool) -> Result<(), i32> {
    let mut cfg = ledc_channel_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        channel,
        timer_sel: timer,
        gpio_num: gpio,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    cfg.flags.set_output_invert(u32::from(inverted));
    // SAFETY: see ledc_timer_init.
    let ret = unsafe { ledc_channel_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(ret); }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_channel_init(_channel: u32, _timer: u32, _gpio: i32, _inverted: bool) -> Result<(), i32> {
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set_frequency(timer: u32, freq_hz: u32) -> Result<(), i32> {
    // SAFETY: see ledc_timer_init.
    let ret = unsafe { ledc_set_freq(ledc_mode_t_LEDC_LOW_SPEED_MODE, timer, freq_hz) };
    if ret != ESP_OK as i32 { return Err(ret); }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set_frequency(_timer: u32, _freq_hz: u32) -> Result<(), i32> {
    Ok(())
}

/// Latch a new duty (in timer ticks) and start driving it.
#[cfg(target_os = "espidf")]
pub fn ledc_write_duty(channel: u32, ticks: u32) -> Result<(), i32> {
    // SAFETY: see ledc_timer_init.
    unsafe {
        let ret = ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, ticks);
        if ret != ESP_OK as i32 { return Err(ret); }
        let ret = ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
        if ret != ESP_OK as i32 { return Err(ret); }
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_write_duty(_channel: u32, _ticks: u32) -> Result<(), i32> {
    Ok(())
}

/// Stop the output and hold it at `idle_high`.
#[cfg(target_os = "espidf")]
pub fn ledc_halt(channel: u32, idle_high: bool) {
    // SAFETY: see ledc_timer_init.
    let ret = unsafe { ledc_stop(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(idle_high)) };
    if ret != ESP_OK as i32 {
        log::error!("hw_init: ledc_stop(ch{}) failed (rc={})", channel, ret);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_halt(_channel: u32, _idle_high: bool) {}
