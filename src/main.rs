//! PWM test harness: Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  LedcPwmProvider   NvsAdapter          LogEventSink      │
//! │  (PwmProvider)     (Provisioning+Cfg)  (EventSink)       │
//! │  console (UART line protocol)                            │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ───────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │   HarnessService → PwmTestController           │      │
//! │  └────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use log::{info, warn};

use pwmtest::adapters::console::{self, ConsoleRequest};
use pwmtest::adapters::ledc::LedcPwmProvider;
use pwmtest::adapters::log_sink::LogEventSink;
use pwmtest::adapters::nvs::NvsAdapter;
use pwmtest::app::ports::ConfigPort;
use pwmtest::app::service::HarnessService;
use pwmtest::config::HarnessConfig;
use pwmtest::drivers::hw_init;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("PWM test harness v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no provisioning", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            HarnessConfig::default()
        }
    };

    // ── 3. Pin setup (best effort) ────────────────────────────
    if let Err(e) = hw_init::select_pwm_pin(config.pwm_gpio) {
        warn!("unable to select pin group. PWM not muxed right ({})", e);
    }

    // ── 4. Acquire + provision ────────────────────────────────
    let mut log_sink = LogEventSink::new();
    let mut service = HarnessService::start(
        LedcPwmProvider::new(&config),
        &nvs,
        &config,
        &mut log_sink,
    )
    .context("PWM harness initialisation failed")?;

    info!("Ready. Type 'help' for commands.");

    // ── 5. Console loop ───────────────────────────────────────
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("console read failed")?;
        let request = match console::parse_line(&line) {
            Ok(request) => request,
            Err(console::ConsoleError::Empty) => continue,
            Err(e) => {
                writeln!(stdout, "error: {}", e)?;
                continue;
            }
        };

        let reply = console::execute(&mut service, request, &mut log_sink);
        stdout.write_all(reply.as_bytes())?;
        stdout.flush()?;

        if request == ConsoleRequest::Quit {
            break;
        }
    }

    // ── 6. Safe stop + release ────────────────────────────────
    service.shutdown(&mut log_sink);
    Ok(())
}
