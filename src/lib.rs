//! PWM test harness library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;

// The ESP-IDF-only pieces compile on the host against simulation stubs
// guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
