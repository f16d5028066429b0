//! Application core: pure domain logic, zero I/O.
//!
//! Holds the PWM channel state machine and the attribute surface built on
//! top of it.  All interaction with hardware happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable without
//! a real PWM peripheral.

pub mod attributes;
pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
pub mod service;
