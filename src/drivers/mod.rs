//! Hardware initialisation and low-level peripheral helpers.

pub mod hw_init;
