//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to                 |
//! |------------|---------------------|-----------------------------|
//! | `ledc`     | PwmProvider         | ESP32 LEDC timer + channel  |
//! | `nvs`      | ProvisioningSource  | NVS / in-memory store       |
//! |            | ConfigPort          |                             |
//! | `log_sink` | EventSink           | Serial log output           |
//! | `console`  | (driving adapter)   | UART line console           |

pub mod console;
pub mod ledc;
pub mod log_sink;
pub mod nvs;
