//! Port traits: the hexagonal boundary between the controller and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PwmTestController (domain)
//! ```
//!
//! Driven adapters (PWM provider, provisioning source, config store, event
//! sinks) implement these traits.  The controller and
//! [`HarnessService`](super::service::HarnessService) consume them via
//! generics, so the domain core never touches registers directly.

use crate::config::HarnessConfig;
use crate::error::ProviderError;

// ───────────────────────────────────────────────────────────────
// PWM provider (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Capability over one physical PWM channel.
///
/// The handle is handed out by value and returned on release, so the
/// owner holds it exclusively for as long as the channel is requested.
///
/// Every fallible call is atomic: on `Err` the device is unchanged.
pub trait PwmProvider {
    /// Proof of ownership of the channel.
    type Handle;

    /// Claim the channel on behalf of `owner`.
    fn acquire(&mut self, owner: &str) -> Result<Self::Handle, ProviderError>;

    /// Give the channel back.  Must succeed even while enabled.
    fn release(&mut self, handle: Self::Handle);

    /// Program duty and period together (same units).
    fn configure(
        &mut self,
        handle: &mut Self::Handle,
        duty: u64,
        period: u64,
    ) -> Result<(), ProviderError>;

    /// Start driving the output.
    fn enable(&mut self, handle: &mut Self::Handle) -> Result<(), ProviderError>;

    /// Stop driving the output.
    fn disable(&mut self, handle: &mut Self::Handle);

    /// Select normal (`false`) or inversed (`true`) polarity.
    fn set_polarity(&mut self, handle: &mut Self::Handle, inverted: bool)
    -> Result<(), ProviderError>;

    /// Period currently programmed on the device.
    fn period(&self, handle: &Self::Handle) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Provisioning source (driven adapter: startup values)
// ───────────────────────────────────────────────────────────────

/// Key/value store read once at startup (`enabled`, `duty`).
pub trait ProvisioningSource {
    fn read_u32(&self, key: &str) -> Result<u32, ProvisioningError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists harness configuration.
///
/// Implementations MUST call [`HarnessConfig::validate`] before persisting.
pub trait ConfigPort {
    /// Returns [`HarnessConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<HarnessConfig, ConfigError>;

    fn save(&self, config: &HarnessConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The service emits structured [`PwmEvent`](super::events::PwmEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::PwmEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ProvisioningSource`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningError {
    /// The key is not present.
    NotFound,
    /// The stored value has the wrong size or type.
    Corrupted,
    /// Generic I/O error from the backend.
    IoError,
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Corrupted => write!(f, "value corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ProvisioningError {}
impl std::error::Error for ConfigError {}
