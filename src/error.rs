//! Unified error types for the PWM test harness.
//!
//! A single [`PwmTestError`] enum covers every way an attribute write can
//! fail, from malformed text through to provider-side rejections.  All
//! variants are `Copy` and carry the raw provider code where one exists, so
//! the attribute surface can hand a negative errno straight back to the
//! operator.

use core::fmt;

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Raw failure reported by a PWM provider.
///
/// `code` is a negative errno-style value (e.g. [`ProviderError::EINVAL`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderError {
    pub code: i32,
}

impl ProviderError {
    pub const EBUSY: i32 = -16;
    pub const ENODEV: i32 = -19;
    pub const EINVAL: i32 = -22;
    pub const ERANGE: i32 = -34;

    pub const fn new(code: i32) -> Self {
        Self { code }
    }

    pub const fn invalid() -> Self {
        Self::new(Self::EINVAL)
    }

    pub const fn busy() -> Self {
        Self::new(Self::EBUSY)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "provider error {}", self.code)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Malformed attribute text.  Never reaches the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing left to parse after the sign / radix prefix.
    Empty,
    /// A character is not a digit of the detected radix.
    InvalidDigit,
    /// The value does not fit in an unsigned 64-bit integer.
    Overflow,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty value"),
            Self::InvalidDigit => write!(f, "invalid digit"),
            Self::Overflow => write!(f, "value out of range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller errors
// ---------------------------------------------------------------------------

/// Every fallible controller or attribute operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmTestError {
    /// The written text was not a valid unsigned integer.
    Parse(ParseError),
    /// A configuration operation was attempted without the channel held.
    NotRequested,
    /// The provider could not hand out a channel.
    AcquisitionFailed(i32),
    /// The provider rejected a (duty, period) pair.
    ConfigurationRejected(i32),
    /// The provider refused to enable the output.
    EnableFailed(i32),
    /// The provider refused the polarity change.
    PolarityRejected(i32),
}

impl PwmTestError {
    /// Negative errno reported back through the attribute surface.
    pub const fn errno(self) -> i32 {
        match self {
            Self::Parse(ParseError::Overflow) => ProviderError::ERANGE,
            Self::Parse(_) => ProviderError::EINVAL,
            Self::NotRequested => ProviderError::ENODEV,
            Self::AcquisitionFailed(code)
            | Self::ConfigurationRejected(code)
            | Self::EnableFailed(code)
            | Self::PolarityRejected(code) => code,
        }
    }
}

impl fmt::Display for PwmTestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::NotRequested => write!(f, "PWM channel not requested"),
            Self::AcquisitionFailed(rc) => write!(f, "unable to request PWM (rc={rc})"),
            Self::ConfigurationRejected(rc) => write!(f, "configuration rejected (rc={rc})"),
            Self::EnableFailed(rc) => write!(f, "enable failed (rc={rc})"),
            Self::PolarityRejected(rc) => write!(f, "polarity rejected (rc={rc})"),
        }
    }
}

impl From<ParseError> for PwmTestError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl std::error::Error for ProviderError {}
impl std::error::Error for ParseError {}
impl std::error::Error for PwmTestError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Harness-wide `Result` alias.
pub type Result<T> = core::result::Result<T, PwmTestError>;
