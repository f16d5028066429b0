//! Attribute surface: the five text fields an operator reads and writes.
//!
//! | Attribute  | Read                                      | Write           |
//! |------------|-------------------------------------------|-----------------|
//! | `duty`     | decimal                                   | unsigned long   |
//! | `period`   | decimal                                   | unsigned long   |
//! | `run`      | `Enabled` / `Disabled`                    | 0 / non-zero    |
//! | `polarity` | `Polarity Inversed` / `Polarity Normal`   | 0 / non-zero    |
//! | `request`  | `Requested` / `Freed`                     | 0 / non-zero    |
//!
//! Writes are parsed with `kstrtoul` base-0 rules before anything reaches
//! the controller, so malformed text never stages a value.

use crate::error::ParseError;

use super::commands::PwmCommand;
use super::controller::{ChannelState, Field};

/// One of the five exposed attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Duty,
    Period,
    Run,
    Request,
    Polarity,
}

impl Attribute {
    /// Every attribute, in listing order.
    pub const ALL: [Self; 5] = [
        Self::Duty,
        Self::Period,
        Self::Run,
        Self::Request,
        Self::Polarity,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Duty => "duty",
            Self::Period => "period",
            Self::Run => "run",
            Self::Request => "request",
            Self::Polarity => "polarity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Controller field backing this attribute.
    pub const fn field(self) -> Field {
        match self {
            Self::Duty => Field::Duty,
            Self::Period => Field::Period,
            Self::Run => Field::Run,
            Self::Request => Field::Requested,
            Self::Polarity => Field::Polarity,
        }
    }

    /// Map a parsed value to the command this attribute issues.
    pub const fn command(self, value: u64) -> PwmCommand {
        match self {
            Self::Duty => PwmCommand::SetDuty(value),
            Self::Period => PwmCommand::SetPeriod(value),
            Self::Run => PwmCommand::SetRun(value != 0),
            Self::Request => PwmCommand::Request(value != 0),
            Self::Polarity => PwmCommand::SetPolarity(value != 0),
        }
    }
}

/// Render an attribute for reading, trailing newline included.
pub fn show(attr: Attribute, state: &ChannelState) -> String {
    match attr {
        Attribute::Duty => format!("{}\n", state.duty),
        Attribute::Period => format!("{}\n", state.period),
        Attribute::Run => {
            format!("{}\n", if state.run { "Enabled" } else { "Disabled" })
        }
        Attribute::Polarity => format!(
            "{}\n",
            if state.polarity {
                "Polarity Inversed"
            } else {
                "Polarity Normal"
            }
        ),
        Attribute::Request => {
            format!("{}\n", if state.requested { "Requested" } else { "Freed" })
        }
    }
}

/// Parse raw attribute text into the command it requests.
pub fn parse_command(attr: Attribute, raw: &str) -> Result<PwmCommand, ParseError> {
    parse_ulong(raw).map(|value| attr.command(value))
}

/// Parse an unsigned long the way `kstrtoul(s, 0, ..)` does.
///
/// Accepts one trailing newline and an optional leading `+`.  A `0x`/`0X`
/// prefix selects hex, a leading `0` selects octal, anything else decimal.
pub fn parse_ulong(raw: &str) -> Result<u64, ParseError> {
    let s = raw.strip_suffix('\n').unwrap_or(raw);
    let s = s.strip_prefix('+').unwrap_or(s);

    let (radix, digits) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, hex)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..])
    } else {
        (10, s)
    };

    if digits.is_empty() {
        return Err(ParseError::Empty);
    }

    digits.chars().try_fold(0u64, |acc, c| {
        let digit = c.to_digit(radix).ok_or(ParseError::InvalidDigit)?;
        acc.checked_mul(u64::from(radix))
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or(ParseError::Overflow)
    })
}
