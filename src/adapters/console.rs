//! Line console: the operator's front end to the attribute surface.
//!
//! ```text
//!   duty            read an attribute
//!   duty=500        write an attribute (also: `duty 500`)
//!   status          JSON dump of the channel state
//!   help            list commands
//!   quit            shut the harness down
//! ```

use core::fmt;

use crate::app::attributes::Attribute;
use crate::app::ports::{EventSink, PwmProvider};
use crate::app::service::HarnessService;

const HELP: &str = "\
attributes: duty period run request polarity
  <attr>           read
  <attr>=<value>   write (decimal, 0x hex, 0 octal)
  status           channel state as JSON
  quit             park output, free channel, exit
";

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleRequest<'a> {
    Read(Attribute),
    Write { attr: Attribute, value: &'a str },
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// Blank line.
    Empty,
    /// Neither a command nor an attribute name.
    UnknownCommand,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::UnknownCommand => write!(f, "unknown command (try 'help')"),
        }
    }
}

/// Split a console line into a request.
pub fn parse_line(line: &str) -> Result<ConsoleRequest<'_>, ConsoleError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ConsoleError::Empty);
    }

    match line {
        "status" => return Ok(ConsoleRequest::Status),
        "help" | "?" => return Ok(ConsoleRequest::Help),
        "quit" | "exit" => return Ok(ConsoleRequest::Quit),
        _ => {}
    }

    let split = line
        .char_indices()
        .find(|&(_, c)| c == '=' || c.is_whitespace());
    let (name, value) = match split {
        Some((i, c)) => (&line[..i], Some(line[i + c.len_utf8()..].trim())),
        None => (line, None),
    };
    let attr = Attribute::from_name(name).ok_or(ConsoleError::UnknownCommand)?;

    Ok(match value {
        Some(value) => ConsoleRequest::Write { attr, value },
        None => ConsoleRequest::Read(attr),
    })
}

/// Execute a request and render the reply, trailing newline included.
pub fn execute<P: PwmProvider>(
    service: &mut HarnessService<P>,
    request: ConsoleRequest<'_>,
    sink: &mut impl EventSink,
) -> String {
    match request {
        ConsoleRequest::Read(attr) => service.read_attribute(attr),
        ConsoleRequest::Write { attr, value } => {
            match service.write_attribute(attr, value, sink) {
                Ok(_) => "ok\n".to_owned(),
                Err(e) => format!("error: {} ({})\n", e, e.errno()),
            }
        }
        ConsoleRequest::Status => match serde_json::to_string(&service.state()) {
            Ok(json) => json + "\n",
            Err(e) => format!("error: {}\n", e),
        },
        ConsoleRequest::Help => HELP.to_owned(),
        ConsoleRequest::Quit => "bye\n".to_owned(),
    }
}

/// Parse and execute one line.  Blank lines produce an empty reply.
pub fn respond<P: PwmProvider>(
    service: &mut HarnessService<P>,
    line: &str,
    sink: &mut impl EventSink,
) -> String {
    match parse_line(line) {
        Ok(request) => execute(service, request, sink),
        Err(ConsoleError::Empty) => String::new(),
        Err(e) => format!("error: {}\n", e),
    }
}
