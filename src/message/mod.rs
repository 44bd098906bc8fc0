//! IRC message types and line parsing.
//!
//! ```
//! use slirc_client::Message;
//!
//! let msg: Message = ":nick!user@host privmsg #rust :Hello, world!".parse().unwrap();
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.prefix.nick.as_deref(), Some("nick"));
//! assert_eq!(msg.args, vec!["#rust", "Hello, world!"]);
//! ```

mod nom_parser;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::prefix::Prefix;

pub use self::nom_parser::ParsedMessage;

/// An owned IRC message.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    /// Message source; empty when the line had no prefix.
    pub prefix: Prefix,
    /// Upper-cased command or numeric. Empty for an empty line.
    pub command: String,
    /// Parameters, the last of which may have been a trailing parameter.
    pub args: Vec<String>,
}

impl Message {
    /// Build a message; the command is upper-cased.
    pub fn new(prefix: Prefix, command: &str, args: Vec<String>) -> Self {
        Message {
            prefix,
            command: command.to_uppercase(),
            args,
        }
    }

    /// The argument at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// Parse one line (without its terminator) into a [`Message`].
///
/// This never fails: a line with no tokens becomes a message with an
/// empty command and no arguments.
pub fn parse_line(raw: &str) -> Message {
    let parsed = ParsedMessage::parse(raw);
    Message::new(
        parsed.prefix.map(Prefix::new_from_str).unwrap_or_default(),
        parsed.command,
        parsed.params.into_iter().map(str::to_owned).collect(),
    )
}

impl FromStr for Message {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_line(s))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.prefix.is_empty() {
            write!(f, ":{} ", self.prefix)?;
        }
        f.write_str(&self.command)?;

        if let Some((last, middle)) = self.args.split_last() {
            for arg in middle {
                write!(f, " {}", arg)?;
            }
            if last.is_empty() || last.contains(' ') || last.starts_with(':') {
                write!(f, " :{}", last)?;
            } else {
                write!(f, " {}", last)?;
            }
        }
        Ok(())
    }
}
