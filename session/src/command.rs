//! Operator commands accepted by the device.

use std::fmt;

use crate::error::{Error, Result};

/// A validated operator command.
///
/// Commands are transient instructions: validated, forwarded to the
/// device and never stored as state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Extend the clothesline.
    Open,
    /// Retract the clothesline.
    Close,
    /// Hand control back to the on-device automation.
    Auto,
}

impl Command {
    /// Validate a raw operator input.
    ///
    /// The input is trimmed and ASCII-uppercased before the membership
    /// check, so `" open "` is accepted as [`Command::Open`]. Anything
    /// outside {OPEN, CLOSE, AUTO} is rejected with
    /// [`Error::InvalidCommand`] carrying the original input.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Command::Open),
            "CLOSE" => Ok(Command::Close),
            "AUTO" => Ok(Command::Auto),
            _ => Err(Error::InvalidCommand(raw.to_string())),
        }
    }

    /// The wire form published on the command topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Open => "OPEN",
            Command::Close => "CLOSE",
            Command::Auto => "AUTO",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_commands_after_normalization() {
        assert_eq!(Command::parse("OPEN").unwrap(), Command::Open);
        assert_eq!(Command::parse(" open ").unwrap(), Command::Open);
        assert_eq!(Command::parse("close").unwrap(), Command::Close);
        assert_eq!(Command::parse("AuTo").unwrap(), Command::Auto);
    }

    #[test]
    fn rejects_unknown_input_with_original_text() {
        for raw in ["OFF", "", "  ", "OPEN CLOSE", "opened"] {
            match Command::parse(raw) {
                Err(Error::InvalidCommand(input)) => assert_eq!(input, raw),
                other => panic!("expected InvalidCommand for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn wire_form_is_the_uppercase_token() {
        assert_eq!(Command::Open.as_str(), "OPEN");
        assert_eq!(Command::Close.as_str(), "CLOSE");
        assert_eq!(Command::Auto.as_str(), "AUTO");
        assert_eq!(Command::Close.to_string(), "CLOSE");
    }
}
