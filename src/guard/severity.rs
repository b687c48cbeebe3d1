//! Severity classification for reported security events.

use std::fmt;

/// Severity of a reported event.
///
/// Parsing never fails: anything that is not `info`, `yellow`, or `red`
/// (after trimming and lower-casing) is kept as [`Severity::Unknown`] so it
/// can still be audited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    /// Informational; audited only.
    Info,
    /// Warning level. A second one escalates to a permanent lock.
    Yellow,
    /// Immediate permanent lock.
    Red,
    /// Unrecognised severity, holding the normalised input.
    Unknown(String),
}

impl Severity {
    /// Normalise (trim + lower-case) and classify a raw severity string.
    pub fn parse(raw: &str) -> Self {
        let normalised = raw.trim().to_lowercase();
        match normalised.as_str() {
            "info" => Self::Info,
            "yellow" => Self::Yellow,
            "red" => Self::Red,
            _ => Self::Unknown(normalised),
        }
    }

    /// The normalised string form written to the audit log.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Info => "info",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for Severity {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
