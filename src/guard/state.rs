//! Persisted guard state and the derived tri-state status.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimal persisted state of the guard.
///
/// `lock_permanent` is monotonic: once set, nothing in this crate clears it.
/// Only deleting the state file returns the guard to [`GuardStatus::Normal`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityState {
    /// Set by the first yellow-level event.
    pub alert_flag: bool,
    /// Set by a red-level event or a repeated yellow-level event.
    pub lock_permanent: bool,
    /// Human-readable cause of the current alert or lock.
    pub lock_reason: Option<String>,
}

impl SecurityState {
    /// Current position in the `Normal -> Alert -> Locked` progression.
    pub fn status(&self) -> GuardStatus {
        if self.lock_permanent {
            GuardStatus::Locked
        } else if self.alert_flag {
            GuardStatus::Alert
        } else {
            GuardStatus::Normal
        }
    }

    /// Decode a stored record without rejecting mistyped fields.
    ///
    /// Flags follow JSON truthiness (`null`, `false`, `0`, `""`, `[]` and `{}`
    /// are false). A `lock_reason` that is not a string keeps its JSON text.
    /// Returns `None` when `value` is not an object.
    pub fn from_json_lenient(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let flag = |key: &str| object.get(key).is_some_and(is_truthy);
        let lock_reason = match object.get("lock_reason") {
            None | Some(Value::Null) => None,
            Some(Value::String(reason)) => Some(reason.clone()),
            Some(other) => Some(other.to_string()),
        };
        Some(Self {
            alert_flag: flag("alert_flag"),
            lock_permanent: flag("lock_permanent"),
            lock_reason,
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Tri-state view of a [`SecurityState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStatus {
    /// No prior warnings (green level).
    Normal,
    /// One yellow-level warning recorded.
    Alert,
    /// Protected use permanently denied. Terminal.
    Locked,
}

impl GuardStatus {
    /// Lower-case label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Alert => "alert",
            Self::Locked => "locked",
        }
    }
}
