//! Dialog outcomes
//!
//! A session produces exactly one `DialogOutcome`. It is written once into a
//! shared `OutcomeCell` and is read-only from then on.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Serialize, Serializer};

/// Text captured from an input dialog's field
#[derive(Clone, PartialEq, Eq)]
pub struct InputValue {
    text: String,
    secure: bool,
}

impl InputValue {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            secure: false,
        }
    }

    pub fn secure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            secure: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Same masking mode, new text
    pub fn replaced(&self, text: String) -> Self {
        Self {
            text,
            secure: self.secure,
        }
    }
}

impl fmt::Debug for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secure {
            f.write_str("InputValue(<redacted>)")
        } else {
            write!(f, "InputValue({:?})", self.text)
        }
    }
}

impl Serialize for InputValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.secure {
            serializer.serialize_str("********")
        } else {
            serializer.serialize_str(&self.text)
        }
    }
}

/// Final result of a dialog session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DialogOutcome {
    /// Expired or closed externally without a user choice
    Timeout,
    /// Close the blocking applications and proceed
    Close,
    /// Proceed (nothing left to close)
    Continue,
    /// Postpone the deployment
    Defer,
    /// Restart the computer
    Restart,
    /// A free-form button was clicked
    Button { label: String },
    /// A button was clicked on an input dialog
    Input { label: String, value: InputValue },
}

impl DialogOutcome {
    pub fn label(&self) -> &str {
        match self {
            DialogOutcome::Timeout => "Timeout",
            DialogOutcome::Close => "Close",
            DialogOutcome::Continue => "Continue",
            DialogOutcome::Defer => "Defer",
            DialogOutcome::Restart => "Restart",
            DialogOutcome::Button { label } | DialogOutcome::Input { label, .. } => label,
        }
    }
}

impl fmt::Display for DialogOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Set-once, shareable outcome slot
#[derive(Debug, Clone, Default)]
pub struct OutcomeCell {
    inner: Arc<OnceLock<DialogOutcome>>,
}

impl OutcomeCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the outcome. Returns false if one was already stored; the
    /// original value is kept.
    pub fn set(&self, outcome: DialogOutcome) -> bool {
        self.inner.set(outcome).is_ok()
    }

    pub fn get(&self) -> Option<DialogOutcome> {
        self.inner.get().cloned()
    }

    pub fn is_set(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// Serializable record of a finished dialog
#[derive(Debug, Clone, Serialize)]
pub struct DialogResult {
    /// Session ID
    pub id: String,
    pub kind: String,
    pub outcome: DialogOutcome,
    /// Unix timestamp of completion
    pub timestamp: i64,
}

impl DialogResult {
    pub fn new(id: String, kind: &str, outcome: DialogOutcome) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            outcome,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_sets_once() {
        let cell = OutcomeCell::new();
        let observer = cell.clone();
        assert!(cell.set(DialogOutcome::Defer));
        assert!(!cell.set(DialogOutcome::Timeout));
        assert_eq!(observer.get(), Some(DialogOutcome::Defer));
    }

    #[test]
    fn test_secure_input_is_masked() {
        let outcome = DialogOutcome::Input {
            label: "OK".into(),
            value: InputValue::secure("hunter2"),
        };
        let debug = format!("{:?}", outcome);
        assert!(!debug.contains("hunter2"));

        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("\"result\":\"input\""));
    }

    #[test]
    fn test_plain_input_serializes_text() {
        let outcome = DialogOutcome::Input {
            label: "Submit".into(),
            value: InputValue::plain("C:\\Temp"),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["value"], "C:\\Temp");
        assert_eq!(outcome.label(), "Submit");
    }

    #[test]
    fn test_result_record() {
        let result = DialogResult::new("abc".into(), "close_apps", DialogOutcome::Continue);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"]["result"], "continue");
        assert_eq!(json["kind"], "close_apps");
    }

    #[test]
    fn test_result_timestamp_is_unix_seconds() {
        let before = chrono::Utc::now().timestamp();
        let result = DialogResult::new("abc".into(), "restart", DialogOutcome::Restart);
        assert!(result.timestamp >= before);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["timestamp"].as_i64(), Some(result.timestamp));
    }
}
