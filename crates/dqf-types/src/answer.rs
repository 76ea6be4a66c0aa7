use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user-entered value: free text / date, or a checkbox state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Text(String),
}

impl AnswerValue {
    /// Whether a checkbox bound to this value is checked
    pub fn is_truthy(&self) -> bool {
        match self {
            AnswerValue::Bool(b) => *b,
            AnswerValue::Text(s) => {
                let s = s.trim();
                !s.is_empty()
                    && !matches!(
                        s.to_ascii_lowercase().as_str(),
                        "false" | "no" | "off" | "0"
                    )
            }
        }
    }

    /// Whether the value counts as blank for drawing and validation
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Bool(b) => !b,
            AnswerValue::Text(s) => s.trim().is_empty(),
        }
    }

    /// Text to draw into a textual field, if any
    pub fn as_display_text(&self) -> Option<String> {
        match self {
            AnswerValue::Bool(true) => Some("Yes".to_string()),
            AnswerValue::Bool(false) => None,
            AnswerValue::Text(s) if s.is_empty() => None,
            AnswerValue::Text(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        AnswerValue::Text(s)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        AnswerValue::Bool(b)
    }
}

/// Field id -> value. Last write wins.
pub type AnswerMap = BTreeMap<String, AnswerValue>;
