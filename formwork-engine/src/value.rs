use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Current value of one form field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(String::from(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => write!(f, "{text}"),
            FieldValue::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// Form values keyed by field id.
pub type FieldValues = BTreeMap<String, FieldValue>;

/// Auxiliary toggle states keyed by toggle id.
pub type Toggles = BTreeMap<String, bool>;
