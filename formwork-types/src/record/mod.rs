use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::Kind;
use crate::payload::{Params, SubmissionPayload};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[derive(thiserror::Error, Clone, Debug)]
#[error("Illegal RecordId: {value}")]
pub struct IllegalRecordId {
    pub value: String,
}

impl TryFrom<&str> for RecordId {
    type Error = IllegalRecordId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| IllegalRecordId { value: String::from(value) })
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend-managed configuration record, as returned by the record manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub kind: Kind,
    pub params: Params,
    /// Set when other resources reference this record. Such records cannot be deleted.
    #[serde(default)]
    pub in_use: bool,
}

impl Record {
    pub fn as_option(&self) -> SelectionOption {
        SelectionOption {
            value: self.id,
            label: Clone::clone(&self.name),
        }
    }
}

/// Entry of a dependent selection list, e.g. the destination picker of an alert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOption {
    pub value: RecordId,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecordMutation {
    Create {
        kind: Kind,
        payload: SubmissionPayload,
    },
    Update {
        id: RecordId,
        kind: Kind,
        payload: SubmissionPayload,
    },
}

impl RecordMutation {
    pub fn kind(&self) -> Kind {
        match self {
            RecordMutation::Create { kind, .. } => *kind,
            RecordMutation::Update { kind, .. } => *kind,
        }
    }

    pub fn payload(&self) -> &SubmissionPayload {
        match self {
            RecordMutation::Create { payload, .. } => payload,
            RecordMutation::Update { payload, .. } => payload,
        }
    }
}
