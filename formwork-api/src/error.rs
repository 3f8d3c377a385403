use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use formwork_types::RecordId;

/// Messages per field id, as reported by the backend for a rejected request.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    #[error("Request was rejected: {message}")]
    Rejected {
        message: String,
        field_errors: FieldErrors,
    },
    #[error("Record <{id}> could not be found!")]
    NotFound {
        id: RecordId,
    },
    #[error("Request failed due to internal errors:\n  {cause}")]
    Internal {
        cause: String,
    },
}

impl ApiError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ApiError::Rejected {
            message: message.into(),
            field_errors: FieldErrors::new(),
        }
    }

    pub fn rejected_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::Rejected {
            message: Clone::clone(&message),
            field_errors: FieldErrors::from([(field.into(), vec![message])]),
        }
    }

    /// Per-field messages to render inline. Empty for errors not tied to a field.
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            ApiError::Rejected { field_errors, .. } => Clone::clone(field_errors),
            ApiError::NotFound { .. } | ApiError::Internal { .. } => FieldErrors::new(),
        }
    }
}
