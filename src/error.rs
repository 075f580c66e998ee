use thiserror::Error;

use crate::store::Collection;

pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type RecordResult<T> = std::result::Result<T, RecordError>;

/// Failures raised by a record store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("duplicate {field} `{value}` in {collection}")]
    Conflict {
        collection: Collection,
        field: &'static str,
        value: String,
    },
    #[error("{collection} record not found: {id}")]
    NotFound { collection: Collection, id: String },
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a create or update is rejected before (or while) persisting.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("unrecognized {field} format: {input:?}")]
    Format { field: &'static str, input: String },
    #[error("event {event_id} does not exist")]
    ReferentialIntegrity { event_id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RecordError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        RecordError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn format(field: &'static str, input: &str) -> Self {
        RecordError::Format {
            field,
            input: input.to_string(),
        }
    }

    /// Field named by a validation or format failure.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            RecordError::Validation { field, .. } | RecordError::Format { field, .. } => {
                Some(*field)
            }
            _ => None,
        }
    }

    /// True when a unique index rejected the write.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RecordError::Store(StoreError::Conflict { .. }))
    }
}
