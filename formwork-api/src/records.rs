use std::sync::Arc;

use async_trait::async_trait;

use formwork_types::{Record, RecordId, RecordMutation};

use crate::error::ApiError;

pub type RecordManagerRef = Arc<dyn RecordManager>;

/// Backend collaborator managing configuration records.
///
/// Retry and timeout policies belong to implementations of this trait,
/// callers issue every request exactly once.
#[async_trait]
pub trait RecordManager: Send + Sync {
    /// Creates a new record or updates an existing one.
    async fn submit_record(&self, mutation: RecordMutation) -> Result<Record, ApiError>;

    async fn delete_record(&self, id: RecordId) -> Result<(), ApiError>;

    async fn list_records(&self) -> Result<Vec<Record>, ApiError>;
}
