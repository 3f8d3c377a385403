use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use formwork_types::{Family, Record, RecordId, RecordMutation};

use crate::error::ApiError;
use crate::records::RecordManager;

/// [`RecordManager`] keeping records in memory, in insertion order.
///
/// Names are unique within a [`Family`], mirroring the constraint of the backend.
#[derive(Debug, Default)]
pub struct InMemoryRecordManager {
    records: RwLock<Vec<Record>>,
}

impl InMemoryRecordManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn get(&self, id: RecordId) -> Option<Record> {
        self.records.read().await
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub async fn set_in_use(&self, id: RecordId, in_use: bool) -> Result<(), ApiError> {
        let mut records = self.records.write().await;
        let record = records.iter_mut()
            .find(|record| record.id == id)
            .ok_or(ApiError::NotFound { id })?;
        record.in_use = in_use;
        Ok(())
    }

    fn check_unique_name(records: &[Record], name: &str, family: Family, except: Option<RecordId>) -> Result<(), ApiError> {
        let taken = records.iter()
            .filter(|record| Some(record.id) != except)
            .any(|record| record.kind.family() == family && record.name == name);
        if taken {
            Err(ApiError::rejected_field("name", format!("A configuration named '{name}' already exists.")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordManager for InMemoryRecordManager {

    #[tracing::instrument(skip_all, level="trace")]
    async fn submit_record(&self, mutation: RecordMutation) -> Result<Record, ApiError> {
        let mut records = self.records.write().await;

        match mutation {
            RecordMutation::Create { kind, payload } => {
                Self::check_unique_name(&records, &payload.name, kind.family(), None)?;

                let record = Record {
                    id: RecordId::random(),
                    name: payload.name,
                    kind,
                    params: payload.params,
                    in_use: false,
                };
                debug!("Creating {kind} record '{}' <{}>.", record.name, record.id);
                records.push(Clone::clone(&record));
                Ok(record)
            }
            RecordMutation::Update { id, kind, payload } => {
                Self::check_unique_name(&records, &payload.name, kind.family(), Some(id))?;

                let record = records.iter_mut()
                    .find(|record| record.id == id)
                    .ok_or(ApiError::NotFound { id })?;

                if record.kind != kind {
                    return Err(ApiError::rejected(format!("Record <{id}> is of kind '{}' and cannot be changed to '{kind}'.", record.kind)));
                }
                record.name = payload.name;
                record.params = payload.params;
                info!("Updated {kind} record '{}' <{id}>.", record.name);
                Ok(Clone::clone(record))
            }
        }
    }

    #[tracing::instrument(skip(self), level="trace")]
    async fn delete_record(&self, id: RecordId) -> Result<(), ApiError> {
        let mut records = self.records.write().await;

        let position = records.iter()
            .position(|record| record.id == id)
            .ok_or(ApiError::NotFound { id })?;

        if records[position].in_use {
            return Err(ApiError::rejected(format!("Record '{}' <{id}> is in use and cannot be deleted until associated resources are removed.", records[position].name)));
        }
        let removed = records.remove(position);
        info!("Deleted {} record '{}' <{id}>.", removed.kind, removed.name);
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<Record>, ApiError> {
        Ok(Clone::clone(&*self.records.read().await))
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    use formwork_types::{Kind, Params, SubmissionPayload};

    use super::*;

    #[fixture]
    fn slack_payload() -> SubmissionPayload {
        let mut params = Params::new();
        params.insert(String::from("targetType"), json!("Slack"));
        params.insert(String::from("webhookUrl"), json!("https://hooks/x"));
        params.insert(String::from("channel"), json!("sl1"));
        SubmissionPayload::new("sl1", params)
    }

    #[rstest]
    #[tokio::test]
    async fn should_create_and_list_records(slack_payload: SubmissionPayload) -> anyhow::Result<()> {
        let manager = InMemoryRecordManager::new();

        let record = manager.submit_record(RecordMutation::Create { kind: Kind::Slack, payload: Clone::clone(&slack_payload) }).await?;

        assert_that!(record.name, eq("sl1"));
        assert_that!(record.params, eq(slack_payload.params));
        assert_that!(manager.list_records().await?, elements_are![eq(record)]);
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn should_reject_duplicate_names_within_a_family(slack_payload: SubmissionPayload) -> anyhow::Result<()> {
        let manager = InMemoryRecordManager::new();
        manager.submit_record(RecordMutation::Create { kind: Kind::Slack, payload: Clone::clone(&slack_payload) }).await?;

        let result = manager.submit_record(RecordMutation::Create { kind: Kind::Email, payload: slack_payload }).await;

        let error = result.expect_err("Creating a record with a taken name should fail.");
        assert_that!(error.field_errors().contains_key("name"), eq(true));
        assert_that!(manager.list_records().await?.len(), eq(1));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn should_update_existing_records_only(slack_payload: SubmissionPayload) -> anyhow::Result<()> {
        let manager = InMemoryRecordManager::new();
        let record = manager.submit_record(RecordMutation::Create { kind: Kind::Slack, payload: Clone::clone(&slack_payload) }).await?;

        let renamed = SubmissionPayload { name: String::from("sl2"), ..Clone::clone(&slack_payload) };
        let updated = manager.submit_record(RecordMutation::Update { id: record.id, kind: Kind::Slack, payload: renamed }).await?;
        assert_that!(updated.id, eq(record.id));
        assert_that!(updated.name, eq("sl2"));

        let unknown = RecordId::random();
        let result = manager.submit_record(RecordMutation::Update { id: unknown, kind: Kind::Slack, payload: slack_payload }).await;
        assert_that!(result, err(eq(ApiError::NotFound { id: unknown })));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn should_refuse_deleting_records_in_use(slack_payload: SubmissionPayload) -> anyhow::Result<()> {
        let manager = InMemoryRecordManager::new();
        let record = manager.submit_record(RecordMutation::Create { kind: Kind::Slack, payload: slack_payload }).await?;
        manager.set_in_use(record.id, true).await?;

        assert!(manager.delete_record(record.id).await.is_err());

        manager.set_in_use(record.id, false).await?;
        manager.delete_record(record.id).await?;
        assert_that!(manager.get(record.id).await, none());
        Ok(())
    }
}
