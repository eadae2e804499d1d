//! In-memory storage event records.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use stowage_core::result::AppResult;
use stowage_entity::file::{FileEvent, NewFileEvent};
use stowage_entity::processing::ProcessingStatus;

use crate::traits::{Begin, FileEventStore};

/// Events keyed by `event_id`.
#[derive(Debug, Default)]
pub struct MemoryFileEventStore {
    rows: RwLock<HashMap<String, FileEvent>>,
}

impl MemoryFileEventStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn finish(
        &self,
        event_id: &str,
        current_version: i64,
        apply: impl FnOnce(&mut FileEvent) + Send,
    ) -> Option<FileEvent> {
        let mut rows = self.rows.write().await;
        let event = rows.get_mut(event_id).filter(|e| {
            e.version == current_version && e.status == ProcessingStatus::Processing
        })?;
        apply(event);
        event.version += 1;
        event.updated_at = Utc::now();
        Some(event.clone())
    }
}

#[async_trait]
impl FileEventStore for MemoryFileEventStore {
    async fn begin(&self, data: &NewFileEvent) -> AppResult<Begin<FileEvent>> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows.get_mut(&data.event_id) {
            return Ok(match existing.status {
                ProcessingStatus::Completed => Begin::Completed(existing.clone()),
                ProcessingStatus::Processing => Begin::InProgress(existing.clone()),
                ProcessingStatus::Failed => {
                    existing.status = ProcessingStatus::Processing;
                    existing.error = None;
                    existing.version += 1;
                    existing.updated_at = Utc::now();
                    Begin::Restarted(existing.clone())
                }
            });
        }

        let now = Utc::now();
        let event = FileEvent {
            id: Uuid::new_v4(),
            event_id: data.event_id.clone(),
            file_path: data.file_path.clone(),
            event_type: data.event_type,
            status: ProcessingStatus::Processing,
            version: 0,
            payload: data.payload.clone(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        rows.insert(event.event_id.clone(), event.clone());
        Ok(Begin::Started(event))
    }

    async fn find_by_event_id(&self, event_id: &str) -> AppResult<Option<FileEvent>> {
        Ok(self.rows.read().await.get(event_id).cloned())
    }

    async fn complete(
        &self,
        event_id: &str,
        current_version: i64,
        result: serde_json::Value,
    ) -> AppResult<Option<FileEvent>> {
        Ok(self
            .finish(event_id, current_version, |event| {
                event.status = ProcessingStatus::Completed;
                event.result = Some(result);
                event.completed_at = Some(Utc::now());
            })
            .await)
    }

    async fn fail(
        &self,
        event_id: &str,
        current_version: i64,
        error: &str,
    ) -> AppResult<Option<FileEvent>> {
        let error = error.to_string();
        Ok(self
            .finish(event_id, current_version, |event| {
                event.status = ProcessingStatus::Failed;
                event.error = Some(error);
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_entity::file::FileEventType;

    fn new_event() -> NewFileEvent {
        NewFileEvent {
            event_id: "evt-1".into(),
            file_path: "a/b/c.txt".into(),
            event_type: FileEventType::ObjectCreated,
            payload: None,
        }
    }

    #[tokio::test]
    async fn test_claim_lifecycle() {
        let store = MemoryFileEventStore::new();

        let started = store.begin(&new_event()).await.unwrap();
        assert!(matches!(started, Begin::Started(_)));
        let version = started.record().version;

        assert!(matches!(
            store.begin(&new_event()).await.unwrap(),
            Begin::InProgress(_)
        ));

        let failed = store.fail("evt-1", version, "boom").await.unwrap().unwrap();
        let restarted = store.begin(&new_event()).await.unwrap();
        assert!(matches!(restarted, Begin::Restarted(_)));
        assert!(restarted.record().version > failed.version);

        let done = store
            .complete("evt-1", restarted.record().version, serde_json::json!({"ok": true}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.status, ProcessingStatus::Completed);

        match store.begin(&new_event()).await.unwrap() {
            Begin::Completed(event) => assert_eq!(event.result, Some(serde_json::json!({"ok": true}))),
            other => panic!("expected completed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_with_stale_version_is_noop() {
        let store = MemoryFileEventStore::new();
        let started = store.begin(&new_event()).await.unwrap();
        let stale = started.record().version + 7;
        assert!(store
            .complete("evt-1", stale, serde_json::json!({}))
            .await
            .unwrap()
            .is_none());
    }
}
