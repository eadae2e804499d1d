//! Idempotent processing of storage events.
//!
//! A storage event is claimed by `event_id` before its effect is applied,
//! so a redelivered notification returns the stored result instead of
//! touching the file twice.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_database::traits::{Begin, FileEventStore, FileStore};
use stowage_entity::file::{File, FileEvent, FileEventType, FileStatus, NewFileEvent};

/// Version-guarded writes made by one event before giving up.
const APPLY_ATTEMPTS: u32 = 5;

/// Result of processing an event.
#[derive(Debug, Clone)]
pub struct EventOutcome {
    /// The event record in its final state.
    pub record: FileEvent,
    /// True when the event had already completed and nothing was applied.
    pub replayed: bool,
}

/// Applies storage events to file records exactly once.
#[derive(Debug, Clone)]
pub struct FileEventProcessor {
    events: Arc<dyn FileEventStore>,
    files: Arc<dyn FileStore>,
}

/// Size reported by the producer, under `size_bytes` or `size`.
fn reported_size(payload: Option<&Value>) -> Option<i64> {
    let payload = payload?;
    payload
        .get("size_bytes")
        .or_else(|| payload.get("size"))
        .and_then(Value::as_i64)
        .filter(|size| *size >= 0)
}

fn ignored(reason: &str) -> Value {
    json!({ "outcome": "ignored", "reason": reason })
}

fn applied(file: &File) -> Value {
    json!({
        "outcome": "applied",
        "file_id": file.id,
        "status": file.status,
        "size_bytes": file.size_bytes,
        "version": file.version,
    })
}

impl FileEventProcessor {
    /// Creates a new event processor.
    pub fn new(events: Arc<dyn FileEventStore>, files: Arc<dyn FileStore>) -> Self {
        Self { events, files }
    }

    /// Process an event, or return the stored outcome of an earlier run.
    pub async fn process(&self, event: NewFileEvent) -> AppResult<EventOutcome> {
        let claim = self.events.begin(&event).await?;
        let record = match claim {
            Begin::Completed(record) => {
                info!(event_id = %record.event_id, "Storage event already processed");
                return Ok(EventOutcome {
                    record,
                    replayed: true,
                });
            }
            Begin::InProgress(record) => {
                return Err(AppError::conflict(format!(
                    "Event '{}' is being processed",
                    record.event_id
                ))
                .with_key("file_event.in_progress"));
            }
            Begin::Started(record) | Begin::Restarted(record) => record,
        };

        match self.apply(&record).await {
            Ok(result) => {
                let completed = self
                    .events
                    .complete(&record.event_id, record.version, result)
                    .await?
                    .ok_or_else(|| {
                        AppError::conflict("Event record changed while processing")
                            .with_key("file_event.version_conflict")
                    })?;
                info!(
                    event_id = %completed.event_id,
                    event_type = %completed.event_type,
                    file_path = %completed.file_path,
                    "Storage event processed"
                );
                Ok(EventOutcome {
                    record: completed,
                    replayed: false,
                })
            }
            Err(e) => {
                warn!(event_id = %record.event_id, error = %e, "Storage event failed");
                if let Err(mark_err) = self
                    .events
                    .fail(&record.event_id, record.version, &e.message)
                    .await
                {
                    warn!(event_id = %record.event_id, error = %mark_err, "Could not mark event failed");
                }
                Err(e)
            }
        }
    }

    async fn apply(&self, event: &FileEvent) -> AppResult<Value> {
        let size = reported_size(event.payload.as_ref());

        for _ in 0..APPLY_ATTEMPTS {
            let Some(file) = self.files.find_by_path(&event.file_path).await? else {
                return Ok(ignored("unknown_path"));
            };
            if file.status == FileStatus::Deleted {
                return Ok(ignored("file_deleted"));
            }

            let updated = match event.event_type {
                FileEventType::ObjectCreated | FileEventType::ObjectUpdated => {
                    self.files.mark_stored(file.id, size, file.version).await?
                }
                FileEventType::ObjectDeleted => {
                    if file.is_referenced() {
                        warn!(
                            file_id = %file.id,
                            reference_count = file.reference_count,
                            "Object deleted from storage while still referenced"
                        );
                    }
                    self.files
                        .update_status(file.id, FileStatus::Deleted, file.version)
                        .await?
                }
            };

            if let Some(updated) = updated {
                return Ok(applied(&updated));
            }
        }

        Err(AppError::conflict("File was modified concurrently")
            .with_key("file.version_conflict"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::error::ErrorKind;
    use stowage_database::Stores;
    use stowage_entity::file::NewFile;
    use stowage_entity::processing::ProcessingStatus;
    use uuid::Uuid;

    async fn setup() -> (FileEventProcessor, Arc<dyn FileStore>, File) {
        let stores = Stores::memory();
        let file = stores
            .files
            .create(&NewFile {
                file_path: "owner/x/report.pdf".into(),
                owner_id: Uuid::new_v4(),
                content_type: "application/pdf".into(),
                size_bytes: None,
            })
            .await
            .unwrap();
        (
            FileEventProcessor::new(stores.file_events, stores.files.clone()),
            stores.files,
            file,
        )
    }

    fn event(id: &str, path: &str, event_type: FileEventType, size: Option<i64>) -> NewFileEvent {
        NewFileEvent {
            event_id: id.to_string(),
            file_path: path.to_string(),
            event_type,
            payload: size.map(|s| json!({ "size_bytes": s })),
        }
    }

    #[tokio::test]
    async fn test_created_activates_file() {
        let (processor, files, file) = setup().await;

        let outcome = processor
            .process(event("e1", &file.file_path, FileEventType::ObjectCreated, Some(42)))
            .await
            .unwrap();
        assert!(!outcome.replayed);
        assert_eq!(outcome.record.status, ProcessingStatus::Completed);

        let stored = files.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(stored.status, FileStatus::Active);
        assert_eq!(stored.size_bytes, Some(42));
    }

    #[tokio::test]
    async fn test_replay_returns_stored_result() {
        let (processor, files, file) = setup().await;
        let first = processor
            .process(event("e1", &file.file_path, FileEventType::ObjectCreated, Some(1)))
            .await
            .unwrap();
        let version_after_first = files.find_by_id(file.id).await.unwrap().unwrap().version;

        let replay = processor
            .process(event("e1", &file.file_path, FileEventType::ObjectCreated, Some(999)))
            .await
            .unwrap();
        assert!(replay.replayed);
        assert_eq!(replay.record.result, first.record.result);

        let stored = files.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(stored.version, version_after_first);
        assert_eq!(stored.size_bytes, Some(1));
    }

    #[tokio::test]
    async fn test_unknown_path_is_ignored() {
        let (processor, _, _) = setup().await;
        let outcome = processor
            .process(event("e2", "nobody/here.txt", FileEventType::ObjectCreated, None))
            .await
            .unwrap();
        assert_eq!(
            outcome.record.result.unwrap()["outcome"],
            Value::from("ignored")
        );
    }

    #[tokio::test]
    async fn test_deleted_marks_file() {
        let (processor, files, file) = setup().await;
        processor
            .process(event("e3", &file.file_path, FileEventType::ObjectDeleted, None))
            .await
            .unwrap();
        let stored = files.find_by_id(file.id).await.unwrap().unwrap();
        assert_eq!(stored.status, FileStatus::Deleted);
    }

    #[tokio::test]
    async fn test_in_progress_conflicts() {
        let stores = Stores::memory();
        let processor = FileEventProcessor::new(stores.file_events.clone(), stores.files);
        let new = event("e4", "a/b/c", FileEventType::ObjectCreated, None);
        stores.file_events.begin(&new).await.unwrap();

        let err = processor.process(new).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.message_key.as_deref(), Some("file_event.in_progress"));
    }

    #[test]
    fn test_reported_size() {
        assert_eq!(reported_size(Some(&json!({ "size": 7 }))), Some(7));
        assert_eq!(reported_size(Some(&json!({ "size_bytes": -1 }))), None);
        assert_eq!(reported_size(None), None);
    }
}
