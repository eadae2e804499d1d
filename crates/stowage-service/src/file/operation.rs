//! Idempotent reference operations.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_database::traits::{Begin, FileOperationStore, FileStore};
use stowage_entity::file::{FileOperation, NewFileOperation};

use super::reference::ReferenceCounter;

/// Result of processing an operation.
#[derive(Debug, Clone)]
pub struct OperationOutcome {
    /// The operation record in its final state.
    pub record: FileOperation,
    /// True when the operation had already completed and nothing was applied.
    pub replayed: bool,
}

/// Applies add/remove reference requests exactly once per `operation_id`.
#[derive(Debug, Clone)]
pub struct FileOperationProcessor {
    operations: Arc<dyn FileOperationStore>,
    files: Arc<dyn FileStore>,
    counter: ReferenceCounter,
}

impl FileOperationProcessor {
    /// Creates a new operation processor.
    pub fn new(
        operations: Arc<dyn FileOperationStore>,
        files: Arc<dyn FileStore>,
        counter: ReferenceCounter,
    ) -> Self {
        Self {
            operations,
            files,
            counter,
        }
    }

    /// Process an operation, or return the stored outcome of an earlier run.
    pub async fn process(&self, op: NewFileOperation) -> AppResult<OperationOutcome> {
        if self.files.find_by_id(op.file_id).await?.is_none() {
            return Err(AppError::not_found("File not found").with_key("file.not_found"));
        }
        if let Some(existing) = self.operations.find_by_operation_id(&op.operation_id).await? {
            ensure_same_request(&existing, &op)?;
        }

        let record = match self.operations.begin(&op).await? {
            Begin::Completed(record) => {
                ensure_same_request(&record, &op)?;
                info!(operation_id = %record.operation_id, "Reference operation already processed");
                return Ok(OperationOutcome {
                    record,
                    replayed: true,
                });
            }
            Begin::InProgress(record) => {
                return Err(AppError::conflict(format!(
                    "Operation '{}' is being processed",
                    record.operation_id
                ))
                .with_key("file_operation.in_progress"));
            }
            Begin::Started(record) => record,
            Begin::Restarted(record) => {
                if let Err(e) = ensure_same_request(&record, &op) {
                    // Hand the claim back so the original request can still be retried.
                    self.operations
                        .fail(&record.operation_id, record.version, &e.message)
                        .await?;
                    return Err(e);
                }
                record
            }
        };

        match self
            .counter
            .adjust(record.file_id, record.operation_type.delta())
            .await
        {
            Ok(file) => {
                let result = json!({
                    "file_id": file.id,
                    "reference_count": file.reference_count,
                    "version": file.version,
                });
                let completed = self
                    .operations
                    .complete(&record.operation_id, record.version, result)
                    .await?
                    .ok_or_else(|| {
                        AppError::conflict("Operation record changed while processing")
                            .with_key("file_operation.version_conflict")
                    })?;
                info!(
                    operation_id = %completed.operation_id,
                    operation_type = %completed.operation_type,
                    file_id = %completed.file_id,
                    reference_count = file.reference_count,
                    "Reference operation processed"
                );
                Ok(OperationOutcome {
                    record: completed,
                    replayed: false,
                })
            }
            Err(e) => {
                warn!(operation_id = %record.operation_id, error = %e, "Reference operation failed");
                if let Err(mark_err) = self
                    .operations
                    .fail(&record.operation_id, record.version, &e.message)
                    .await
                {
                    warn!(operation_id = %record.operation_id, error = %mark_err, "Could not mark operation failed");
                }
                Err(e)
            }
        }
    }
}

/// An idempotency key may not be reused for a different request.
fn ensure_same_request(record: &FileOperation, op: &NewFileOperation) -> AppResult<()> {
    if record.file_id == op.file_id && record.operation_type == op.operation_type {
        return Ok(());
    }
    Err(AppError::conflict(format!(
        "Operation '{}' was already used for a different request",
        op.operation_id
    ))
    .with_key("file_operation.key_reused"))
}
