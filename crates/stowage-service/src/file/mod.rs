//! File bookkeeping: upload URLs, reference counting, storage events and
//! reference operations.

pub mod event;
pub mod naming;
pub mod operation;
pub mod reference;
pub mod service;

pub use event::{EventOutcome, FileEventProcessor};
pub use operation::{FileOperationProcessor, OperationOutcome};
pub use reference::ReferenceCounter;
pub use service::{FileService, UploadUrl};
