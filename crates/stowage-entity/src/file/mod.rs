//! File and storage-bookkeeping entities.

pub mod event;
pub mod model;
pub mod operation;
pub mod status;

pub use event::{FileEvent, FileEventType, NewFileEvent};
pub use model::{File, NewFile};
pub use operation::{FileOperation, FileOperationType, NewFileOperation};
pub use status::FileStatus;
