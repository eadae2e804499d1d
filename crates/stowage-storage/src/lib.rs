//! # stowage-storage
//!
//! Object storage providers for Stowage. The local filesystem provider
//! issues server-signed upload URLs; the S3 provider issues presigned PUT
//! URLs against any S3-compatible bucket.

pub mod manager;
pub mod providers;
pub mod upload_token;

pub use manager::StorageManager;
pub use upload_token::{UploadClaims, UploadTokenSigner};
