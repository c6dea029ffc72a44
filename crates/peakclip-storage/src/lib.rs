//! Object storage client for published clips.
//!
//! Talks to any S3-compatible endpoint. Uploads are upserts: a retried
//! job may overwrite an existing key without error.

pub mod client;
pub mod error;

pub use client::{ClipBucket, StorageConfig};
pub use error::{StorageError, StorageResult};
