//! Job and clip store client.
//!
//! Talks to a PostgREST-style API (a `jobs` table and an append-only
//! `clips` table). The claim operation is a conditional update keyed
//! on `status = pending`, so two workers can never own the same job.

pub mod client;
pub mod error;

pub use client::{JobStoreClient, StoreConfig};
pub use error::{StoreError, StoreResult};
