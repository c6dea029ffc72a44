//! VOD highlight clipping worker.
//!
//! This crate provides:
//! - The job controller state machine (claim, run, finalize)
//! - The per-segment clip pipeline
//! - Hook caption generation
//! - Whisper transcription

// The capability traits are only consumed by generic code in this
// workspace, so auto-trait visibility on their futures is not a
// concern.
#![allow(async_fn_in_trait)]

pub mod config;
pub mod controller;
pub mod error;
pub mod hooks;
pub mod pipeline;
pub mod services;
pub mod transcribe;

pub use config::WorkerConfig;
pub use controller::{JobController, JobOutcome};
pub use error::{WorkerError, WorkerResult};
pub use hooks::make_hook;
