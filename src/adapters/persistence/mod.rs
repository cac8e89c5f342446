//! Persistence Adapters - JSONL-based File Storage
//!
//! Implements the `SubmissionJournal` port using append-only JSONL
//! files. No database dependency.

pub mod journal;

pub use journal::JsonlJournal;
