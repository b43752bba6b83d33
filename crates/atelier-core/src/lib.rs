//! Atelier Core Library
//!
//! This crate provides the speculative file-edit engine for the atelier
//! workbench: tool calls streamed from an LLM stage textual edits against
//! real files without touching them, subsequent reads observe the staged
//! view, and the user finally commits or discards the whole batch.
//!
//! # Key components
//!
//! - [`pending::PendingEditLog`] - per-conversation, per-turn log of staged
//!   string-replacement edits
//! - [`history::SnapshotStore`] - per-file, per-turn full-text snapshots
//!   captured when a batch is committed
//! - [`view::compose`] - pure function layering the staged edits over the
//!   on-disk bytes
//! - [`batch::EditBatchCoordinator`] - accept-all / reject-all of a
//!   conversation's staged batch
//! - [`revoke::RevocationCoordinator`] - message revocation with snapshot
//!   restore
//! - [`transcript::TranscriptStore`] - chat sessions on disk, including the
//!   tool-message status hook the coordinators drive
//! - [`tools`] - the tool framework (trait, call/result types, executor)
//!   the `file_operation` tool plugs into
//!
//! The [`engine::EditEngine`] handle owns the durable stores and is the
//! single object an application root constructs and passes into handlers.

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
mod fsio;
pub mod history;
pub mod pending;
pub mod revoke;
pub mod tools;
pub mod transcript;
pub mod view;

pub use config::EngineConfig;
pub use engine::EditEngine;
pub use error::{EngineError, EngineResult};
