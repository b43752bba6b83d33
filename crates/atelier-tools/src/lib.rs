//! Atelier Tools Library
//!
//! LLM-facing tools for the atelier workbench. The single tool here is
//! `file_operation`: one function schema the model calls with a `type`
//! discriminator for read / write / edit / list / grep / find, backed by
//! the speculative-edit engine in `atelier-core`.

pub mod file_operation;

pub use file_operation::FileOperationTool;
