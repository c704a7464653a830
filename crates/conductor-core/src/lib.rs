//! Core types and error definitions for the Conductor workspace.
//!
//! This crate provides the foundational types shared across all Conductor
//! crates: the unified error enum, the artifacts worker agents produce, and
//! the timestamped JSON report store used by the orchestrator and monitor.
//!
//! # Main types
//!
//! - [`ConductorError`]: Unified error enum for all Conductor subsystems.
//! - [`ConductorResult`]: Convenience alias for `Result<T, ConductorError>`.
//! - [`Artifact`]: A file written to disk by a worker agent.
//! - [`JsonReportStore`]: Writes and reloads `<id>_<timestamp>.json` reports.

/// Files produced by worker agents.
pub mod artifact;
/// Unified error type.
pub mod error;
/// Timestamped JSON report persistence.
pub mod report;

pub use artifact::{Artifact, ArtifactKind};
pub use error::{ConductorError, ConductorResult};
pub use report::{report_file_name, JsonReportStore};
