//! CERES Gate Kit
//!
//! Governance control plane for the agent task workflow. Before a `plan` or
//! `execute` action may proceed it has to pass the deterministic, fail-closed
//! preflight gate; how the action behaves is derived from layered settings
//! rather than hard-coded constants.
//!
//! The crate is synchronous and single-process by design. Every decision is
//! written to an append-only JSONL audit log.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod gate;
pub mod governance;
pub mod guard;
pub mod settings;
pub mod types;
pub mod workspace;

pub use error::{GateKitError, Result};
pub use events::EventLog;
pub use types::{EventStatus, GateContext, GateMode};
pub use workspace::Workspace;

/// Gate kit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
