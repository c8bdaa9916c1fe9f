//! Metadata model, validation, reconciliation, rendering and publishing for
//! registering MCP servers in a company registry.
//!
//! ```text
//! identifier ─► orchestrate ─► extract ─► reconcile ─► validate ─► render ─► publish
//!                  │                                                            │
//!            Assistant / Operator                                         CommandRunner
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod io;
pub mod metadata;
pub mod naming;
pub mod orchestrate;
pub mod paths;
pub mod publish;
pub mod reconcile;
pub mod render;
pub mod validate;

pub use error::{RegistryError, Result};
pub use metadata::{MetadataRecord, ReconciliationRecord};
pub use orchestrate::{Assistant, Operator, Orchestrator};
pub use reconcile::{reconcile, Reconciliation};
pub use validate::validate;
