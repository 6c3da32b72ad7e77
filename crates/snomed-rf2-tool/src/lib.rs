//! RF2 release tooling.
//!
//! Loads a SNOMED CT package, optionally with a working delta on top,
//! reports and repairs module alignment defects, and writes delta, negative
//! delta and snapshot packages. Configuration comes from `SNOMED_*`
//! environment variables, see [`ToolConfig`].

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::ToolConfig;
pub use error::{ToolError, ToolResult};
pub use pipeline::{run, RunSummary};
