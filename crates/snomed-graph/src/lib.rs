//! # snomed-graph
//!
//! In-memory SNOMED CT terminology graph.
//!
//! A [`GraphRegistry`] is loaded from one or more RF2 packages (a release
//! directory, a zip archive, or byte buffers), queried and edited in memory,
//! and written back out through [`rf2::Rf2Exporter`] as a snapshot, a delta,
//! or a negative delta for content that was never released.
//!
//! On top of the registry sit:
//!
//! - hierarchy traversal with memoized closures ([`Depth`])
//! - proximal primitive parent inference ([`ProximalPrimitiveReport`])
//! - the template engine that synthesizes concepts from a [`CreationPattern`]
//! - module and language refset alignment checks ([`detect_misalignments`])
//!
//! ## Features
//!
//! - `parallel` (default): renders output rows on the rayon thread pool.
//!
//! ## Usage
//!
//! ```ignore
//! use snomed_graph::{Depth, ExportConfig, GraphRegistry, Rf2Package};
//! use snomed_graph::rf2::Rf2Exporter;
//! use snomed_model::CharacteristicType;
//!
//! let registry = GraphRegistry::from_package(&Rf2Package::open("SnomedCT_InternationalRF2.zip")?)?;
//! let parents = registry.determine_proximal_primitive_parents(73211009)?;
//! let ancestors = registry.get_ancestors(73211009, CharacteristicType::Inferred, Depth::Transitive)?;
//!
//! Rf2Exporter::new(&registry, ExportConfig::new(20250731)).generate_delta("out")?;
//! ```

#![warn(missing_docs)]

pub mod alignment;
pub mod batch;
pub mod config;
pub mod error;
pub mod modules;
pub mod primitives;
pub mod registry;
pub mod rf2;
pub mod template;
pub mod traversal;

pub use alignment::{
    align_modules, detect_misalignments, repair_misalignments, AlignmentIssue, AlignmentRule,
    UnpromotedChanges,
};
pub use batch::{run_batch, BatchFailure, BatchOutcome};
pub use config::{AlignmentConfig, ExportConfig, PrimitiveConfig, TemplateConfig};
pub use error::{FieldError, GraphError, GraphResult};
pub use modules::ModuleDependencies;
pub use primitives::ProximalPrimitiveReport;
pub use registry::{GraphRegistry, GraphState, LoadStats};
pub use rf2::Rf2Package;
pub use template::{CreationPattern, PrototypeSet, TemplateEngine, YStrategy};
pub use traversal::Depth;

// Re-export the model for convenience
pub use snomed_model;
