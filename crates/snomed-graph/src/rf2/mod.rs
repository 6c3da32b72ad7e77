//! RF2 exchange format.
//!
//! - [`package`] finds and classifies the files of a release
//! - [`parser`] streams rows out of one file
//! - [`records`] maps rows onto model components
//! - [`writer`] writes snapshot, delta and negative delta packages

pub mod package;
pub mod parser;
pub mod records;
pub mod writer;

pub use package::{classify_file_name, extract_release_date, ReleaseType, Rf2FileKind, Rf2Package, Rf2Source};
pub use parser::{for_each_row, parse, Rf2Parser, Rf2Record};
pub use records::{ConcreteRelationshipRow, ModuleDependencyRow};
pub use writer::{file_name, subdirectory, ExportMode, GeneratedFile, GenerationReport, Rf2Exporter};
