//! # snomed-model
//!
//! Versioned component model for SNOMED CT terminology graphs.
//!
//! Every entity (concept, description, relationship, reference set member)
//! carries a [`ComponentCore`] with its module, effective time and active
//! flag, plus the dirty and deletion markers that decide what an RF2 writer
//! emits. Mutation goes through setters so a changed component is always
//! marked dirty.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!
//! ## Usage
//!
//! ```rust
//! use snomed_model::{CaseSignificance, Component, Concept, DefinitionStatus, Description, DescriptionType};
//! use snomed_model::well_known;
//!
//! let mut concept = Concept::new(73211009, well_known::SNOMED_CT_CORE_MODULE, DefinitionStatus::Primitive);
//! concept.add_description(Description::new(
//!     754786011,
//!     73211009,
//!     "Diabetes mellitus (disorder)",
//!     DescriptionType::Fsn,
//!     CaseSignificance::CaseInsensitive,
//!     well_known::SNOMED_CT_CORE_MODULE,
//! ));
//!
//! assert!(concept.core().is_dirty());
//! assert_eq!(concept.semantic_tag(), Some("disorder"));
//! assert_eq!(concept.to_exchange_row()[4], "900000000000074008");
//! ```

#![warn(missing_docs)]

mod component;
mod concept;
mod description;
mod enums;
pub mod refset;
mod relationship;
mod sctid;
pub mod well_known;

// Re-export all public types at crate root
pub use component::{
    format_active, format_effective_time, Component, ComponentCore, ComponentType,
    ASSOCIATION_COLUMNS, ATTRIBUTE_VALUE_COLUMNS, BASE_COLUMNS, CONCEPT_COLUMNS,
    CONCRETE_RELATIONSHIP_COLUMNS, DESCRIPTION_COLUMNS, LANGUAGE_REFSET_COLUMNS,
    MODULE_DEPENDENCY_COLUMNS, RELATIONSHIP_COLUMNS,
};
pub use concept::Concept;
pub use description::Description;
pub use enums::{
    Acceptability, CaseSignificance, CharacteristicType, DefinitionStatus, DescriptionType,
    ModifierType, SubclassDefinitionStatus,
};
pub use refset::{
    HistoricalAssociation, InactivationIndicatorEntry, LangRefsetEntry, RefsetEntry, RefsetMember,
};
pub use relationship::{ConcreteValue, Relationship, RelationshipTarget};
pub use sctid::{is_valid_sctid, verhoeff_check_digit, ComponentId, Partition, SctId, SctIdGenerator};
