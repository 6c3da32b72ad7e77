//! Well-known SNOMED CT identifiers.
//!
//! Root and top-level hierarchies, relationship types, modules, the reference
//! sets the engine writes to, and the value sets used by inactivation
//! indicators and historical associations.
//!
//! # Examples
//!
//! ```
//! use snomed_model::well_known;
//!
//! assert_eq!(well_known::IS_A, 116680003);
//! assert_eq!(well_known::BODY_STRUCTURE, 123037004);
//! ```

use crate::SctId;

// =============================================================================
// Root Concepts
// =============================================================================

/// SNOMED CT root concept (138875005).
///
/// The single root of the entire SNOMED CT hierarchy.
pub const SNOMED_CT_ROOT: SctId = 138875005;

// =============================================================================
// Top-Level Hierarchies
// =============================================================================

/// Clinical finding (finding) - 404684003.
pub const CLINICAL_FINDING: SctId = 404684003;

/// Procedure (procedure) - 71388002.
pub const PROCEDURE: SctId = 71388002;

/// Body structure (body structure) - 123037004.
pub const BODY_STRUCTURE: SctId = 123037004;

/// Substance (substance) - 105590001.
pub const SUBSTANCE: SctId = 105590001;

/// Pharmaceutical/biologic product - 373873005.
pub const PHARMACEUTICAL_PRODUCT: SctId = 373873005;

/// Qualifier value - 362981000.
pub const QUALIFIER_VALUE: SctId = 362981000;

// =============================================================================
// Relationship Types
// =============================================================================

/// IS_A relationship type - 116680003.
///
/// Defines the taxonomic (hierarchical) relationships between concepts.
pub const IS_A: SctId = 116680003;

/// Finding site attribute - 363698007.
pub const FINDING_SITE: SctId = 363698007;

/// Associated morphology attribute - 116676008.
pub const ASSOCIATED_MORPHOLOGY: SctId = 116676008;

/// Laterality attribute - 272741003.
pub const LATERALITY: SctId = 272741003;

/// All or part of - 733928003.
pub const ALL_OR_PART_OF: SctId = 733928003;

// =============================================================================
// Modules
// =============================================================================

/// SNOMED CT core module - 900000000000207008.
pub const SNOMED_CT_CORE_MODULE: SctId = 900000000000207008;

/// SNOMED CT model component module - 900000000000012004.
pub const SNOMED_CT_MODEL_COMPONENT_MODULE: SctId = 900000000000012004;

/// Module dependency reference set - 900000000000534007.
pub const MODULE_DEPENDENCY_REFSET: SctId = 900000000000534007;

// =============================================================================
// Language Reference Sets
// =============================================================================

/// US English language reference set - 900000000000509007.
pub const US_ENGLISH_REFSET: SctId = 900000000000509007;

/// GB English language reference set - 900000000000508004.
pub const GB_ENGLISH_REFSET: SctId = 900000000000508004;

// =============================================================================
// Inactivation Indicators
// =============================================================================

/// Concept inactivation indicator reference set - 900000000000489007.
pub const CONCEPT_INACTIVATION_REFSET: SctId = 900000000000489007;

/// Description inactivation indicator reference set - 900000000000490003.
pub const DESCRIPTION_INACTIVATION_REFSET: SctId = 900000000000490003;

/// Duplicate component - 900000000000482003.
pub const REASON_DUPLICATE: SctId = 900000000000482003;

/// Outdated component - 900000000000483008.
pub const REASON_OUTDATED: SctId = 900000000000483008;

/// Ambiguous component - 900000000000484002.
pub const REASON_AMBIGUOUS: SctId = 900000000000484002;

/// Erroneous component - 900000000000485001.
pub const REASON_ERRONEOUS: SctId = 900000000000485001;

/// Limited component - 900000000000486000.
pub const REASON_LIMITED: SctId = 900000000000486000;

/// Component moved elsewhere - 900000000000487009.
pub const REASON_MOVED_ELSEWHERE: SctId = 900000000000487009;

/// Pending move - 900000000000492006.
pub const REASON_PENDING_MOVE: SctId = 900000000000492006;

/// Non-conformance to editorial policy - 723277005.
pub const REASON_NON_CONFORMANCE: SctId = 723277005;

/// Concept non-current (description indicator) - 900000000000495008.
pub const REASON_CONCEPT_NON_CURRENT: SctId = 900000000000495008;

// =============================================================================
// Historical Associations
// =============================================================================

/// SAME AS association reference set - 900000000000527005.
pub const SAME_AS: SctId = 900000000000527005;

/// REPLACED BY association reference set - 900000000000526001.
pub const REPLACED_BY: SctId = 900000000000526001;

/// POSSIBLY EQUIVALENT TO association reference set - 900000000000523009.
pub const POSSIBLY_EQUIVALENT_TO: SctId = 900000000000523009;

/// WAS A association reference set - 900000000000528000.
pub const WAS_A: SctId = 900000000000528000;

/// MOVED TO association reference set - 900000000000524003.
pub const MOVED_TO: SctId = 900000000000524003;

/// ALTERNATIVE association reference set - 900000000000530003.
pub const ALTERNATIVE: SctId = 900000000000530003;

/// REFERS TO concept association reference set - 900000000000531004.
pub const REFERS_TO: SctId = 900000000000531004;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_constants() {
        assert_eq!(SNOMED_CT_ROOT, 138875005);
        assert_eq!(IS_A, 116680003);
        assert_eq!(SNOMED_CT_CORE_MODULE, 900000000000207008);
        assert_eq!(US_ENGLISH_REFSET, 900000000000509007);
    }

    #[test]
    fn test_association_ids_are_different() {
        let associations = [
            SAME_AS,
            REPLACED_BY,
            POSSIBLY_EQUIVALENT_TO,
            WAS_A,
            MOVED_TO,
            ALTERNATIVE,
            REFERS_TO,
        ];

        for (i, id1) in associations.iter().enumerate() {
            for (j, id2) in associations.iter().enumerate() {
                if i != j {
                    assert_ne!(id1, id2, "Duplicate association refset id");
                }
            }
        }
    }
}
