//! Coded values carried by SNOMED CT components.
//!
//! Every enum here maps to and from the metadata concept that encodes it in
//! RF2 files, except [`SubclassDefinitionStatus`], which only exists while
//! authoring.

use crate::SctId;

/// Definition status for a SNOMED CT concept.
///
/// # Examples
///
/// ```
/// use snomed_model::DefinitionStatus;
///
/// let status = DefinitionStatus::from_id(900000000000074008);
/// assert_eq!(status, Some(DefinitionStatus::Primitive));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DefinitionStatus {
    /// Necessary conditions only.
    #[default]
    Primitive,
    /// Necessary and sufficient conditions.
    FullyDefined,
}

impl DefinitionStatus {
    /// SCTID for primitive definition status.
    pub const PRIMITIVE_ID: SctId = 900000000000074008;
    /// SCTID for fully defined definition status.
    pub const FULLY_DEFINED_ID: SctId = 900000000000073002;

    /// Creates a DefinitionStatus from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::PRIMITIVE_ID => Some(Self::Primitive),
            Self::FULLY_DEFINED_ID => Some(Self::FullyDefined),
            _ => None,
        }
    }

    /// Returns the SCTID for this definition status.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Primitive => Self::PRIMITIVE_ID,
            Self::FullyDefined => Self::FULLY_DEFINED_ID,
        }
    }
}

/// Whether the subclasses of a concept are declared disjoint.
///
/// Not part of the RF2 concept row; kept for authoring tools that set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubclassDefinitionStatus {
    /// Subclasses may overlap.
    #[default]
    NotDisjoint,
    /// Subclasses are pairwise disjoint.
    Disjoint,
}

/// Description type.
///
/// # Examples
///
/// ```
/// use snomed_model::DescriptionType;
///
/// assert_eq!(DescriptionType::from_id(900000000000003001), Some(DescriptionType::Fsn));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptionType {
    /// Fully Specified Name, carries the semantic tag.
    Fsn,
    /// Synonym.
    Synonym,
    /// Text definition, written to the TextDefinition file.
    TextDefinition,
}

impl DescriptionType {
    /// SCTID for Fully Specified Name type.
    pub const FSN_ID: SctId = 900000000000003001;
    /// SCTID for Synonym type.
    pub const SYNONYM_ID: SctId = 900000000000013009;
    /// SCTID for Definition type.
    pub const DEFINITION_ID: SctId = 900000000000550004;

    /// Creates a DescriptionType from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::FSN_ID => Some(Self::Fsn),
            Self::SYNONYM_ID => Some(Self::Synonym),
            Self::DEFINITION_ID => Some(Self::TextDefinition),
            _ => None,
        }
    }

    /// Returns the SCTID for this description type.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Fsn => Self::FSN_ID,
            Self::Synonym => Self::SYNONYM_ID,
            Self::TextDefinition => Self::DEFINITION_ID,
        }
    }
}

/// Case significance of a description term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaseSignificance {
    /// Entire term is case insensitive.
    #[default]
    CaseInsensitive,
    /// Entire term is case sensitive.
    EntireTermCaseSensitive,
    /// Only the initial character is case insensitive.
    InitialCharacterCaseInsensitive,
}

impl CaseSignificance {
    /// SCTID for case insensitive.
    pub const CASE_INSENSITIVE_ID: SctId = 900000000000448009;
    /// SCTID for entire term case sensitive.
    pub const ENTIRE_TERM_CASE_SENSITIVE_ID: SctId = 900000000000017005;
    /// SCTID for initial character case insensitive.
    pub const INITIAL_CHAR_CASE_INSENSITIVE_ID: SctId = 900000000000020002;

    /// Creates a CaseSignificance from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::CASE_INSENSITIVE_ID => Some(Self::CaseInsensitive),
            Self::ENTIRE_TERM_CASE_SENSITIVE_ID => Some(Self::EntireTermCaseSensitive),
            Self::INITIAL_CHAR_CASE_INSENSITIVE_ID => Some(Self::InitialCharacterCaseInsensitive),
            _ => None,
        }
    }

    /// Returns the SCTID for this case significance.
    pub fn to_id(self) -> SctId {
        match self {
            Self::CaseInsensitive => Self::CASE_INSENSITIVE_ID,
            Self::EntireTermCaseSensitive => Self::ENTIRE_TERM_CASE_SENSITIVE_ID,
            Self::InitialCharacterCaseInsensitive => Self::INITIAL_CHAR_CASE_INSENSITIVE_ID,
        }
    }

    /// True if the first character of the term must keep its case.
    pub fn is_initial_case_sensitive(self) -> bool {
        matches!(self, Self::EntireTermCaseSensitive)
    }
}

/// Provenance of a relationship.
///
/// # Examples
///
/// ```
/// use snomed_model::CharacteristicType;
///
/// let char_type = CharacteristicType::from_id(900000000000011006);
/// assert_eq!(char_type, Some(CharacteristicType::Inferred));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CharacteristicType {
    /// Asserted by an author.
    Stated,
    /// Computed by a classifier.
    Inferred,
    /// Additional, non-defining relationship.
    Additional,
}

impl CharacteristicType {
    /// SCTID for stated relationship.
    pub const STATED_ID: SctId = 900000000000010007;
    /// SCTID for inferred relationship.
    pub const INFERRED_ID: SctId = 900000000000011006;
    /// SCTID for additional relationship.
    pub const ADDITIONAL_ID: SctId = 900000000000227009;

    /// Creates a CharacteristicType from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::STATED_ID => Some(Self::Stated),
            Self::INFERRED_ID => Some(Self::Inferred),
            Self::ADDITIONAL_ID => Some(Self::Additional),
            _ => None,
        }
    }

    /// Returns the SCTID for this characteristic type.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Stated => Self::STATED_ID,
            Self::Inferred => Self::INFERRED_ID,
            Self::Additional => Self::ADDITIONAL_ID,
        }
    }
}

/// Relationship modifier (quantifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierType {
    /// Existential (some).
    #[default]
    Existential,
    /// Universal (all).
    Universal,
}

impl ModifierType {
    /// SCTID for existential (some) modifier.
    pub const EXISTENTIAL_ID: SctId = 900000000000451002;
    /// SCTID for universal (all) modifier.
    pub const UNIVERSAL_ID: SctId = 900000000000450001;

    /// Creates a ModifierType from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::EXISTENTIAL_ID => Some(Self::Existential),
            Self::UNIVERSAL_ID => Some(Self::Universal),
            _ => None,
        }
    }

    /// Returns the SCTID for this modifier type.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Existential => Self::EXISTENTIAL_ID,
            Self::Universal => Self::UNIVERSAL_ID,
        }
    }
}

/// Acceptability of a description in a language reference set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Acceptability {
    /// Preferred term in the dialect.
    Preferred,
    /// Acceptable term in the dialect.
    Acceptable,
}

impl Acceptability {
    /// SCTID for preferred acceptability.
    pub const PREFERRED_ID: SctId = 900000000000548007;
    /// SCTID for acceptable acceptability.
    pub const ACCEPTABLE_ID: SctId = 900000000000549004;

    /// Creates an Acceptability from its SCTID.
    pub fn from_id(id: SctId) -> Option<Self> {
        match id {
            Self::PREFERRED_ID => Some(Self::Preferred),
            Self::ACCEPTABLE_ID => Some(Self::Acceptable),
            _ => None,
        }
    }

    /// Returns the SCTID for this acceptability.
    pub fn to_id(self) -> SctId {
        match self {
            Self::Preferred => Self::PREFERRED_ID,
            Self::Acceptable => Self::ACCEPTABLE_ID,
        }
    }
}
