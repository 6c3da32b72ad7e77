//! Configuration for writers, alignment checks, primitive inference and
//! template instantiation.

use snomed_model::{well_known, CharacteristicType, SctId};

/// Settings for RF2 package generation.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Edition code in file names (e.g., `INT`).
    pub edition: String,
    /// Language code in description and language refset file names.
    pub language_code: String,
    /// Release date in file names, `YYYYMMDD`.
    pub release_date: u32,
    /// Effective time written into the deleted half of negative delta rows.
    /// Defaults to the release date.
    pub deletion_effective_time: Option<u32>,
}

impl ExportConfig {
    /// International edition, English, for the given release date.
    pub fn new(release_date: u32) -> Self {
        Self {
            edition: "INT".to_string(),
            language_code: "en".to_string(),
            release_date,
            deletion_effective_time: None,
        }
    }

    /// Sets the edition code.
    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = edition.into();
        self
    }

    /// Sets the language code.
    pub fn with_language(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = language_code.into();
        self
    }

    /// Effective time used for deletion rows.
    pub fn deletion_date(&self) -> u32 {
        self.deletion_effective_time.unwrap_or(self.release_date)
    }
}

/// Settings for module and language refset alignment.
#[derive(Debug, Clone)]
pub struct AlignmentConfig {
    /// Components in these modules are never reported.
    pub exempt_modules: Vec<SctId>,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            exempt_modules: vec![well_known::SNOMED_CT_CORE_MODULE],
        }
    }
}

/// Settings for proximal primitive parent inference.
#[derive(Debug, Clone)]
pub struct PrimitiveConfig {
    /// Hierarchy the inference walks.
    pub characteristic_type: CharacteristicType,
    /// Primitive ancestors that never make a concept an intermediate primitive.
    pub exempt_ancestors: Vec<SctId>,
}

impl Default for PrimitiveConfig {
    fn default() -> Self {
        Self {
            characteristic_type: CharacteristicType::Stated,
            exempt_ancestors: vec![well_known::SNOMED_CT_ROOT],
        }
    }
}

/// Settings for concepts synthesized from creation patterns.
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// Module of new components.
    pub module_id: SctId,
    /// Language refsets in which new terms are preferred.
    pub language_refsets: Vec<SctId>,
    /// Namespace for new identifiers, `None` for core identifiers.
    pub namespace: Option<u32>,
    /// First item identifier tried by the id generator.
    pub first_item: u64,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            module_id: well_known::SNOMED_CT_CORE_MODULE,
            language_refsets: vec![well_known::US_ENGLISH_REFSET, well_known::GB_ENGLISH_REFSET],
            namespace: None,
            first_item: 1,
        }
    }
}
