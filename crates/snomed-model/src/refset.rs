//! Reference set members.
//!
//! Members point at the component they annotate by id only. Three families
//! are modelled:
//!
//! - **Language** entries give a description its acceptability in a dialect
//! - **Attribute value** entries record why a component was inactivated
//! - **Association** entries link an inactive component to its replacements
//!
//! # Example
//!
//! ```
//! use snomed_model::{Acceptability, Component, LangRefsetEntry, well_known};
//!
//! let entry = LangRefsetEntry::new(
//!     well_known::US_ENGLISH_REFSET,
//!     754786011,
//!     Acceptability::Preferred,
//!     well_known::SNOMED_CT_CORE_MODULE,
//! );
//!
//! assert!(entry.is_active_safely());
//! assert_eq!(entry.to_exchange_row()[6], "900000000000548007");
//! ```

use uuid::Uuid;

use crate::{Acceptability, Component, ComponentCore, ComponentId, ComponentType, SctId};

/// Fields shared by every reference set member.
pub trait RefsetEntry: Component {
    /// Member UUID.
    fn member_id(&self) -> Uuid;
    /// Reference set this member belongs to.
    fn refset_id(&self) -> SctId;
    /// Component this member annotates.
    fn referenced_component_id(&self) -> SctId;
}

/// A language reference set member.
///
/// # RF2 Columns
///
/// | Column | Type | Description |
/// |--------|------|-------------|
/// | refsetId | SCTID | The language reference set (e.g., US English, GB English) |
/// | referencedComponentId | SCTID | The description ID |
/// | acceptabilityId | SCTID | Preferred or Acceptable |
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LangRefsetEntry {
    id: Uuid,
    core: ComponentCore,
    refset_id: SctId,
    referenced_component_id: SctId,
    acceptability: Acceptability,
}

impl LangRefsetEntry {
    /// Creates a new, unpublished entry with a random member id.
    pub fn new(
        refset_id: SctId,
        description_id: SctId,
        acceptability: Acceptability,
        module_id: SctId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            core: ComponentCore::new(module_id),
            refset_id,
            referenced_component_id: description_id,
            acceptability,
        }
    }

    /// Rebuilds an entry from stored state.
    pub fn from_parts(
        id: Uuid,
        core: ComponentCore,
        refset_id: SctId,
        description_id: SctId,
        acceptability: Acceptability,
    ) -> Self {
        Self {
            id,
            core,
            refset_id,
            referenced_component_id: description_id,
            acceptability,
        }
    }

    /// Acceptability in this dialect.
    pub fn acceptability(&self) -> Acceptability {
        self.acceptability
    }

    /// Changes the acceptability.
    pub fn set_acceptability(&mut self, acceptability: Acceptability) {
        let changed = self.acceptability != acceptability;
        self.acceptability = acceptability;
        self.core.touch(changed);
    }
}

/// An inactivation indicator (attribute value) reference set member.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InactivationIndicatorEntry {
    id: Uuid,
    core: ComponentCore,
    refset_id: SctId,
    referenced_component_id: SctId,
    reason_id: SctId,
}

impl InactivationIndicatorEntry {
    /// Creates a new, unpublished indicator with a random member id.
    pub fn new(refset_id: SctId, component_id: SctId, reason_id: SctId, module_id: SctId) -> Self {
        Self {
            id: Uuid::new_v4(),
            core: ComponentCore::new(module_id),
            refset_id,
            referenced_component_id: component_id,
            reason_id,
        }
    }

    /// Rebuilds an indicator from stored state.
    pub fn from_parts(
        id: Uuid,
        core: ComponentCore,
        refset_id: SctId,
        component_id: SctId,
        reason_id: SctId,
    ) -> Self {
        Self {
            id,
            core,
            refset_id,
            referenced_component_id: component_id,
            reason_id,
        }
    }

    /// Inactivation reason (`valueId`).
    pub fn reason_id(&self) -> SctId {
        self.reason_id
    }

    /// Changes the inactivation reason.
    pub fn set_reason_id(&mut self, reason_id: SctId) {
        let changed = self.reason_id != reason_id;
        self.reason_id = reason_id;
        self.core.touch(changed);
    }
}

/// A historical association reference set member.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoricalAssociation {
    id: Uuid,
    core: ComponentCore,
    refset_id: SctId,
    referenced_component_id: SctId,
    target_component_id: SctId,
}

impl HistoricalAssociation {
    /// Creates a new, unpublished association with a random member id.
    pub fn new(refset_id: SctId, component_id: SctId, target_id: SctId, module_id: SctId) -> Self {
        Self {
            id: Uuid::new_v4(),
            core: ComponentCore::new(module_id),
            refset_id,
            referenced_component_id: component_id,
            target_component_id: target_id,
        }
    }

    /// Rebuilds an association from stored state.
    pub fn from_parts(
        id: Uuid,
        core: ComponentCore,
        refset_id: SctId,
        component_id: SctId,
        target_id: SctId,
    ) -> Self {
        Self {
            id,
            core,
            refset_id,
            referenced_component_id: component_id,
            target_component_id: target_id,
        }
    }

    /// The replacement component.
    pub fn target_component_id(&self) -> SctId {
        self.target_component_id
    }

    /// Changes the target.
    pub fn set_target_component_id(&mut self, target_id: SctId) {
        let changed = self.target_component_id != target_id;
        self.target_component_id = target_id;
        self.core.touch(changed);
    }
}

macro_rules! impl_refset_entry {
    ($ty:ty, $component_type:expr, $payload:ident) => {
        impl Component for $ty {
            fn component_id(&self) -> ComponentId {
                ComponentId::Member(self.id)
            }

            fn core(&self) -> &ComponentCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut ComponentCore {
                &mut self.core
            }

            fn component_type(&self) -> ComponentType {
                $component_type
            }

            fn to_exchange_row(&self) -> Vec<String> {
                let mut row = self.base_fields();
                row.push(self.refset_id.to_string());
                row.push(self.referenced_component_id.to_string());
                row.push(self.$payload().to_string());
                row
            }
        }

        impl RefsetEntry for $ty {
            fn member_id(&self) -> Uuid {
                self.id
            }

            fn refset_id(&self) -> SctId {
                self.refset_id
            }

            fn referenced_component_id(&self) -> SctId {
                self.referenced_component_id
            }
        }
    };
}

impl LangRefsetEntry {
    fn acceptability_id(&self) -> SctId {
        self.acceptability.to_id()
    }
}

impl_refset_entry!(LangRefsetEntry, ComponentType::LanguageRefset, acceptability_id);
impl_refset_entry!(InactivationIndicatorEntry, ComponentType::AttributeValue, reason_id);
impl_refset_entry!(HistoricalAssociation, ComponentType::Association, target_component_id);

/// Any reference set member, used where the family is only known at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefsetMember {
    /// Language entry.
    Language(LangRefsetEntry),
    /// Inactivation indicator.
    InactivationIndicator(InactivationIndicatorEntry),
    /// Historical association.
    Association(HistoricalAssociation),
}

impl RefsetMember {
    fn inner(&self) -> &dyn RefsetEntry {
        match self {
            RefsetMember::Language(m) => m,
            RefsetMember::InactivationIndicator(m) => m,
            RefsetMember::Association(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn RefsetEntry {
        match self {
            RefsetMember::Language(m) => m,
            RefsetMember::InactivationIndicator(m) => m,
            RefsetMember::Association(m) => m,
        }
    }

    /// Member UUID.
    pub fn member_id(&self) -> Uuid {
        self.inner().member_id()
    }

    /// Reference set this member belongs to.
    pub fn refset_id(&self) -> SctId {
        self.inner().refset_id()
    }

    /// Component this member annotates.
    pub fn referenced_component_id(&self) -> SctId {
        self.inner().referenced_component_id()
    }
}

impl Component for RefsetMember {
    fn component_id(&self) -> ComponentId {
        self.inner().component_id()
    }

    fn core(&self) -> &ComponentCore {
        self.inner().core()
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        self.inner_mut().core_mut()
    }

    fn component_type(&self) -> ComponentType {
        self.inner().component_type()
    }

    fn to_exchange_row(&self) -> Vec<String> {
        self.inner().to_exchange_row()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well_known;

    #[test]
    fn test_lang_entry_row() {
        let entry = LangRefsetEntry::new(
            well_known::GB_ENGLISH_REFSET,
            754786011,
            Acceptability::Acceptable,
            well_known::SNOMED_CT_CORE_MODULE,
        );
        let row = entry.to_exchange_row();
        assert_eq!(row.len(), ComponentType::LanguageRefset.columns().len());
        assert_eq!(row[0], entry.member_id().to_string());
        assert_eq!(row[1], "");
        assert_eq!(row[2], "1");
        assert_eq!(row[4], "900000000000508004");
        assert_eq!(row[5], "754786011");
        assert_eq!(row[6], "900000000000549004");
    }

    #[test]
    fn test_set_reason_marks_dirty_and_unpublishes() {
        let id = Uuid::new_v4();
        let core = ComponentCore::loaded(well_known::SNOMED_CT_CORE_MODULE, Some(20200131), Some(true));
        let mut indicator = InactivationIndicatorEntry::from_parts(
            id,
            core,
            well_known::CONCEPT_INACTIVATION_REFSET,
            404684003,
            well_known::REASON_OUTDATED,
        );
        assert!(!indicator.core().is_dirty());

        indicator.set_reason_id(well_known::REASON_DUPLICATE);
        assert!(indicator.core().is_dirty());
        assert_eq!(indicator.core().effective_time(), None);
        assert_eq!(indicator.to_exchange_row()[6], "900000000000482003");
    }

    #[test]
    fn test_refset_member_delegates() {
        let assoc = HistoricalAssociation::new(well_known::SAME_AS, 1001, 2002, 3003);
        let member = RefsetMember::Association(assoc.clone());
        assert_eq!(member.refset_id(), well_known::SAME_AS);
        assert_eq!(member.referenced_component_id(), 1001);
        assert_eq!(member.component_type(), ComponentType::Association);
        assert_eq!(member.to_exchange_row(), assoc.to_exchange_row());
    }

    #[test]
    fn test_deletion_row_pairs_fields() {
        let assoc = HistoricalAssociation::new(well_known::REPLACED_BY, 1001, 2002, 3003);
        let row = assoc.to_deletion_row(20250301);
        assert_eq!(row.len(), 14);
        assert_eq!(row[0], row[7]);
        assert_eq!(row[2], "1");
        assert_eq!(row[8], "20250301");
        assert_eq!(row[9], "0");
        assert_eq!(row[13], "2002");
    }
}
