//! Versioned component state shared by every entity type.
//!
//! A [`ComponentCore`] holds the identity-independent RF2 attributes (module,
//! effective time, active flag) together with the bookkeeping flags the codec
//! relies on: `released`, `persisted`, `dirty` and `deleted`. All writes go
//! through setters that mark the component dirty.

use crate::{ComponentId, SctId};

/// RF2 columns common to every file, in order.
pub const BASE_COLUMNS: [&str; 4] = ["id", "effectiveTime", "active", "moduleId"];

/// Attribute state shared by all versioned components.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentCore {
    module_id: SctId,
    effective_time: Option<u32>,
    active: Option<bool>,
    released: bool,
    persisted: bool,
    dirty: bool,
    deleted: bool,
}

impl ComponentCore {
    /// State for a component synthesized in memory: active, dirty, unpublished.
    pub fn new(module_id: SctId) -> Self {
        Self {
            module_id,
            effective_time: None,
            active: Some(true),
            released: false,
            persisted: false,
            dirty: true,
            deleted: false,
        }
    }

    /// State for a component read from an input package.
    ///
    /// A component with an effective time has been published and is therefore
    /// released.
    pub fn loaded(module_id: SctId, effective_time: Option<u32>, active: Option<bool>) -> Self {
        Self {
            module_id,
            effective_time,
            active,
            released: effective_time.is_some(),
            persisted: true,
            dirty: false,
            deleted: false,
        }
    }

    /// Adjusts a freshly parsed row that came from a delta file.
    ///
    /// Delta rows are changes relative to the base snapshot, so they stay
    /// dirty. Released status carries over from the version they replace.
    pub fn apply_delta(&mut self, previously_released: bool) {
        self.dirty = true;
        self.released = previously_released || self.effective_time.is_some();
    }

    /// Module that owns this component.
    pub fn module_id(&self) -> SctId {
        self.module_id
    }

    /// Effective time as `YYYYMMDD`, `None` while unpublished.
    pub fn effective_time(&self) -> Option<u32> {
        self.effective_time
    }

    /// Active flag as loaded. `None` when the input did not say.
    pub fn active(&self) -> Option<bool> {
        self.active
    }

    /// Returns the active flag, treating unknown as inactive.
    pub fn is_active_safely(&self) -> bool {
        self.active.unwrap_or(false)
    }

    /// Whether this component has appeared in a published release.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Whether this component was read from an input package rather than
    /// synthesized during this pass.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Whether this component changed since it was loaded.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether this component carries a deletion marker.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Sets the module. A changed value makes the component unpublished.
    pub fn set_module_id(&mut self, module_id: SctId) {
        if self.module_id != module_id {
            self.module_id = module_id;
            self.effective_time = None;
        }
        self.dirty = true;
    }

    /// Sets the active flag. A changed value makes the component unpublished.
    pub fn set_active(&mut self, active: bool) {
        if self.active != Some(active) {
            self.active = Some(active);
            self.effective_time = None;
        }
        self.dirty = true;
    }

    /// Overrides the effective time.
    pub fn set_effective_time(&mut self, effective_time: Option<u32>) {
        self.effective_time = effective_time;
        if effective_time.is_some() {
            self.released = true;
        }
        self.dirty = true;
    }

    /// Records a change to a type-specific field.
    ///
    /// `changed` is false when the new value equals the old one; the
    /// component is still marked dirty but keeps its effective time.
    pub fn touch(&mut self, changed: bool) {
        if changed {
            self.effective_time = None;
        }
        self.dirty = true;
    }

    /// Marks the component dirty without changing any value.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Sets the deletion marker.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
        self.dirty = true;
    }

    /// Clears the dirty flag, typically after a successful write.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// The RF2 file family a component is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComponentType {
    /// `sct2_Concept_`
    Concept,
    /// `sct2_Description_`
    Description,
    /// `sct2_TextDefinition_`
    TextDefinition,
    /// `sct2_Relationship_` (inferred and additional)
    InferredRelationship,
    /// `sct2_StatedRelationship_`
    StatedRelationship,
    /// `sct2_RelationshipConcreteValues_`
    ConcreteRelationship,
    /// `der2_cRefset_Language`
    LanguageRefset,
    /// `der2_cRefset_AttributeValue` (inactivation indicators)
    AttributeValue,
    /// `der2_cRefset_Association` (historical associations)
    Association,
}

impl ComponentType {
    /// Every type in output order.
    pub const ALL: [ComponentType; 9] = [
        ComponentType::Concept,
        ComponentType::Description,
        ComponentType::TextDefinition,
        ComponentType::InferredRelationship,
        ComponentType::StatedRelationship,
        ComponentType::ConcreteRelationship,
        ComponentType::LanguageRefset,
        ComponentType::AttributeValue,
        ComponentType::Association,
    ];

    /// Header row of the RF2 file for this type.
    ///
    /// # Examples
    ///
    /// ```
    /// use snomed_model::ComponentType;
    ///
    /// assert_eq!(
    ///     ComponentType::Concept.columns(),
    ///     &["id", "effectiveTime", "active", "moduleId", "definitionStatusId"]
    /// );
    /// ```
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            ComponentType::Concept => &CONCEPT_COLUMNS,
            ComponentType::Description | ComponentType::TextDefinition => &DESCRIPTION_COLUMNS,
            ComponentType::InferredRelationship | ComponentType::StatedRelationship => {
                &RELATIONSHIP_COLUMNS
            }
            ComponentType::ConcreteRelationship => &CONCRETE_RELATIONSHIP_COLUMNS,
            ComponentType::LanguageRefset => &LANGUAGE_REFSET_COLUMNS,
            ComponentType::AttributeValue => &ATTRIBUTE_VALUE_COLUMNS,
            ComponentType::Association => &ASSOCIATION_COLUMNS,
        }
    }

    /// Header row for the paired before/after layout of deletion files.
    ///
    /// The second half repeats every column with a `deleted` prefix.
    pub fn deletion_columns(self) -> Vec<String> {
        let columns = self.columns();
        let mut header: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        header.extend(columns.iter().map(|c| deleted_column_name(c)));
        header
    }

    /// True for the reference set families.
    pub fn is_refset(self) -> bool {
        matches!(
            self,
            ComponentType::LanguageRefset | ComponentType::AttributeValue | ComponentType::Association
        )
    }
}

fn deleted_column_name(column: &str) -> String {
    let mut chars = column.chars();
    match chars.next() {
        Some(first) => format!("deleted{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "deleted".to_string(),
    }
}

/// Concept file columns.
pub const CONCEPT_COLUMNS: [&str; 5] = ["id", "effectiveTime", "active", "moduleId", "definitionStatusId"];

/// Description and text definition file columns.
pub const DESCRIPTION_COLUMNS: [&str; 9] = [
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "conceptId",
    "languageCode",
    "typeId",
    "term",
    "caseSignificanceId",
];

/// Relationship and stated relationship file columns.
pub const RELATIONSHIP_COLUMNS: [&str; 10] = [
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "sourceId",
    "destinationId",
    "relationshipGroup",
    "typeId",
    "characteristicTypeId",
    "modifierId",
];

/// Concrete value relationship file columns.
pub const CONCRETE_RELATIONSHIP_COLUMNS: [&str; 10] = [
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "sourceId",
    "value",
    "relationshipGroup",
    "typeId",
    "characteristicTypeId",
    "modifierId",
];

/// Language reference set file columns.
pub const LANGUAGE_REFSET_COLUMNS: [&str; 7] = [
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "refsetId",
    "referencedComponentId",
    "acceptabilityId",
];

/// Attribute value reference set file columns.
pub const ATTRIBUTE_VALUE_COLUMNS: [&str; 7] = [
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "refsetId",
    "referencedComponentId",
    "valueId",
];

/// Association reference set file columns.
pub const ASSOCIATION_COLUMNS: [&str; 7] = [
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "refsetId",
    "referencedComponentId",
    "targetComponentId",
];

/// Module dependency reference set file columns.
pub const MODULE_DEPENDENCY_COLUMNS: [&str; 8] = [
    "id",
    "effectiveTime",
    "active",
    "moduleId",
    "refsetId",
    "referencedComponentId",
    "sourceEffectiveTime",
    "targetEffectiveTime",
];

/// Formats an effective time column. Unpublished components get an empty field.
pub fn format_effective_time(effective_time: Option<u32>) -> String {
    effective_time.map(|t| t.to_string()).unwrap_or_default()
}

/// Formats an active column as `"1"` or `"0"`.
pub fn format_active(active: bool) -> &'static str {
    if active {
        "1"
    } else {
        "0"
    }
}

/// A versioned component that can be written to an RF2 file.
pub trait Component {
    /// Identifier of this component.
    fn component_id(&self) -> ComponentId;

    /// Shared attribute state.
    fn core(&self) -> &ComponentCore;

    /// Mutable shared attribute state.
    fn core_mut(&mut self) -> &mut ComponentCore;

    /// File family this component is written to.
    fn component_type(&self) -> ComponentType;

    /// Fields in the column order of [`ComponentType::columns`].
    fn to_exchange_row(&self) -> Vec<String>;

    /// Paired row for deletion files: the current fields followed by the
    /// same fields as deleted, with the deletion date and an inactive flag.
    fn to_deletion_row(&self, deletion_effective_time: u32) -> Vec<String> {
        let before = self.to_exchange_row();
        let mut after = before.clone();
        if after.len() > 2 {
            after[1] = deletion_effective_time.to_string();
            after[2] = format_active(false).to_string();
        }
        let mut row = before;
        row.extend(after);
        row
    }

    /// Module that owns this component.
    fn module_id(&self) -> SctId {
        self.core().module_id()
    }

    /// Active flag with unknown treated as inactive.
    fn is_active_safely(&self) -> bool {
        self.core().is_active_safely()
    }

    /// The first four columns of every RF2 row.
    fn base_fields(&self) -> Vec<String> {
        let core = self.core();
        vec![
            self.component_id().to_string(),
            format_effective_time(core.effective_time()),
            format_active(core.is_active_safely()).to_string(),
            core.module_id().to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_component_is_dirty_and_unpublished() {
        let core = ComponentCore::new(900000000000207008);
        assert!(core.is_dirty());
        assert!(!core.is_released());
        assert!(!core.is_persisted());
        assert!(core.is_active_safely());
        assert_eq!(core.effective_time(), None);
    }

    #[test]
    fn test_unknown_active_is_inactive() {
        let core = ComponentCore::loaded(1, Some(20240101), None);
        assert!(!core.is_active_safely());
        assert!(core.is_released());
        assert!(!core.is_dirty());
    }

    #[test]
    fn test_setters_mark_dirty_and_clear_effective_time_on_change() {
        let mut core = ComponentCore::loaded(1, Some(20240101), Some(true));

        core.set_active(true);
        assert!(core.is_dirty());
        assert_eq!(core.effective_time(), Some(20240101));

        core.set_module_id(2);
        assert_eq!(core.module_id(), 2);
        assert_eq!(core.effective_time(), None);
        assert!(core.is_released());
    }

    #[test]
    fn test_apply_delta_keeps_released() {
        let mut core = ComponentCore::loaded(1, None, Some(true));
        assert!(!core.is_released());
        core.apply_delta(true);
        assert!(core.is_dirty());
        assert!(core.is_released());
    }

    #[test]
    fn test_deletion_columns() {
        let columns = ComponentType::LanguageRefset.deletion_columns();
        assert_eq!(columns.len(), 14);
        assert_eq!(columns[7], "deletedId");
        assert_eq!(columns[8], "deletedEffectiveTime");
        assert_eq!(columns[13], "deletedAcceptabilityId");
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_effective_time(None), "");
        assert_eq!(format_effective_time(Some(20250131)), "20250131");
        assert_eq!(format_active(true), "1");
        assert_eq!(format_active(false), "0");
    }
}
