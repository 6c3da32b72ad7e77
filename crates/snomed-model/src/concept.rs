//! Concepts and the components they own.

use std::collections::BTreeMap;

use crate::description::put_by_member_id;
use crate::{
    well_known, CharacteristicType, Component, ComponentCore, ComponentId, ComponentType,
    DefinitionStatus, Description, HistoricalAssociation, InactivationIndicatorEntry,
    Relationship, RefsetEntry, SctId, SubclassDefinitionStatus,
};

/// A concept together with its descriptions, relationships and the
/// reference set members that annotate it.
///
/// # Examples
///
/// ```
/// use snomed_model::{CharacteristicType, Concept, DefinitionStatus, Relationship, well_known};
///
/// let mut concept = Concept::new(39937001, well_known::SNOMED_CT_CORE_MODULE, DefinitionStatus::Primitive);
/// concept.add_relationship(Relationship::is_a(
///     100000028,
///     39937001,
///     well_known::BODY_STRUCTURE,
///     CharacteristicType::Stated,
///     well_known::SNOMED_CT_CORE_MODULE,
/// ));
///
/// assert!(concept.is_primitive());
/// assert_eq!(concept.parent_ids(CharacteristicType::Stated), vec![well_known::BODY_STRUCTURE]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Concept {
    id: SctId,
    core: ComponentCore,
    definition_status: DefinitionStatus,
    subclass_definition_status: SubclassDefinitionStatus,
    descriptions: Vec<Description>,
    relationships: Vec<Relationship>,
    inactivation_indicators: Vec<InactivationIndicatorEntry>,
    associations: Vec<HistoricalAssociation>,
}

impl Concept {
    /// Creates a new, unpublished concept with no descriptions or relationships.
    pub fn new(id: SctId, module_id: SctId, definition_status: DefinitionStatus) -> Self {
        Self::from_parts(id, ComponentCore::new(module_id), definition_status)
    }

    /// Rebuilds a concept from stored state.
    pub fn from_parts(id: SctId, core: ComponentCore, definition_status: DefinitionStatus) -> Self {
        Self {
            id,
            core,
            definition_status,
            subclass_definition_status: SubclassDefinitionStatus::default(),
            descriptions: Vec::new(),
            relationships: Vec::new(),
            inactivation_indicators: Vec::new(),
            associations: Vec::new(),
        }
    }

    /// Concept SCTID.
    pub fn id(&self) -> SctId {
        self.id
    }

    /// Primitive or fully defined.
    pub fn definition_status(&self) -> DefinitionStatus {
        self.definition_status
    }

    /// Returns true if this concept is primitive.
    pub fn is_primitive(&self) -> bool {
        self.definition_status == DefinitionStatus::Primitive
    }

    /// Returns true if this concept is fully defined.
    pub fn is_fully_defined(&self) -> bool {
        self.definition_status == DefinitionStatus::FullyDefined
    }

    /// Changes the definition status.
    pub fn set_definition_status(&mut self, definition_status: DefinitionStatus) {
        let changed = self.definition_status != definition_status;
        self.definition_status = definition_status;
        self.core.touch(changed);
    }

    /// Takes the row-level state of `row` (core and definition status) while
    /// keeping everything this concept owns.
    ///
    /// Used when a later file carries a new version of an existing concept.
    pub fn apply_row(&mut self, row: Concept) {
        self.core = row.core;
        self.definition_status = row.definition_status;
    }

    /// Disjointness of subclasses.
    pub fn subclass_definition_status(&self) -> SubclassDefinitionStatus {
        self.subclass_definition_status
    }

    /// Changes the disjointness of subclasses.
    pub fn set_subclass_definition_status(&mut self, status: SubclassDefinitionStatus) {
        self.subclass_definition_status = status;
        self.core.mark_dirty();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Descriptions
    // ═══════════════════════════════════════════════════════════════════════

    /// All descriptions in insertion order.
    pub fn descriptions(&self) -> &[Description] {
        &self.descriptions
    }

    /// Mutable access to the descriptions.
    pub fn descriptions_mut(&mut self) -> &mut [Description] {
        &mut self.descriptions
    }

    /// Looks up an owned description.
    pub fn description(&self, id: SctId) -> Option<&Description> {
        self.descriptions.iter().find(|d| d.id() == id)
    }

    /// Looks up an owned description for writing.
    pub fn description_mut(&mut self, id: SctId) -> Option<&mut Description> {
        self.descriptions.iter_mut().find(|d| d.id() == id)
    }

    /// Appends a description.
    pub fn add_description(&mut self, description: Description) {
        self.descriptions.push(description);
    }

    /// Adds a description or replaces the one with the same id.
    ///
    /// Members already attached to the replaced description move to the new
    /// version.
    pub fn put_description(&mut self, mut description: Description) -> Option<Description> {
        match self.descriptions.iter().position(|d| d.id() == description.id()) {
            Some(index) => {
                let previous = self.descriptions[index].clone();
                description.adopt_members(&previous);
                Some(std::mem::replace(&mut self.descriptions[index], description))
            }
            None => {
                self.descriptions.push(description);
                None
            }
        }
    }

    /// The active fully specified name.
    pub fn fsn(&self) -> Option<&Description> {
        self.active_descriptions().find(|d| d.is_fsn())
    }

    /// Semantic tag of the FSN.
    pub fn semantic_tag(&self) -> Option<&str> {
        self.fsn().and_then(|d| d.semantic_tag())
    }

    /// FSN term with the semantic tag removed.
    pub fn fsn_term_without_tag(&self) -> Option<&str> {
        self.fsn().map(|d| d.term_without_tag())
    }

    /// The synonym preferred in `refset_id`.
    pub fn preferred_synonym(&self, refset_id: SctId) -> Option<&Description> {
        self.active_descriptions()
            .find(|d| !d.is_fsn() && d.is_preferred_in(refset_id))
    }

    fn active_descriptions(&self) -> impl Iterator<Item = &Description> {
        self.descriptions
            .iter()
            .filter(|d| d.is_active_safely() && !d.core().is_deleted())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Relationships
    // ═══════════════════════════════════════════════════════════════════════

    /// All relationships, every characteristic type.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Mutable access to the relationships.
    pub fn relationships_mut(&mut self) -> &mut [Relationship] {
        &mut self.relationships
    }

    /// Looks up an owned relationship for writing.
    pub fn relationship_mut(&mut self, id: SctId) -> Option<&mut Relationship> {
        self.relationships.iter_mut().find(|r| r.id() == id)
    }

    /// Adds a relationship unless an active one with the same type, target,
    /// group and characteristic type already exists.
    ///
    /// Returns false when the relationship was a duplicate.
    pub fn add_relationship(&mut self, relationship: Relationship) -> bool {
        let duplicate = self.relationships.iter().any(|r| {
            r.is_active_safely() && !r.core().is_deleted() && r.same_definition(&relationship)
        });
        if duplicate {
            return false;
        }
        self.relationships.push(relationship);
        true
    }

    /// Adds a relationship or replaces the one with the same id.
    pub fn put_relationship(&mut self, relationship: Relationship) -> Option<Relationship> {
        match self.relationships.iter().position(|r| r.id() == relationship.id()) {
            Some(index) => Some(std::mem::replace(&mut self.relationships[index], relationship)),
            None => {
                self.relationships.push(relationship);
                None
            }
        }
    }

    /// Active is-a parents of one characteristic type, sorted.
    pub fn parent_ids(&self, characteristic_type: CharacteristicType) -> Vec<SctId> {
        let mut parents: Vec<SctId> = self
            .relationships
            .iter()
            .filter(|r| r.is_active_is_a(characteristic_type))
            .filter_map(|r| r.target().concept_id())
            .collect();
        parents.sort_unstable();
        parents.dedup();
        parents
    }

    /// Active relationships of one characteristic type by group number.
    ///
    /// Relationships in the same positive group are read together; group 0
    /// holds the ungrouped ones.
    pub fn relationship_groups(
        &self,
        characteristic_type: CharacteristicType,
    ) -> BTreeMap<u16, Vec<&Relationship>> {
        let mut groups: BTreeMap<u16, Vec<&Relationship>> = BTreeMap::new();
        for rel in self.relationships.iter().filter(|r| {
            r.characteristic_type() == characteristic_type
                && r.is_active_safely()
                && !r.core().is_deleted()
        }) {
            groups.entry(rel.group()).or_default().push(rel);
        }
        groups
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inactivation
    // ═══════════════════════════════════════════════════════════════════════

    /// Inactivation indicators, including inactive ones.
    pub fn inactivation_indicators(&self) -> &[InactivationIndicatorEntry] {
        &self.inactivation_indicators
    }

    /// Historical associations, including inactive ones.
    pub fn associations(&self) -> &[HistoricalAssociation] {
        &self.associations
    }

    /// Reason of the active inactivation indicator, if any.
    pub fn inactivation_indicator(&self) -> Option<SctId> {
        self.inactivation_indicators
            .iter()
            .find(|i| i.is_active_safely() && !i.core().is_deleted())
            .map(|i| i.reason_id())
    }

    /// Association refset id to target concepts, from active members.
    pub fn association_targets(&self) -> BTreeMap<SctId, Vec<SctId>> {
        let mut targets: BTreeMap<SctId, Vec<SctId>> = BTreeMap::new();
        for assoc in self
            .associations
            .iter()
            .filter(|a| a.is_active_safely() && !a.core().is_deleted())
        {
            targets
                .entry(assoc.refset_id())
                .or_default()
                .push(assoc.target_component_id());
        }
        targets
    }

    /// Adds or replaces an indicator read from a file.
    pub fn put_inactivation_indicator(
        &mut self,
        indicator: InactivationIndicatorEntry,
    ) -> Option<InactivationIndicatorEntry> {
        put_by_member_id(&mut self.inactivation_indicators, indicator)
    }

    /// Adds or replaces an association read from a file.
    pub fn put_association(&mut self, association: HistoricalAssociation) -> Option<HistoricalAssociation> {
        put_by_member_id(&mut self.associations, association)
    }

    /// Inactivates the concept.
    ///
    /// Active relationships are inactivated, existing indicators and
    /// associations are withdrawn, and a new indicator plus one association
    /// per `(refset, target)` pair are added. Active descriptions stay active
    /// and are flagged as belonging to a non-current concept.
    pub fn inactivate(&mut self, reason_id: SctId, associations: &[(SctId, SctId)]) {
        let module_id = self.core.module_id();
        self.core.set_active(false);

        for rel in self.relationships.iter_mut().filter(|r| r.is_active_safely()) {
            rel.core_mut().set_active(false);
        }
        for indicator in self.inactivation_indicators.iter_mut() {
            withdraw(indicator);
        }
        for assoc in self.associations.iter_mut() {
            withdraw(assoc);
        }

        self.inactivation_indicators.push(InactivationIndicatorEntry::new(
            well_known::CONCEPT_INACTIVATION_REFSET,
            self.id,
            reason_id,
            module_id,
        ));
        for &(refset_id, target_id) in associations {
            self.associations
                .push(HistoricalAssociation::new(refset_id, self.id, target_id, module_id));
        }

        for desc in self
            .descriptions
            .iter_mut()
            .filter(|d| d.is_active_safely() && !d.core().is_deleted())
        {
            if desc.inactivation_indicator().is_none() {
                let indicator = InactivationIndicatorEntry::new(
                    well_known::DESCRIPTION_INACTIVATION_REFSET,
                    desc.id(),
                    well_known::REASON_CONCEPT_NON_CURRENT,
                    desc.module_id(),
                );
                desc.put_inactivation_indicator(indicator);
            }
        }
    }

    /// Sets the deletion marker on the concept and everything it owns.
    pub fn mark_deleted(&mut self) {
        self.core.mark_deleted();
        for desc in &mut self.descriptions {
            desc.mark_deleted();
        }
        for rel in &mut self.relationships {
            rel.core_mut().mark_deleted();
        }
        for indicator in &mut self.inactivation_indicators {
            indicator.core_mut().mark_deleted();
        }
        for assoc in &mut self.associations {
            assoc.core_mut().mark_deleted();
        }
    }

    /// The concept followed by every component it owns, depth first.
    pub fn components(&self) -> Vec<&dyn Component> {
        let mut all: Vec<&dyn Component> = vec![self as &dyn Component];
        for desc in &self.descriptions {
            all.extend(desc.components());
        }
        all.extend(self.relationships.iter().map(|r| r as &dyn Component));
        all.extend(self.inactivation_indicators.iter().map(|m| m as &dyn Component));
        all.extend(self.associations.iter().map(|m| m as &dyn Component));
        all
    }

    /// Mutable access to the concept's own indicators and associations.
    pub fn members_mut(&mut self) -> Vec<&mut dyn Component> {
        let mut all: Vec<&mut dyn Component> = Vec::new();
        all.extend(self.inactivation_indicators.iter_mut().map(|m| m as &mut dyn Component));
        all.extend(self.associations.iter_mut().map(|m| m as &mut dyn Component));
        all
    }
}

fn withdraw<T: Component>(member: &mut T) {
    if !member.is_active_safely() || member.core().is_deleted() {
        return;
    }
    if member.core().is_released() {
        member.core_mut().set_active(false);
    } else {
        member.core_mut().mark_deleted();
    }
}

impl Component for Concept {
    fn component_id(&self) -> ComponentId {
        ComponentId::Sct(self.id)
    }

    fn core(&self) -> &ComponentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ComponentCore {
        &mut self.core
    }

    fn component_type(&self) -> ComponentType {
        ComponentType::Concept
    }

    fn to_exchange_row(&self) -> Vec<String> {
        let mut row = self.base_fields();
        row.push(self.definition_status.to_id().to_string());
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Acceptability, CaseSignificance, DescriptionType, RelationshipTarget};

    const MODULE: SctId = well_known::SNOMED_CT_CORE_MODULE;

    fn make_concept() -> Concept {
        let core = ComponentCore::loaded(MODULE, Some(20020131), Some(true));
        let mut concept = Concept::from_parts(39937001, core, DefinitionStatus::FullyDefined);
        let mut fsn = Description::new(
            754786011,
            39937001,
            "Skin structure (body structure)",
            DescriptionType::Fsn,
            CaseSignificance::CaseInsensitive,
            MODULE,
        );
        fsn.set_acceptability(well_known::US_ENGLISH_REFSET, Acceptability::Preferred);
        let mut pt = Description::new(
            754787019,
            39937001,
            "Skin structure",
            DescriptionType::Synonym,
            CaseSignificance::CaseInsensitive,
            MODULE,
        );
        pt.set_acceptability(well_known::US_ENGLISH_REFSET, Acceptability::Preferred);
        concept.add_description(fsn);
        concept.add_description(pt);
        concept
    }

    fn make_rel(id: SctId, type_id: SctId, target: SctId, group: u16) -> Relationship {
        Relationship::new(
            id,
            39937001,
            type_id,
            RelationshipTarget::Concept(target),
            group,
            CharacteristicType::Stated,
            MODULE,
        )
    }

    #[test]
    fn test_fsn_helpers() {
        let concept = make_concept();
        assert_eq!(concept.semantic_tag(), Some("body structure"));
        assert_eq!(concept.fsn_term_without_tag(), Some("Skin structure"));
        assert_eq!(
            concept.preferred_synonym(well_known::US_ENGLISH_REFSET).map(|d| d.id()),
            Some(754787019)
        );
        assert!(concept.preferred_synonym(well_known::GB_ENGLISH_REFSET).is_none());
    }

    #[test]
    fn test_add_relationship_rejects_duplicates_per_group() {
        let mut concept = make_concept();
        assert!(concept.add_relationship(make_rel(1, well_known::FINDING_SITE, 2, 1)));
        assert!(!concept.add_relationship(make_rel(3, well_known::FINDING_SITE, 2, 1)));
        // Same attribute in a different group is a distinct statement.
        assert!(concept.add_relationship(make_rel(4, well_known::FINDING_SITE, 2, 2)));
        assert_eq!(concept.relationship_groups(CharacteristicType::Stated).len(), 2);
    }

    #[test]
    fn test_parent_ids_ignore_inactive_and_other_types() {
        let mut concept = make_concept();
        concept.add_relationship(make_rel(1, well_known::IS_A, 123037004, 0));
        concept.add_relationship(make_rel(2, well_known::IS_A, 91723000, 0));
        concept.add_relationship(make_rel(3, well_known::FINDING_SITE, 5, 0));
        if let Some(rel) = concept.relationship_mut(2) {
            rel.core_mut().set_active(false);
        }
        assert_eq!(concept.parent_ids(CharacteristicType::Stated), vec![123037004]);
        assert!(concept.parent_ids(CharacteristicType::Inferred).is_empty());
    }

    #[test]
    fn test_inactivate_concept() {
        let mut concept = make_concept();
        concept.add_relationship(make_rel(1, well_known::IS_A, 123037004, 0));
        concept.inactivate(well_known::REASON_DUPLICATE, &[(well_known::SAME_AS, 12345001)]);

        assert!(!concept.is_active_safely());
        assert!(concept.core().is_dirty());
        assert!(concept.relationships().iter().all(|r| !r.is_active_safely()));
        assert_eq!(concept.inactivation_indicator(), Some(well_known::REASON_DUPLICATE));
        assert_eq!(
            concept.association_targets().get(&well_known::SAME_AS),
            Some(&vec![12345001])
        );
        assert!(concept
            .descriptions()
            .iter()
            .all(|d| d.inactivation_indicator() == Some(well_known::REASON_CONCEPT_NON_CURRENT)));
    }

    #[test]
    fn test_put_description_keeps_members() {
        let mut concept = make_concept();
        let replacement = Description::new(
            754787019,
            39937001,
            "Skin",
            DescriptionType::Synonym,
            CaseSignificance::CaseInsensitive,
            MODULE,
        );
        assert!(concept.put_description(replacement).is_some());
        let desc = concept.description(754787019).unwrap();
        assert_eq!(desc.term(), "Skin");
        assert!(desc.is_preferred_in(well_known::US_ENGLISH_REFSET));
    }

    #[test]
    fn test_mark_deleted_cascades_to_everything() {
        let mut concept = make_concept();
        concept.add_relationship(make_rel(1, well_known::IS_A, 123037004, 0));
        concept.mark_deleted();
        let components = concept.components();
        assert_eq!(components.len(), 6);
        assert!(components.iter().all(|c| c.core().is_deleted()));
    }
}
