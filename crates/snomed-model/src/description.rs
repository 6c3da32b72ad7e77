//! Descriptions and their language reference set entries.

use std::collections::BTreeMap;

use crate::{
    Acceptability, CaseSignificance, Component, ComponentCore, ComponentId, ComponentType,
    DescriptionType, HistoricalAssociation, InactivationIndicatorEntry, LangRefsetEntry,
    RefsetEntry, SctId,
};

/// A term attached to a concept.
///
/// Owns its language reference set entries and its own inactivation
/// indicators and historical associations.
///
/// # Examples
///
/// ```
/// use snomed_model::{Acceptability, CaseSignificance, Description, DescriptionType, well_known};
///
/// let mut fsn = Description::new(
///     754786011,
///     73211009,
///     "Diabetes mellitus (disorder)",
///     DescriptionType::Fsn,
///     CaseSignificance::CaseInsensitive,
///     well_known::SNOMED_CT_CORE_MODULE,
/// );
/// fsn.set_acceptability(well_known::US_ENGLISH_REFSET, Acceptability::Preferred);
///
/// assert_eq!(fsn.semantic_tag(), Some("disorder"));
/// assert!(fsn.is_preferred_in(well_known::US_ENGLISH_REFSET));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Description {
    id: SctId,
    core: ComponentCore,
    concept_id: SctId,
    language_code: String,
    term: String,
    description_type: DescriptionType,
    case_significance: CaseSignificance,
    lang_refset_entries: Vec<LangRefsetEntry>,
    inactivation_indicators: Vec<InactivationIndicatorEntry>,
    associations: Vec<HistoricalAssociation>,
}

impl Description {
    /// Creates a new, unpublished English description.
    pub fn new(
        id: SctId,
        concept_id: SctId,
        term: impl Into<String>,
        description_type: DescriptionType,
        case_significance: CaseSignificance,
        module_id: SctId,
    ) -> Self {
        Self::from_parts(
            id,
            ComponentCore::new(module_id),
            concept_id,
            "en",
            term,
            description_type,
            case_significance,
        )
    }

    /// Rebuilds a description from stored state, without refset entries.
    pub fn from_parts(
        id: SctId,
        core: ComponentCore,
        concept_id: SctId,
        language_code: impl Into<String>,
        term: impl Into<String>,
        description_type: DescriptionType,
        case_significance: CaseSignificance,
    ) -> Self {
        Self {
            id,
            core,
            concept_id,
            language_code: language_code.into(),
            term: term.into(),
            description_type,
            case_significance,
            lang_refset_entries: Vec::new(),
            inactivation_indicators: Vec::new(),
            associations: Vec::new(),
        }
    }

    /// Description SCTID.
    pub fn id(&self) -> SctId {
        self.id
    }

    /// Owning concept.
    pub fn concept_id(&self) -> SctId {
        self.concept_id
    }

    /// ISO language code.
    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// The term text.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// FSN, synonym or text definition.
    pub fn description_type(&self) -> DescriptionType {
        self.description_type
    }

    /// Case significance.
    pub fn case_significance(&self) -> CaseSignificance {
        self.case_significance
    }

    /// Returns true if this is a Fully Specified Name.
    pub fn is_fsn(&self) -> bool {
        self.description_type == DescriptionType::Fsn
    }

    /// Semantic tag in the trailing parentheses of an FSN.
    pub fn semantic_tag(&self) -> Option<&str> {
        let open = self.term.rfind(" (")?;
        self.term[open + 2..].strip_suffix(')')
    }

    /// The term with any trailing semantic tag removed.
    pub fn term_without_tag(&self) -> &str {
        match self.term.rfind(" (") {
            Some(open) if self.term.ends_with(')') => &self.term[..open],
            _ => &self.term,
        }
    }

    /// Replaces the term.
    pub fn set_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        let changed = self.term != term;
        self.term = term;
        self.core.touch(changed);
    }

    /// Changes the description type.
    pub fn set_description_type(&mut self, description_type: DescriptionType) {
        let changed = self.description_type != description_type;
        self.description_type = description_type;
        self.core.touch(changed);
    }

    /// Changes the case significance.
    pub fn set_case_significance(&mut self, case_significance: CaseSignificance) {
        let changed = self.case_significance != case_significance;
        self.case_significance = case_significance;
        self.core.touch(changed);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Language reference set entries
    // ═══════════════════════════════════════════════════════════════════════

    /// All language entries, including inactive ones.
    pub fn lang_refset_entries(&self) -> &[LangRefsetEntry] {
        &self.lang_refset_entries
    }

    /// Mutable access to the language entries.
    pub fn lang_refset_entries_mut(&mut self) -> &mut [LangRefsetEntry] {
        &mut self.lang_refset_entries
    }

    /// Language refset id to acceptability, from active entries.
    pub fn acceptability_map(&self) -> BTreeMap<SctId, Acceptability> {
        self.lang_refset_entries
            .iter()
            .filter(|e| e.is_active_safely() && !e.core().is_deleted())
            .map(|e| (e.refset_id(), e.acceptability()))
            .collect()
    }

    /// Acceptability in one language refset.
    pub fn acceptability(&self, refset_id: SctId) -> Option<Acceptability> {
        self.acceptability_map().get(&refset_id).copied()
    }

    /// True if preferred in `refset_id`.
    pub fn is_preferred_in(&self, refset_id: SctId) -> bool {
        self.acceptability(refset_id) == Some(Acceptability::Preferred)
    }

    /// Adds or replaces an entry read from a file, matched on member id.
    pub fn put_lang_refset_entry(&mut self, entry: LangRefsetEntry) -> Option<LangRefsetEntry> {
        put_by_member_id(&mut self.lang_refset_entries, entry)
    }

    /// Makes the description `acceptability` in `refset_id`.
    ///
    /// Reuses an existing entry for the refset when there is one, reactivating
    /// it if needed. Otherwise a new entry is created in the description's
    /// module.
    pub fn set_acceptability(&mut self, refset_id: SctId, acceptability: Acceptability) {
        let existing = self
            .lang_refset_entries
            .iter_mut()
            .filter(|e| e.refset_id() == refset_id && !e.core().is_deleted())
            .max_by_key(|e| e.is_active_safely());

        match existing {
            Some(entry) => {
                entry.set_acceptability(acceptability);
                entry.core_mut().set_active(true);
            }
            None => {
                let entry = LangRefsetEntry::new(
                    refset_id,
                    self.id,
                    acceptability,
                    self.core.module_id(),
                );
                self.lang_refset_entries.push(entry);
            }
        }
    }

    /// Withdraws the description from `refset_id`.
    ///
    /// Released entries are inactivated; unreleased ones are marked deleted.
    /// Returns the number of entries affected.
    pub fn remove_acceptability(&mut self, refset_id: SctId) -> usize {
        let mut affected = 0;
        for entry in self
            .lang_refset_entries
            .iter_mut()
            .filter(|e| e.refset_id() == refset_id && e.is_active_safely() && !e.core().is_deleted())
        {
            if entry.core().is_released() {
                entry.core_mut().set_active(false);
            } else {
                entry.core_mut().mark_deleted();
            }
            affected += 1;
        }
        affected
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

    /// Inactivates the description with a reason. Language entries are
    /// withdrawn the same way as [`Description::remove_acceptability`].
    pub fn inactivate(&mut self, refset_id: SctId, reason_id: SctId) {
        self.core.set_active(false);
        let refsets: Vec<SctId> = self.acceptability_map().keys().copied().collect();
        for refset in refsets {
            self.remove_acceptability(refset);
        }
        let module_id = self.core.module_id();
        self.inactivation_indicators
            .push(InactivationIndicatorEntry::new(refset_id, self.id, reason_id, module_id));
    }

    /// Sets the deletion marker here and on every owned member.
    pub fn mark_deleted(&mut self) {
        self.core.mark_deleted();
        for entry in &mut self.lang_refset_entries {
            entry.core_mut().mark_deleted();
        }
        for indicator in &mut self.inactivation_indicators {
            indicator.core_mut().mark_deleted();
        }
        for association in &mut self.associations {
            association.core_mut().mark_deleted();
        }
    }

    /// Copies over members of an earlier version that this one lacks.
    pub(crate) fn adopt_members(&mut self, previous: &Description) {
        for entry in &previous.lang_refset_entries {
            if !self.lang_refset_entries.iter().any(|e| e.member_id() == entry.member_id()) {
                self.lang_refset_entries.push(entry.clone());
            }
        }
        for indicator in &previous.inactivation_indicators {
            if !self.inactivation_indicators.iter().any(|i| i.member_id() == indicator.member_id()) {
                self.inactivation_indicators.push(indicator.clone());
            }
        }
        for assoc in &previous.associations {
            if !self.associations.iter().any(|a| a.member_id() == assoc.member_id()) {
                self.associations.push(assoc.clone());
            }
        }
    }

    /// This description followed by all owned members.
    pub fn components(&self) -> Vec<&dyn Component> {
        let mut all: Vec<&dyn Component> = vec![self as &dyn Component];
        all.extend(self.lang_refset_entries.iter().map(|e| e as &dyn Component));
        all.extend(self.inactivation_indicators.iter().map(|e| e as &dyn Component));
        all.extend(self.associations.iter().map(|e| e as &dyn Component));
        all
    }

    /// Mutable references to this description's members.
    pub fn members_mut(&mut self) -> Vec<&mut dyn Component> {
        let mut all: Vec<&mut dyn Component> = Vec::new();
        all.extend(self.lang_refset_entries.iter_mut().map(|e| e as &mut dyn Component));
        all.extend(self.inactivation_indicators.iter_mut().map(|e| e as &mut dyn Component));
        all.extend(self.associations.iter_mut().map(|e| e as &mut dyn Component));
        all
    }
}

pub(crate) fn put_by_member_id<T: RefsetEntry>(members: &mut Vec<T>, member: T) -> Option<T> {
    match members.iter().position(|m| m.member_id() == member.member_id()) {
        Some(index) => Some(std::mem::replace(&mut members[index], member)),
        None => {
            members.push(member);
            None
        }
    }
}

impl Component for Description {
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
        match self.description_type {
            DescriptionType::TextDefinition => ComponentType::TextDefinition,
            _ => ComponentType::Description,
        }
    }

    fn to_exchange_row(&self) -> Vec<String> {
        let mut row = self.base_fields();
        row.push(self.concept_id.to_string());
        row.push(self.language_code.clone());
        row.push(self.description_type.to_id().to_string());
        row.push(self.term.clone());
        row.push(self.case_significance.to_id().to_string());
        row
    }
}
