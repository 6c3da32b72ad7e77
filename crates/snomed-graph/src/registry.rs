//! The graph registry.
//!
//! Owns every component of one working snapshot. Components are materialized
//! from RF2 rows here and nowhere else; the template engine hands synthesized
//! concepts to [`GraphRegistry::register_concept`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use snomed_model::{
    Component, ComponentId, Concept, Description, HistoricalAssociation,
    InactivationIndicatorEntry, LangRefsetEntry, RefsetMember, Relationship, SctId,
};
use uuid::Uuid;

use crate::error::{GraphError, GraphResult};
use crate::modules::ModuleDependencies;
use crate::rf2::{
    ConcreteRelationshipRow, ModuleDependencyRow, ReleaseType, Rf2FileKind, Rf2Package,
    Rf2Parser, Rf2Record, Rf2Source,
};
use crate::traversal::TraversalCache;

/// Lifecycle of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphState {
    /// Nothing loaded; only [`GraphRegistry::load`] is valid.
    #[default]
    Unloaded,
    /// At least one package was loaded successfully.
    Loaded,
}

/// Row counts accumulated over successful loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// RF2 files read.
    pub files: usize,
    /// Concept rows applied.
    pub concepts: usize,
    /// Description and text definition rows applied.
    pub descriptions: usize,
    /// Relationship rows applied, all characteristic types.
    pub relationships: usize,
    /// Reference set rows attached to a component.
    pub refset_members: usize,
    /// Reference set rows whose referenced component is not in the graph.
    pub unattached_members: usize,
    /// Module dependency rows read.
    pub module_dependencies: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberOwner {
    Concept(SctId),
    Description(SctId),
}

/// In-memory component graph for one branch or snapshot.
///
/// Each instance is an independent arena; nothing is shared between
/// registries.
///
/// # Example
///
/// ```ignore
/// use snomed_graph::{GraphRegistry, Rf2Package};
///
/// let mut registry = GraphRegistry::new();
/// registry.load(&Rf2Package::open("/path/to/SnomedCT_InternationalRF2")?)?;
/// registry.load(&Rf2Package::open("/path/to/working-delta.zip")?)?;
///
/// let concept = registry.get_concept(73211009)?;
/// println!("{:?}", concept.fsn().map(|d| d.term()));
/// ```
#[derive(Debug, Default)]
pub struct GraphRegistry {
    state: GraphState,
    concepts: HashMap<SctId, Concept>,
    description_owner: HashMap<SctId, SctId>,
    relationship_owner: HashMap<SctId, SctId>,
    member_owner: HashMap<Uuid, MemberOwner>,
    unattached: BTreeMap<Uuid, RefsetMember>,
    modules: ModuleDependencies,
    cache: TraversalCache,
    stats: LoadStats,
}

impl GraphRegistry {
    /// Creates an unloaded registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry and loads `package` into it.
    pub fn from_package(package: &Rf2Package) -> GraphResult<Self> {
        let mut registry = Self::new();
        registry.load(package)?;
        Ok(registry)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> GraphState {
        self.state
    }

    /// Counts accumulated over every successful load.
    pub fn load_stats(&self) -> LoadStats {
        self.stats
    }

    pub(crate) fn ensure_loaded(&self) -> GraphResult<()> {
        match self.state {
            GraphState::Loaded => Ok(()),
            GraphState::Unloaded => Err(GraphError::NotLoaded),
        }
    }

    pub(crate) fn cache(&self) -> &TraversalCache {
        &self.cache
    }

    pub(crate) fn concept_map(&self) -> &HashMap<SctId, Concept> {
        &self.concepts
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Loading
    // ═══════════════════════════════════════════════════════════════════════

    /// Reads every file of `package` in load order.
    ///
    /// On a loaded registry the rows are applied on top of what is there:
    /// rows for known ids replace the stored version, other rows add
    /// components, and components absent from the package are untouched.
    /// Rows from delta files stay dirty so they are written to the next
    /// delta.
    ///
    /// Any error resets the registry to [`GraphState::Unloaded`].
    pub fn load(&mut self, package: &Rf2Package) -> GraphResult<LoadStats> {
        let before = self.stats;
        if let Err(e) = self.load_files(package) {
            *self = Self::new();
            return Err(e);
        }

        self.state = GraphState::Loaded;
        self.cache.invalidate();

        let stats = self.stats;
        tracing::info!(
            "Loaded {} files: {} concepts, {} descriptions, {} relationships, {} refset members ({} unattached)",
            stats.files - before.files,
            stats.concepts - before.concepts,
            stats.descriptions - before.descriptions,
            stats.relationships - before.relationships,
            stats.refset_members - before.refset_members,
            stats.unattached_members - before.unattached_members,
        );
        Ok(stats)
    }

    fn load_files(&mut self, package: &Rf2Package) -> GraphResult<()> {
        for source in package.files() {
            let delta = source.release == ReleaseType::Delta;
            let rows = match source.kind {
                Rf2FileKind::Concept => {
                    read_rows(package, source, |row: Concept| self.apply_concept(row, delta))?
                }
                Rf2FileKind::Description | Rf2FileKind::TextDefinition => {
                    read_rows(package, source, |row: Description| self.apply_description(row, delta))?
                }
                Rf2FileKind::Relationship | Rf2FileKind::StatedRelationship => {
                    read_rows(package, source, |row: Relationship| self.apply_relationship(row, delta))?
                }
                Rf2FileKind::ConcreteRelationship => {
                    read_rows(package, source, |row: ConcreteRelationshipRow| {
                        self.apply_relationship(row.0, delta)
                    })?
                }
                Rf2FileKind::LanguageRefset => read_rows(package, source, |row: LangRefsetEntry| {
                    self.apply_member(RefsetMember::Language(row), delta)
                })?,
                Rf2FileKind::AttributeValueRefset => {
                    read_rows(package, source, |row: InactivationIndicatorEntry| {
                        self.apply_member(RefsetMember::InactivationIndicator(row), delta)
                    })?
                }
                Rf2FileKind::AssociationRefset => {
                    read_rows(package, source, |row: HistoricalAssociation| {
                        self.apply_member(RefsetMember::Association(row), delta)
                    })?
                }
                Rf2FileKind::ModuleDependency => {
                    read_rows(package, source, |row: ModuleDependencyRow| {
                        self.apply_module_dependency(row)
                    })?
                }
            };
            self.stats.files += 1;
            tracing::debug!("Read {} rows from {}", rows, source.name);
        }
        Ok(())
    }

    fn apply_concept(&mut self, mut row: Concept, delta: bool) -> Result<(), String> {
        match self.concepts.get_mut(&row.id()) {
            Some(existing) => {
                if delta {
                    row.core_mut().apply_delta(existing.core().is_released());
                }
                existing.apply_row(row);
            }
            None => {
                if delta {
                    row.core_mut().apply_delta(false);
                }
                self.concepts.insert(row.id(), row);
            }
        }
        self.stats.concepts += 1;
        Ok(())
    }

    fn apply_description(&mut self, mut row: Description, delta: bool) -> Result<(), String> {
        let id = row.id();
        let owner = row.concept_id();
        if let Some(&previous) = self.description_owner.get(&id) {
            if previous != owner {
                return Err(format!("description {} moved from concept {} to {}", id, previous, owner));
            }
        }
        let concept = self
            .concepts
            .get_mut(&owner)
            .ok_or_else(|| format!("description {} refers to unknown concept {}", id, owner))?;

        if delta {
            let released = concept.description(id).is_some_and(|d| d.core().is_released());
            row.core_mut().apply_delta(released);
        }
        concept.put_description(row);
        self.description_owner.insert(id, owner);
        self.stats.descriptions += 1;
        Ok(())
    }

    fn apply_relationship(&mut self, mut row: Relationship, delta: bool) -> Result<(), String> {
        let id = row.id();
        let owner = row.source_id();
        if let Some(&previous) = self.relationship_owner.get(&id) {
            if previous != owner {
                return Err(format!("relationship {} moved from concept {} to {}", id, previous, owner));
            }
        }
        let concept = self
            .concepts
            .get_mut(&owner)
            .ok_or_else(|| format!("relationship {} has unknown source concept {}", id, owner))?;

        if delta {
            let released = concept
                .relationships()
                .iter()
                .any(|r| r.id() == id && r.core().is_released());
            row.core_mut().apply_delta(released);
        }
        concept.put_relationship(row);
        self.relationship_owner.insert(id, owner);
        self.stats.relationships += 1;
        Ok(())
    }

    fn apply_member(&mut self, mut member: RefsetMember, delta: bool) -> Result<(), String> {
        let member_id = member.member_id();
        if delta {
            let released = self
                .find_component(ComponentId::Member(member_id))
                .is_some_and(|c| c.core().is_released());
            member.core_mut().apply_delta(released);
        }

        let attached = match self.owner_of(member.referenced_component_id()) {
            Some(owner) => self.attach(owner, member),
            None => Err(member),
        };
        match attached {
            Ok(()) => {
                self.unattached.remove(&member_id);
                self.stats.refset_members += 1;
            }
            Err(member) => {
                self.unattached.insert(member_id, member);
                self.stats.unattached_members += 1;
            }
        }
        Ok(())
    }

    fn apply_module_dependency(&mut self, row: ModuleDependencyRow) -> Result<(), String> {
        if row.active {
            self.modules.add(row.module_id, row.target_module_id);
        } else {
            self.modules.remove(row.module_id, row.target_module_id);
        }
        self.stats.module_dependencies += 1;
        Ok(())
    }

    fn owner_of(&self, referenced: SctId) -> Option<MemberOwner> {
        if self.concepts.contains_key(&referenced) {
            Some(MemberOwner::Concept(referenced))
        } else if self.description_owner.contains_key(&referenced) {
            Some(MemberOwner::Description(referenced))
        } else {
            None
        }
    }

    /// Hangs `member` off its owner, handing it back if the owner cannot
    /// hold members of its kind.
    fn attach(&mut self, owner: MemberOwner, member: RefsetMember) -> Result<(), RefsetMember> {
        let member_id = member.member_id();
        match owner {
            MemberOwner::Concept(concept_id) => match (self.concepts.get_mut(&concept_id), member) {
                (Some(concept), RefsetMember::InactivationIndicator(m)) => {
                    concept.put_inactivation_indicator(m);
                }
                (Some(concept), RefsetMember::Association(m)) => {
                    concept.put_association(m);
                }
                (_, member) => return Err(member),
            },
            MemberOwner::Description(description_id) => {
                let concept_id = self.description_owner.get(&description_id).copied();
                let description = concept_id
                    .and_then(|id| self.concepts.get_mut(&id))
                    .and_then(|c| c.description_mut(description_id));
                match (description, member) {
                    (Some(desc), RefsetMember::Language(m)) => {
                        desc.put_lang_refset_entry(m);
                    }
                    (Some(desc), RefsetMember::InactivationIndicator(m)) => {
                        desc.put_inactivation_indicator(m);
                    }
                    (Some(desc), RefsetMember::Association(m)) => {
                        desc.put_association(m);
                    }
                    (None, member) => return Err(member),
                }
            }
        }
        self.member_owner.insert(member_id, owner);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lookup
    // ═══════════════════════════════════════════════════════════════════════

    /// Looks up a concept, active or not.
    pub fn get_concept(&self, id: SctId) -> GraphResult<&Concept> {
        self.ensure_loaded()?;
        self.concepts
            .get(&id)
            .ok_or_else(|| GraphError::not_found("concept", id))
    }

    /// Looks up a description through its owning concept.
    pub fn get_description(&self, id: SctId) -> GraphResult<&Description> {
        self.ensure_loaded()?;
        self.description_owner
            .get(&id)
            .and_then(|owner| self.concepts.get(owner))
            .and_then(|c| c.description(id))
            .ok_or_else(|| GraphError::not_found("description", id))
    }

    /// Looks up a relationship through its source concept.
    pub fn get_relationship(&self, id: SctId) -> GraphResult<&Relationship> {
        self.ensure_loaded()?;
        self.relationship_owner
            .get(&id)
            .and_then(|owner| self.concepts.get(owner))
            .and_then(|c| c.relationships().iter().find(|r| r.id() == id))
            .ok_or_else(|| GraphError::not_found("relationship", id))
    }

    /// Looks up any component by id.
    pub fn get_component(&self, id: ComponentId) -> GraphResult<&dyn Component> {
        self.ensure_loaded()?;
        self.find_component(id)
            .ok_or_else(|| GraphError::not_found("component", id))
    }

    fn find_component(&self, id: ComponentId) -> Option<&dyn Component> {
        match id {
            ComponentId::Sct(sctid) => {
                if let Some(concept) = self.concepts.get(&sctid) {
                    return Some(concept as &dyn Component);
                }
                if let Some(owner) = self.description_owner.get(&sctid) {
                    return self
                        .concepts
                        .get(owner)?
                        .description(sctid)
                        .map(|d| d as &dyn Component);
                }
                let owner = self.relationship_owner.get(&sctid)?;
                self.concepts
                    .get(owner)?
                    .relationships()
                    .iter()
                    .find(|r| r.id() == sctid)
                    .map(|r| r as &dyn Component)
            }
            ComponentId::Member(uuid) => {
                if let Some(member) = self.unattached.get(&uuid) {
                    return Some(member as &dyn Component);
                }
                let components = match self.member_owner.get(&uuid)? {
                    MemberOwner::Concept(concept_id) => self.concepts.get(concept_id)?.components(),
                    MemberOwner::Description(description_id) => {
                        let owner = self.description_owner.get(description_id)?;
                        self.concepts.get(owner)?.description(*description_id)?.components()
                    }
                };
                components.into_iter().find(|c| c.component_id() == id)
            }
        }
    }

    /// True if a concept with this id is registered.
    pub fn contains_concept(&self, id: SctId) -> bool {
        self.concepts.contains_key(&id)
    }

    /// True if any concept, description or relationship uses this id.
    pub fn sctid_in_use(&self, id: SctId) -> bool {
        self.concepts.contains_key(&id)
            || self.description_owner.contains_key(&id)
            || self.relationship_owner.contains_key(&id)
    }

    /// Every registered concept, in no particular order.
    pub fn get_all_concepts(&self) -> GraphResult<impl Iterator<Item = &Concept> + '_> {
        self.ensure_loaded()?;
        Ok(self.concepts.values())
    }

    /// Number of registered concepts.
    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    /// The active concept whose active FSN is exactly `term`.
    ///
    /// When several match, the lowest id wins.
    pub fn find_by_fsn(&self, term: &str) -> GraphResult<Option<&Concept>> {
        self.ensure_loaded()?;
        Ok(self
            .concepts
            .values()
            .filter(|c| c.is_active_safely() && !c.core().is_deleted())
            .filter(|c| c.fsn().is_some_and(|d| d.term() == term))
            .min_by_key(|c| c.id()))
    }

    /// The component a refset member annotates and the concept that owns it.
    ///
    /// `None` for members not attached to a registered component.
    pub fn member_target(&self, member_id: Uuid) -> Option<(SctId, SctId)> {
        match *self.member_owner.get(&member_id)? {
            MemberOwner::Concept(concept_id) => Some((concept_id, concept_id)),
            MemberOwner::Description(description_id) => {
                Some((description_id, *self.description_owner.get(&description_id)?))
            }
        }
    }

    /// Reference set members whose referenced component is not in the graph.
    pub fn unattached_members(&self) -> impl Iterator<Item = &RefsetMember> + '_ {
        self.unattached.values()
    }

    /// Every component that changed since it was loaded, deleted or not.
    pub fn dirty_components(&self) -> GraphResult<Vec<&dyn Component>> {
        self.ensure_loaded()?;
        let mut dirty: Vec<&dyn Component> = self
            .concepts
            .values()
            .flat_map(|c| c.components())
            .filter(|c| c.core().is_dirty())
            .collect();
        dirty.extend(
            self.unattached
                .values()
                .filter(|m| m.core().is_dirty())
                .map(|m| m as &dyn Component),
        );
        Ok(dirty)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Module dependencies
    // ═══════════════════════════════════════════════════════════════════════

    /// Every module `module_id` depends on, transitively.
    pub fn get_dependencies(&self, module_id: SctId) -> GraphResult<BTreeSet<SctId>> {
        self.ensure_loaded()?;
        Ok(self.modules.transitive(module_id))
    }

    /// The module dependency relation.
    pub fn module_dependencies(&self) -> &ModuleDependencies {
        &self.modules
    }

    /// Records a dependency not present in the loaded package.
    pub fn add_module_dependency(&mut self, module_id: SctId, target_module_id: SctId) -> GraphResult<()> {
        self.ensure_loaded()?;
        self.modules.add(module_id, target_module_id);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mutation
    // ═══════════════════════════════════════════════════════════════════════

    /// Inserts a concept synthesized in memory, with whatever it owns.
    ///
    /// Fails with an integrity error if its id or the id of anything it
    /// owns is already registered.
    pub fn register_concept(&mut self, concept: Concept) -> GraphResult<SctId> {
        self.ensure_loaded()?;
        let id = concept.id();
        if self.sctid_in_use(id) {
            return Err(GraphError::Integrity(format!("concept {} is already registered", id)));
        }
        for desc in concept.descriptions() {
            if desc.concept_id() != id || self.sctid_in_use(desc.id()) {
                return Err(GraphError::Integrity(format!(
                    "description {} cannot be registered with concept {}",
                    desc.id(),
                    id
                )));
            }
        }
        for rel in concept.relationships() {
            if rel.source_id() != id || self.sctid_in_use(rel.id()) {
                return Err(GraphError::Integrity(format!(
                    "relationship {} cannot be registered with concept {}",
                    rel.id(),
                    id
                )));
            }
        }

        self.concepts.insert(id, concept);
        self.index_concept(id);
        self.cache.invalidate();
        tracing::debug!("Registered concept {}", id);
        Ok(id)
    }

    /// Applies `f` to a concept and re-indexes whatever it now owns.
    ///
    /// Traversal caches are invalidated afterwards.
    pub fn update_concept<R>(&mut self, id: SctId, f: impl FnOnce(&mut Concept) -> R) -> GraphResult<R> {
        self.ensure_loaded()?;
        let concept = self
            .concepts
            .get_mut(&id)
            .ok_or_else(|| GraphError::not_found("concept", id))?;
        let result = f(concept);
        self.index_concept(id);
        self.cache.invalidate();
        Ok(result)
    }

    /// Mutable access to the versioned state of any component.
    pub fn component_mut(&mut self, id: ComponentId) -> GraphResult<&mut dyn Component> {
        self.ensure_loaded()?;
        self.cache.invalidate();
        let not_found = || GraphError::not_found("component", id);
        match id {
            ComponentId::Sct(sctid) => {
                if self.concepts.contains_key(&sctid) {
                    return self
                        .concepts
                        .get_mut(&sctid)
                        .map(|c| c as &mut dyn Component)
                        .ok_or_else(not_found);
                }
                if let Some(&owner) = self.description_owner.get(&sctid) {
                    return self
                        .concepts
                        .get_mut(&owner)
                        .and_then(|c| c.description_mut(sctid))
                        .map(|d| d as &mut dyn Component)
                        .ok_or_else(not_found);
                }
                let owner = *self.relationship_owner.get(&sctid).ok_or_else(not_found)?;
                self.concepts
                    .get_mut(&owner)
                    .and_then(|c| c.relationship_mut(sctid))
                    .map(|r| r as &mut dyn Component)
                    .ok_or_else(not_found)
            }
            ComponentId::Member(uuid) => {
                if self.unattached.contains_key(&uuid) {
                    return self
                        .unattached
                        .get_mut(&uuid)
                        .map(|m| m as &mut dyn Component)
                        .ok_or_else(not_found);
                }
                let owner = *self.member_owner.get(&uuid).ok_or_else(not_found)?;
                let members = match owner {
                    MemberOwner::Concept(concept_id) => {
                        self.concepts.get_mut(&concept_id).map(|c| c.members_mut())
                    }
                    MemberOwner::Description(description_id) => {
                        let concept_id = self.description_owner.get(&description_id).copied();
                        concept_id
                            .and_then(|cid| self.concepts.get_mut(&cid))
                            .and_then(|c| c.description_mut(description_id))
                            .map(|d| d.members_mut())
                    }
                };
                members
                    .and_then(|m| m.into_iter().find(|c| c.component_id() == id))
                    .ok_or_else(not_found)
            }
        }
    }

    /// Adds a description to its concept.
    pub fn add_description(&mut self, description: Description) -> GraphResult<()> {
        self.ensure_loaded()?;
        if self.sctid_in_use(description.id()) {
            return Err(GraphError::Integrity(format!(
                "description {} is already registered",
                description.id()
            )));
        }
        let owner = description.concept_id();
        self.update_concept(owner, |c| c.add_description(description))
    }

    /// Adds a relationship to its source concept.
    ///
    /// Returns false, adding nothing, if an equivalent active relationship
    /// already exists in the same group.
    pub fn add_relationship(&mut self, relationship: Relationship) -> GraphResult<bool> {
        self.ensure_loaded()?;
        if self.sctid_in_use(relationship.id()) {
            return Err(GraphError::Integrity(format!(
                "relationship {} is already registered",
                relationship.id()
            )));
        }
        let owner = relationship.source_id();
        self.update_concept(owner, |c| c.add_relationship(relationship))
    }

    /// Inactivates a concept with a reason and historical associations.
    ///
    /// Association targets must be registered concepts.
    pub fn inactivate_concept(
        &mut self,
        id: SctId,
        reason_id: SctId,
        associations: &[(SctId, SctId)],
    ) -> GraphResult<()> {
        self.ensure_loaded()?;
        for &(_, target) in associations {
            if !self.concepts.contains_key(&target) {
                return Err(GraphError::not_found("concept", target));
            }
        }
        self.update_concept(id, |c| c.inactivate(reason_id, associations))?;
        tracing::debug!("Inactivated concept {} with reason {}", id, reason_id);
        Ok(())
    }

    /// Marks a never-released component deleted.
    ///
    /// Concepts and descriptions take everything they own with them.
    /// Released components can only be inactivated.
    pub fn delete_component(&mut self, id: ComponentId) -> GraphResult<()> {
        let released = self.get_component(id)?.core().is_released();
        if released {
            return Err(GraphError::Integrity(format!(
                "{} has been released and can only be inactivated",
                id
            )));
        }

        match id {
            ComponentId::Sct(sctid) if self.concepts.contains_key(&sctid) => {
                if let Some(concept) = self.concepts.get_mut(&sctid) {
                    concept.mark_deleted();
                }
            }
            ComponentId::Sct(sctid) if self.description_owner.contains_key(&sctid) => {
                let owner = self.description_owner.get(&sctid).copied();
                if let Some(desc) = owner
                    .and_then(|cid| self.concepts.get_mut(&cid))
                    .and_then(|c| c.description_mut(sctid))
                {
                    desc.mark_deleted();
                }
            }
            _ => self.component_mut(id)?.core_mut().mark_deleted(),
        }
        self.cache.invalidate();
        Ok(())
    }

    fn index_concept(&mut self, id: SctId) {
        let Some(concept) = self.concepts.get(&id) else {
            return;
        };
        for desc in concept.descriptions() {
            self.description_owner.insert(desc.id(), id);
            for member in desc.components().into_iter().skip(1) {
                if let ComponentId::Member(uuid) = member.component_id() {
                    self.member_owner.insert(uuid, MemberOwner::Description(desc.id()));
                }
            }
        }
        for rel in concept.relationships() {
            self.relationship_owner.insert(rel.id(), id);
        }
        for indicator in concept.inactivation_indicators() {
            if let ComponentId::Member(uuid) = indicator.component_id() {
                self.member_owner.insert(uuid, MemberOwner::Concept(id));
            }
        }
        for assoc in concept.associations() {
            if let ComponentId::Member(uuid) = assoc.component_id() {
                self.member_owner.insert(uuid, MemberOwner::Concept(id));
            }
        }
    }
}

/// Parses every row of one package file and hands it to `apply`.
///
/// A message returned by `apply` becomes a parse error at that row.
fn read_rows<T, F>(package: &Rf2Package, source: &Rf2Source, mut apply: F) -> GraphResult<usize>
where
    T: Rf2Record,
    F: FnMut(T) -> Result<(), String>,
{
    let reader = package.open_source(source)?;
    let mut parser = Rf2Parser::<_, T>::from_reader(reader, source.name.clone())?;
    let mut count = 0;
    while let Some(row) = parser.next() {
        apply(row?).map_err(|message| parser.error_here(message))?;
        count += 1;
    }
    Ok(count)
}
