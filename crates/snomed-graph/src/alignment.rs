//! Alignment and consistency rules.
//!
//! The registry accepts components whose module differs from the concept they
//! belong to, since such states are legitimate while content migrates between
//! modules. The checks here report them, and repair moves a component into
//! its owner's module.

use std::collections::HashSet;
use std::fmt;

use snomed_model::{Component, ComponentId, Concept, SctId};

use crate::config::AlignmentConfig;
use crate::error::GraphResult;
use crate::modules::ModuleDependencies;
use crate::registry::GraphRegistry;
use crate::rf2::{for_each_row, parse, ReleaseType, Rf2FileKind, Rf2Package};

/// Which rule an [`AlignmentIssue`] breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlignmentRule {
    /// A description, relationship or concept refset member is in a module
    /// other than its concept's.
    ModuleAlignment,
    /// A language refset entry is in a module other than its description's.
    LanguageRefsetAlignment,
}

/// One misaligned component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentIssue {
    /// Rule broken.
    pub rule: AlignmentRule,
    /// The misaligned component.
    pub component_id: ComponentId,
    /// The component it should follow.
    pub owner_id: ComponentId,
    /// Module the component is in.
    pub component_module: SctId,
    /// Module the component should be in.
    pub owner_module: SctId,
}

impl fmt::Display for AlignmentIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}: {} is in module {} but {} is in module {}",
            self.rule, self.component_id, self.component_module, self.owner_id, self.owner_module
        )
    }
}

struct Checker<'a> {
    config: &'a AlignmentConfig,
    dependencies: &'a ModuleDependencies,
    issues: Vec<AlignmentIssue>,
}

impl Checker<'_> {
    fn check(&mut self, rule: AlignmentRule, component: &dyn Component, owner_id: ComponentId, owner_module: SctId) {
        let module = component.module_id();
        if module == owner_module
            || !component.is_active_safely()
            || component.core().is_deleted()
            || self.config.exempt_modules.contains(&module)
            || self.dependencies.may_reference(module, owner_module)
        {
            return;
        }
        self.issues.push(AlignmentIssue {
            rule,
            component_id: component.component_id(),
            owner_id,
            component_module: module,
            owner_module,
        });
    }

    fn check_concept(&mut self, concept: &Concept) {
        let owner = ComponentId::Sct(concept.id());
        let module = concept.module_id();

        for desc in concept.descriptions() {
            self.check(AlignmentRule::ModuleAlignment, desc, owner, module);
            let desc_owner = ComponentId::Sct(desc.id());
            for entry in desc.lang_refset_entries() {
                self.check(AlignmentRule::LanguageRefsetAlignment, entry, desc_owner, desc.module_id());
            }
            for member in desc.inactivation_indicators() {
                self.check(AlignmentRule::ModuleAlignment, member, owner, module);
            }
            for member in desc.associations() {
                self.check(AlignmentRule::ModuleAlignment, member, owner, module);
            }
        }
        for rel in concept.relationships() {
            self.check(AlignmentRule::ModuleAlignment, rel, owner, module);
        }
        for member in concept.inactivation_indicators() {
            self.check(AlignmentRule::ModuleAlignment, member, owner, module);
        }
        for member in concept.associations() {
            self.check(AlignmentRule::ModuleAlignment, member, owner, module);
        }
    }
}

/// Finds every active component whose module neither matches its owner's
/// nor is allowed to reference it through a module dependency.
///
/// Components in an exempt module are never reported. Issues come out in
/// concept id order.
pub fn detect_misalignments(registry: &GraphRegistry, config: &AlignmentConfig) -> GraphResult<Vec<AlignmentIssue>> {
    let mut concepts: Vec<&Concept> = registry.get_all_concepts()?.collect();
    concepts.sort_unstable_by_key(|c| c.id());

    let mut checker = Checker {
        config,
        dependencies: registry.module_dependencies(),
        issues: Vec::new(),
    };
    for concept in concepts {
        checker.check_concept(concept);
    }

    for issue in &checker.issues {
        tracing::warn!("Misaligned component: {}", issue);
    }
    Ok(checker.issues)
}

/// Moves each reported component into its owner's module.
///
/// A description that moves takes along the language entries still in its
/// old module. Components whose module changed since detection are left
/// alone. Returns the number of components moved.
pub fn repair_misalignments(registry: &mut GraphRegistry, issues: &[AlignmentIssue]) -> GraphResult<usize> {
    let mut repaired = 0;
    for issue in issues {
        // An earlier repair may have moved the description this entry follows.
        let target = match (issue.rule, issue.owner_id) {
            (AlignmentRule::LanguageRefsetAlignment, ComponentId::Sct(desc_id)) => {
                registry.get_description(desc_id)?.module_id()
            }
            _ => issue.owner_module,
        };
        let component = registry.component_mut(issue.component_id)?;
        if component.module_id() != issue.component_module || component.module_id() == target {
            continue;
        }
        component.core_mut().set_module_id(target);
        repaired += 1;

        if let (AlignmentRule::ModuleAlignment, ComponentId::Sct(desc_id), ComponentId::Sct(concept_id)) =
            (issue.rule, issue.component_id, issue.owner_id)
        {
            if registry.get_description(desc_id).is_ok() {
                repaired += registry.update_concept(concept_id, |concept| {
                    follow_description(concept, desc_id, issue.component_module, issue.owner_module)
                })?;
            }
        }
    }
    tracing::info!("Repaired {} of {} misaligned components", repaired, issues.len());
    Ok(repaired)
}

fn follow_description(concept: &mut Concept, desc_id: SctId, old_module: SctId, new_module: SctId) -> usize {
    let Some(desc) = concept.description_mut(desc_id) else {
        return 0;
    };
    let mut moved = 0;
    for entry in desc
        .lang_refset_entries_mut()
        .iter_mut()
        .filter(|e| !e.core().is_deleted() && e.module_id() == old_module)
    {
        entry.core_mut().set_module_id(new_module);
        moved += 1;
    }
    moved
}

/// Detects and repairs in one step, returning what was found.
pub fn align_modules(registry: &mut GraphRegistry, config: &AlignmentConfig) -> GraphResult<Vec<AlignmentIssue>> {
    let issues = detect_misalignments(registry, config)?;
    repair_misalignments(registry, &issues)?;
    Ok(issues)
}

/// Components with changes not yet promoted to the parent branch.
///
/// Holds the ids of changed components and of the concepts and descriptions
/// they hang off.
#[derive(Debug, Clone, Default)]
pub struct UnpromotedChanges {
    ids: HashSet<ComponentId>,
}

impl UnpromotedChanges {
    /// Collects the ids in the delta files of `package`.
    ///
    /// With a registry, a changed language entry or description refset member
    /// also marks the concept owning its description.
    pub fn from_package(package: &Rf2Package, registry: Option<&GraphRegistry>) -> GraphResult<Self> {
        let mut changes = Self::default();
        for source in package.files() {
            if source.release != ReleaseType::Delta || source.kind == Rf2FileKind::ModuleDependency {
                continue;
            }
            let reader = package.open_source(source)?;
            let kind = source.kind;
            let rows = for_each_row(reader, &source.name, kind.columns(), |_, record| {
                if let Some(id) = ComponentId::parse(parse::field(record, 0)) {
                    changes.ids.insert(id);
                }
                let reference = match kind {
                    Rf2FileKind::Concept => None,
                    Rf2FileKind::Description
                    | Rf2FileKind::TextDefinition
                    | Rf2FileKind::Relationship
                    | Rf2FileKind::StatedRelationship
                    | Rf2FileKind::ConcreteRelationship => parse::sctid(parse::field(record, 4)).ok(),
                    _ => parse::sctid(parse::field(record, 5)).ok(),
                };
                if let Some(reference) = reference {
                    changes.insert_reference(reference, registry);
                }
                Ok(())
            })?;
            tracing::debug!("Scanned {} changed rows in {}", rows, source.name);
        }
        Ok(changes)
    }

    /// Collects the ids of every dirty component of a live graph.
    pub fn from_graph(registry: &GraphRegistry) -> GraphResult<Self> {
        let mut changes = Self::default();
        for component in registry.dirty_components()? {
            let id = component.component_id();
            changes.ids.insert(id);
            match id {
                ComponentId::Sct(sctid) => {
                    if let Ok(desc) = registry.get_description(sctid) {
                        changes.ids.insert(ComponentId::Sct(desc.concept_id()));
                    } else if let Ok(rel) = registry.get_relationship(sctid) {
                        changes.ids.insert(ComponentId::Sct(rel.source_id()));
                    }
                }
                ComponentId::Member(uuid) => {
                    if let Some((referenced, concept_id)) = registry.member_target(uuid) {
                        changes.ids.insert(ComponentId::Sct(referenced));
                        changes.ids.insert(ComponentId::Sct(concept_id));
                    }
                }
            }
        }
        for member in registry.unattached_members().filter(|m| m.core().is_dirty()) {
            changes.ids.insert(ComponentId::Sct(member.referenced_component_id()));
        }
        Ok(changes)
    }

    fn insert_reference(&mut self, reference: SctId, registry: Option<&GraphRegistry>) {
        self.ids.insert(ComponentId::Sct(reference));
        if let Some(desc) = registry.and_then(|r| r.get_description(reference).ok()) {
            self.ids.insert(ComponentId::Sct(desc.concept_id()));
        }
    }

    /// True if `id` changed or owns something that changed.
    pub fn has_unpromoted_change(&self, id: impl Into<ComponentId>) -> bool {
        self.ids.contains(&id.into())
    }

    /// Number of ids tracked.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
