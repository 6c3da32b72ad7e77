//! Module dependency relation.
//!
//! Built from the active rows of the module dependency reference set. A module
//! may reference content in itself and in every module it depends on,
//! directly or transitively.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use snomed_model::SctId;

/// Directed "depends on" edges between modules.
///
/// The real releases contain mutual dependencies (the core and model
/// component modules depend on each other), so the closure tolerates cycles.
///
/// # Examples
///
/// ```
/// use snomed_graph::ModuleDependencies;
///
/// let mut deps = ModuleDependencies::new();
/// deps.add(21000210109, 900000000000207008);
/// deps.add(900000000000207008, 900000000000012004);
///
/// assert!(deps.may_reference(21000210109, 900000000000012004));
/// assert!(!deps.may_reference(900000000000207008, 21000210109));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModuleDependencies {
    edges: BTreeMap<SctId, BTreeSet<SctId>>,
}

impl ModuleDependencies {
    /// Creates an empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `module_id` depends on `target_module_id`.
    pub fn add(&mut self, module_id: SctId, target_module_id: SctId) {
        if module_id != target_module_id {
            self.edges.entry(module_id).or_default().insert(target_module_id);
        }
    }

    /// Removes a recorded dependency.
    pub fn remove(&mut self, module_id: SctId, target_module_id: SctId) {
        if let Some(targets) = self.edges.get_mut(&module_id) {
            targets.remove(&target_module_id);
            if targets.is_empty() {
                self.edges.remove(&module_id);
            }
        }
    }

    /// Modules `module_id` depends on directly.
    pub fn direct(&self, module_id: SctId) -> BTreeSet<SctId> {
        self.edges.get(&module_id).cloned().unwrap_or_default()
    }

    /// Every module `module_id` depends on, excluding itself.
    pub fn transitive(&self, module_id: SctId) -> BTreeSet<SctId> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<SctId> = self.direct(module_id).into_iter().collect();
        while let Some(next) = queue.pop_front() {
            if next == module_id || !seen.insert(next) {
                continue;
            }
            if let Some(targets) = self.edges.get(&next) {
                queue.extend(targets.iter().copied());
            }
        }
        seen
    }

    /// True if content in module `from` may point at content in module `to`.
    pub fn may_reference(&self, from: SctId, to: SctId) -> bool {
        from == to || self.transitive(from).contains(&to)
    }

    /// Number of modules with at least one dependency.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True if no dependency is recorded.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
