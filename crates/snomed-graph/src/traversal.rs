//! Hierarchy queries over is-a relationships.
//!
//! Each query walks one characteristic type. Closures are memoized per
//! `(concept, characteristic type, depth, direction)` and the whole cache is
//! dropped on any mutation of the registry.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use snomed_model::{CharacteristicType, SctId};

use crate::error::{GraphError, GraphResult};
use crate::registry::GraphRegistry;

/// How far a hierarchy query reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth {
    /// Direct parents or children only.
    Immediate,
    /// The full transitive closure.
    Transitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Up,
    Down,
}

type CacheKey = (SctId, CharacteristicType, Depth, Direction);
type ChildIndex = HashMap<SctId, Vec<SctId>>;

/// Memoized closures and the derived child adjacency.
#[derive(Debug, Default)]
pub(crate) struct TraversalCache {
    closures: RefCell<HashMap<CacheKey, Arc<BTreeSet<SctId>>>>,
    children: RefCell<HashMap<CharacteristicType, Arc<ChildIndex>>>,
}

impl TraversalCache {
    /// Drops every cached closure and adjacency.
    pub(crate) fn invalidate(&self) {
        self.closures.borrow_mut().clear();
        self.children.borrow_mut().clear();
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<BTreeSet<SctId>>> {
        self.closures.borrow().get(key).cloned()
    }

    fn put(&self, key: CacheKey, value: Arc<BTreeSet<SctId>>) {
        self.closures.borrow_mut().insert(key, value);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.closures.borrow().len()
    }
}

impl GraphRegistry {
    /// Direct is-a parents of a concept.
    pub fn get_parents(&self, id: SctId, characteristic_type: CharacteristicType) -> GraphResult<Vec<SctId>> {
        Ok(self.get_concept(id)?.parent_ids(characteristic_type))
    }

    /// Direct is-a children of a concept, sorted.
    pub fn get_children(&self, id: SctId, characteristic_type: CharacteristicType) -> GraphResult<Vec<SctId>> {
        self.get_concept(id)?;
        Ok(self
            .child_index(characteristic_type)
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    /// Ancestors of a concept, not including itself.
    ///
    /// A parent that is not registered is reported but not expanded.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown concept and `Integrity` if the walk runs
    /// into an is-a cycle.
    pub fn get_ancestors(
        &self,
        id: SctId,
        characteristic_type: CharacteristicType,
        depth: Depth,
    ) -> GraphResult<Arc<BTreeSet<SctId>>> {
        self.get_concept(id)?;
        self.closure(id, characteristic_type, depth, Direction::Up)
    }

    /// Descendants of a concept, not including itself.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown concept and `Integrity` if the walk runs
    /// into an is-a cycle.
    pub fn get_descendants(
        &self,
        id: SctId,
        characteristic_type: CharacteristicType,
        depth: Depth,
    ) -> GraphResult<Arc<BTreeSet<SctId>>> {
        self.get_concept(id)?;
        self.closure(id, characteristic_type, depth, Direction::Down)
    }

    /// True if `id` is `ancestor` or one of its descendants.
    pub fn is_descendant_or_self_of(
        &self,
        id: SctId,
        ancestor: SctId,
        characteristic_type: CharacteristicType,
    ) -> GraphResult<bool> {
        if id == ancestor {
            self.get_concept(id)?;
            return Ok(true);
        }
        Ok(self
            .get_ancestors(id, characteristic_type, Depth::Transitive)?
            .contains(&ancestor))
    }

    fn closure(
        &self,
        id: SctId,
        characteristic_type: CharacteristicType,
        depth: Depth,
        direction: Direction,
    ) -> GraphResult<Arc<BTreeSet<SctId>>> {
        match depth {
            Depth::Immediate => {
                let key = (id, characteristic_type, depth, direction);
                if let Some(hit) = self.cache().get(&key) {
                    return Ok(hit);
                }
                let result: Arc<BTreeSet<SctId>> = Arc::new(
                    self.neighbours(id, characteristic_type, direction)
                        .into_iter()
                        .collect(),
                );
                self.cache().put(key, Arc::clone(&result));
                Ok(result)
            }
            Depth::Transitive => {
                let mut on_path = HashSet::new();
                self.expand(id, characteristic_type, direction, &mut on_path)
            }
        }
    }

    fn expand(
        &self,
        id: SctId,
        characteristic_type: CharacteristicType,
        direction: Direction,
        on_path: &mut HashSet<SctId>,
    ) -> GraphResult<Arc<BTreeSet<SctId>>> {
        let key = (id, characteristic_type, Depth::Transitive, direction);
        if let Some(hit) = self.cache().get(&key) {
            return Ok(hit);
        }
        if !on_path.insert(id) {
            return Err(GraphError::Integrity(format!(
                "is-a cycle through concept {} ({:?})",
                id, characteristic_type
            )));
        }

        let mut result = BTreeSet::new();
        for next in self.neighbours(id, characteristic_type, direction) {
            result.insert(next);
            if self.concept_map().contains_key(&next) {
                let further = self.expand(next, characteristic_type, direction, on_path)?;
                result.extend(further.iter().copied());
            }
        }
        on_path.remove(&id);

        let result = Arc::new(result);
        self.cache().put(key, Arc::clone(&result));
        Ok(result)
    }

    fn neighbours(&self, id: SctId, characteristic_type: CharacteristicType, direction: Direction) -> Vec<SctId> {
        match direction {
            Direction::Up => self
                .concept_map()
                .get(&id)
                .map(|c| c.parent_ids(characteristic_type))
                .unwrap_or_default(),
            Direction::Down => self
                .child_index(characteristic_type)
                .get(&id)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Child adjacency, rebuilt from the is-a relationships when missing.
    fn child_index(&self, characteristic_type: CharacteristicType) -> Arc<ChildIndex> {
        if let Some(index) = self.cache().children.borrow().get(&characteristic_type) {
            return Arc::clone(index);
        }

        let mut index: ChildIndex = HashMap::new();
        for concept in self.concept_map().values() {
            for parent in concept.parent_ids(characteristic_type) {
                index.entry(parent).or_default().push(concept.id());
            }
        }
        for children in index.values_mut() {
            children.sort_unstable();
        }
        tracing::debug!(
            "Built {:?} child index over {} parents",
            characteristic_type,
            index.len()
        );

        let index = Arc::new(index);
        self.cache()
            .children
            .borrow_mut()
            .insert(characteristic_type, Arc::clone(&index));
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rf2::Rf2Package;
    use snomed_model::{well_known, Concept, DefinitionStatus, Relationship};

    const MODULE: SctId = well_known::SNOMED_CT_CORE_MODULE;
    const STATED: CharacteristicType = CharacteristicType::Stated;

    fn make_registry() -> GraphRegistry {
        GraphRegistry::from_package(&Rf2Package::new()).unwrap()
    }

    fn make_concept(registry: &mut GraphRegistry, id: SctId, parents: &[SctId]) {
        let mut concept = Concept::new(id, MODULE, DefinitionStatus::Primitive);
        for (i, &parent) in parents.iter().enumerate() {
            concept.add_relationship(Relationship::is_a(id * 100 + i as u64, id, parent, STATED, MODULE));
        }
        registry.register_concept(concept).unwrap();
    }

    // root <- a <- b <- c, root <- d <- c
    fn make_diamond() -> GraphRegistry {
        let mut registry = make_registry();
        make_concept(&mut registry, 1, &[]);
        make_concept(&mut registry, 2, &[1]);
        make_concept(&mut registry, 3, &[2]);
        make_concept(&mut registry, 4, &[1]);
        make_concept(&mut registry, 5, &[3, 4]);
        registry
    }

    #[test]
    fn test_ancestors_and_descendants() {
        let registry = make_diamond();
        assert_eq!(
            *registry.get_ancestors(5, STATED, Depth::Transitive).unwrap(),
            BTreeSet::from([1, 2, 3, 4])
        );
        assert_eq!(
            *registry.get_ancestors(5, STATED, Depth::Immediate).unwrap(),
            BTreeSet::from([3, 4])
        );
        assert_eq!(
            *registry.get_descendants(1, STATED, Depth::Transitive).unwrap(),
            BTreeSet::from([2, 3, 4, 5])
        );
        assert_eq!(registry.get_children(1, STATED).unwrap(), vec![2, 4]);
        assert!(registry
            .get_ancestors(5, CharacteristicType::Inferred, Depth::Transitive)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_leaf_and_root_boundaries() {
        let registry = make_diamond();
        assert!(registry.get_descendants(5, STATED, Depth::Transitive).unwrap().is_empty());
        assert!(registry.get_ancestors(1, STATED, Depth::Transitive).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_concept_is_not_found() {
        let registry = make_diamond();
        assert!(matches!(
            registry.get_ancestors(99, STATED, Depth::Transitive),
            Err(GraphError::NotFound { .. })
        ));
    }

    #[test]
    fn test_unregistered_parent_is_reported_not_expanded() {
        let mut registry = make_registry();
        make_concept(&mut registry, 7, &[404684003]);
        assert_eq!(
            *registry.get_ancestors(7, STATED, Depth::Transitive).unwrap(),
            BTreeSet::from([404684003])
        );
    }

    #[test]
    fn test_cycle_is_integrity_error() {
        let mut registry = make_registry();
        make_concept(&mut registry, 1, &[]);
        make_concept(&mut registry, 2, &[1]);
        make_concept(&mut registry, 3, &[2]);
        registry
            .add_relationship(Relationship::is_a(9001, 2, 3, STATED, MODULE))
            .unwrap();

        assert!(matches!(
            registry.get_ancestors(3, STATED, Depth::Transitive),
            Err(GraphError::Integrity(_))
        ));
        assert!(matches!(
            registry.get_descendants(1, STATED, Depth::Transitive),
            Err(GraphError::Integrity(_))
        ));
    }

    #[test]
    fn test_mutation_invalidates_cache() {
        let mut registry = make_diamond();
        registry.get_ancestors(5, STATED, Depth::Transitive).unwrap();
        assert!(registry.cache().len() > 0);

        make_concept(&mut registry, 6, &[5]);
        assert_eq!(registry.cache().len(), 0);
        assert!(registry.is_descendant_or_self_of(6, 1, STATED).unwrap());
        assert!(registry.is_descendant_or_self_of(6, 6, STATED).unwrap());
        assert!(!registry.is_descendant_or_self_of(4, 2, STATED).unwrap());
    }
}
