//! Proximal primitive parent inference.
//!
//! The proximal primitive parents of a concept are the most specific active
//! primitive concepts among its ancestors: every primitive ancestor that is
//! not itself an ancestor of another primitive ancestor. A primitive concept
//! that has a further primitive ancestor (outside the configured exemptions)
//! is an intermediate primitive.

use std::collections::BTreeSet;

use snomed_model::{Component, SctId};

use crate::config::PrimitiveConfig;
use crate::error::GraphResult;
use crate::registry::GraphRegistry;
use crate::traversal::Depth;

/// Proximal primitive parents of one concept and what they say about its
/// modeling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProximalPrimitiveReport {
    /// The concept examined.
    pub concept_id: SctId,
    /// Its proximal primitive parents, sorted.
    pub proximal_primitive_parents: Vec<SctId>,
    /// Members of `proximal_primitive_parents` that are intermediate
    /// primitives.
    pub intermediate_primitives: Vec<SctId>,
    /// Its direct parents in the examined hierarchy, sorted.
    pub parents: Vec<SctId>,
    /// True when `parents` equals `proximal_primitive_parents`.
    pub parents_match: bool,
}

impl GraphRegistry {
    /// Proximal primitive parents over the stated hierarchy, sorted by id.
    pub fn determine_proximal_primitive_parents(&self, id: SctId) -> GraphResult<Vec<SctId>> {
        self.determine_proximal_primitive_parents_with(id, &PrimitiveConfig::default())
    }

    /// Proximal primitive parents over the configured hierarchy.
    pub fn determine_proximal_primitive_parents_with(
        &self,
        id: SctId,
        config: &PrimitiveConfig,
    ) -> GraphResult<Vec<SctId>> {
        let ct = config.characteristic_type;
        let ancestors = self.get_ancestors(id, ct, Depth::Transitive)?;
        let candidates: Vec<SctId> = ancestors
            .iter()
            .copied()
            .filter(|&a| self.is_live_primitive(a))
            .collect();

        let mut subsumed = BTreeSet::new();
        for &candidate in &candidates {
            let above = self.get_ancestors(candidate, ct, Depth::Transitive)?;
            subsumed.extend(candidates.iter().copied().filter(|c| above.contains(c)));
        }

        Ok(candidates
            .into_iter()
            .filter(|c| !subsumed.contains(c))
            .collect())
    }

    /// True if `id` is primitive and has a primitive ancestor that is not
    /// exempt.
    pub fn is_intermediate_primitive(&self, id: SctId, config: &PrimitiveConfig) -> GraphResult<bool> {
        if !self.get_concept(id)?.is_primitive() {
            return Ok(false);
        }
        let ancestors = self.get_ancestors(id, config.characteristic_type, Depth::Transitive)?;
        Ok(ancestors
            .iter()
            .any(|&a| !config.exempt_ancestors.contains(&a) && self.is_live_primitive(a)))
    }

    /// Full proximal primitive analysis of one concept.
    pub fn proximal_primitive_report(
        &self,
        id: SctId,
        config: &PrimitiveConfig,
    ) -> GraphResult<ProximalPrimitiveReport> {
        let proximal_primitive_parents = self.determine_proximal_primitive_parents_with(id, config)?;
        let mut intermediate_primitives = Vec::new();
        for &parent in &proximal_primitive_parents {
            if self.is_intermediate_primitive(parent, config)? {
                intermediate_primitives.push(parent);
            }
        }
        let parents = self.get_parents(id, config.characteristic_type)?;
        let parents_match = parents == proximal_primitive_parents;

        Ok(ProximalPrimitiveReport {
            concept_id: id,
            proximal_primitive_parents,
            intermediate_primitives,
            parents,
            parents_match,
        })
    }

    /// Every active intermediate primitive in the graph, sorted.
    pub fn find_intermediate_primitives(&self, config: &PrimitiveConfig) -> GraphResult<Vec<SctId>> {
        let mut primitives: Vec<SctId> = self
            .get_all_concepts()?
            .filter(|c| c.is_active_safely() && !c.core().is_deleted() && c.is_primitive())
            .map(|c| c.id())
            .collect();
        primitives.sort_unstable();

        let mut found = Vec::new();
        for id in primitives {
            if self.is_intermediate_primitive(id, config)? {
                found.push(id);
            }
        }
        tracing::info!("Found {} intermediate primitives", found.len());
        Ok(found)
    }

    fn is_live_primitive(&self, id: SctId) -> bool {
        self.concept_map()
            .get(&id)
            .is_some_and(|c| c.is_active_safely() && !c.core().is_deleted() && c.is_primitive())
    }
}
