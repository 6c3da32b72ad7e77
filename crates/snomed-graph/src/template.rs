//! Template creation engine.
//!
//! A [`CreationPattern`] describes a new concept in terms of an existing
//! "inspiration" concept `[X]` and an optional second concept `[Y]` derived
//! from it. Instantiating a pattern yields a [`PrototypeSet`]: the new concept
//! plus any concepts its parent, child and sibling sub-patterns had to
//! synthesize. Nothing is registered until [`TemplateEngine::register`] is
//! called.

use snomed_model::{
    Acceptability, CaseSignificance, CharacteristicType, Concept, DefinitionStatus,
    Description, DescriptionType, Partition, Relationship, SctId, SctIdGenerator,
};

use crate::batch::{run_batch, BatchOutcome};
use crate::config::TemplateConfig;
use crate::error::{GraphError, GraphResult};
use crate::registry::GraphRegistry;

/// Placeholder for the inspiration concept.
pub const X_PLACEHOLDER: &str = "[X]";
/// Placeholder for the concept chosen by the pattern's [`YStrategy`].
pub const Y_PLACEHOLDER: &str = "[Y]";

/// How `[Y]` is derived from `[X]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YStrategy {
    /// The single inferred parent of `[X]`.
    ImmediateInferredParentOfX,
    /// The single stated parent of `[X]`.
    ImmediateStatedParentOfX,
    /// Always this concept.
    Fixed(SctId),
}

/// A declarative recipe for a new concept.
///
/// Sub-patterns share the `[X]` and `[Y]` of the pattern they belong to.
/// Without parent sub-patterns the new concept's parent is `[Y]`.
///
/// # Examples
///
/// ```
/// use snomed_graph::{CreationPattern, YStrategy};
///
/// let pattern = CreationPattern::new("structure", "[X] structure", "(body structure)")
///     .with_y_strategy(YStrategy::ImmediateInferredParentOfX)
///     .with_parent(CreationPattern::new("parent", "[Y]", "body structure"));
///
/// assert_eq!(pattern.semantic_tag(), "body structure");
/// assert_eq!(pattern.parents().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationPattern {
    name: String,
    term_template: String,
    semantic_tag: String,
    definition_status: DefinitionStatus,
    y_strategy: Option<YStrategy>,
    parents: Vec<CreationPattern>,
    children: Vec<CreationPattern>,
    siblings: Vec<CreationPattern>,
    inspiration: Vec<SctId>,
}

impl CreationPattern {
    /// Creates a primitive-concept pattern. The semantic tag may be given
    /// with or without parentheses.
    pub fn new(name: impl Into<String>, term_template: impl Into<String>, semantic_tag: &str) -> Self {
        let tag = semantic_tag.trim();
        let tag = tag.strip_prefix('(').unwrap_or(tag);
        let tag = tag.strip_suffix(')').unwrap_or(tag);
        Self {
            name: name.into(),
            term_template: term_template.into(),
            semantic_tag: tag.to_string(),
            definition_status: DefinitionStatus::Primitive,
            y_strategy: None,
            parents: Vec::new(),
            children: Vec::new(),
            siblings: Vec::new(),
            inspiration: Vec::new(),
        }
    }

    /// Sets how `[Y]` is resolved.
    pub fn with_y_strategy(mut self, strategy: YStrategy) -> Self {
        self.y_strategy = Some(strategy);
        self
    }

    /// Sets the definition status of the synthesized concept.
    pub fn with_definition_status(mut self, definition_status: DefinitionStatus) -> Self {
        self.definition_status = definition_status;
        self
    }

    /// Adds a sub-pattern producing a parent of the new concept.
    pub fn with_parent(mut self, pattern: CreationPattern) -> Self {
        self.parents.push(pattern);
        self
    }

    /// Adds a sub-pattern producing a child of the new concept.
    pub fn with_child(mut self, pattern: CreationPattern) -> Self {
        self.children.push(pattern);
        self
    }

    /// Adds a sub-pattern producing a sibling that shares the new concept's
    /// parents.
    pub fn with_sibling(mut self, pattern: CreationPattern) -> Self {
        self.siblings.push(pattern);
        self
    }

    /// Requires inspiration concepts to descend from `concept_id`.
    pub fn with_inspiration(mut self, concept_id: SctId) -> Self {
        self.inspiration.push(concept_id);
        self
    }

    /// Pattern name used in reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Term template containing `[X]` and `[Y]`.
    pub fn term_template(&self) -> &str {
        &self.term_template
    }

    /// Semantic tag without parentheses.
    pub fn semantic_tag(&self) -> &str {
        &self.semantic_tag
    }

    /// `[Y]` strategy, if any.
    pub fn y_strategy(&self) -> Option<YStrategy> {
        self.y_strategy
    }

    /// Parent sub-patterns.
    pub fn parents(&self) -> &[CreationPattern] {
        &self.parents
    }

    /// Required inspiration concepts.
    pub fn inspiration(&self) -> &[SctId] {
        &self.inspiration
    }
}

/// The concepts one pattern instantiation produced.
#[derive(Debug, Clone)]
pub struct PrototypeSet {
    /// The `[X]` concept.
    pub inspiration: SctId,
    /// The concept the pattern itself describes.
    pub primary: Concept,
    /// Concepts synthesized by sub-patterns.
    pub derived: Vec<Concept>,
    /// Existing concepts sub-patterns resolved to instead of synthesizing.
    pub reused: Vec<SctId>,
}

impl PrototypeSet {
    /// The primary concept followed by the derived ones.
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        std::iter::once(&self.primary).chain(self.derived.iter())
    }
}

#[derive(Debug, Clone)]
struct Term {
    text: String,
    case_significance: CaseSignificance,
}

struct Instantiation<'r> {
    registry: &'r GraphRegistry,
    pattern: String,
    x: Term,
    y: Option<(SctId, Term)>,
    created: Vec<Concept>,
    reused: Vec<SctId>,
}

impl Instantiation<'_> {
    fn error(&self, message: impl Into<String>) -> GraphError {
        GraphError::PatternResolution {
            pattern: self.pattern.clone(),
            message: message.into(),
        }
    }
}

/// Instantiates creation patterns against a registry.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    config: TemplateConfig,
    ids: SctIdGenerator,
}

impl TemplateEngine {
    /// Creates an engine allocating ids in the configured namespace.
    pub fn new(config: TemplateConfig) -> Self {
        let ids = SctIdGenerator::new(config.namespace, config.first_item);
        Self { config, ids }
    }

    /// Engine settings.
    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// True if every required inspiration concept of `pattern` has at least
    /// one candidate at or below it in the inferred hierarchy.
    pub fn takes_inspiration(
        &self,
        registry: &GraphRegistry,
        pattern: &CreationPattern,
        candidates: &[SctId],
    ) -> GraphResult<bool> {
        for &required in pattern.inspiration() {
            let mut matched = false;
            for &candidate in candidates {
                if registry.is_descendant_or_self_of(candidate, required, CharacteristicType::Inferred)? {
                    matched = true;
                    break;
                }
            }
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Builds the concepts `pattern` describes for inspiration concept `x`.
    ///
    /// The registry is only read. Sub-patterns whose FSN already exists
    /// resolve to the existing concept.
    ///
    /// # Errors
    ///
    /// `PatternResolution` when `x` is outside the pattern's inspiration,
    /// `[Y]` cannot be resolved, or the primary concept already exists.
    pub fn create_prototype(
        &mut self,
        registry: &GraphRegistry,
        pattern: &CreationPattern,
        x: SctId,
    ) -> GraphResult<PrototypeSet> {
        let resolution = |message: String| GraphError::PatternResolution {
            pattern: pattern.name().to_string(),
            message,
        };

        let x_concept = registry.get_concept(x)?;
        if !self.takes_inspiration(registry, pattern, &[x])? {
            return Err(resolution(format!("{} is not a valid inspiration", x)));
        }
        let x_term = self
            .term_of(x_concept)
            .ok_or_else(|| resolution(format!("{} has no usable term", x)))?;

        let y = match pattern.y_strategy() {
            None => None,
            Some(strategy) => {
                let y_id = resolve_y(registry, strategy, x).map_err(resolution)?;
                let y_term = self
                    .term_of(registry.get_concept(y_id)?)
                    .ok_or_else(|| resolution(format!("{} has no usable term", y_id)))?;
                Some((y_id, y_term))
            }
        };

        let mut build = Instantiation {
            registry,
            pattern: pattern.name().to_string(),
            x: x_term,
            y,
            created: Vec::new(),
            reused: Vec::new(),
        };
        let primary_id = self.instantiate(&mut build, pattern, None, true)?;
        let index = build
            .created
            .iter()
            .position(|c| c.id() == primary_id)
            .ok_or_else(|| build.error("primary concept was not synthesized"))?;
        let primary = build.created.remove(index);

        tracing::debug!(
            "Pattern '{}' on {}: new concept {} with {} derived",
            pattern.name(),
            x,
            primary_id,
            build.created.len()
        );
        Ok(PrototypeSet {
            inspiration: x,
            primary,
            derived: build.created,
            reused: build.reused,
        })
    }

    /// Runs [`TemplateEngine::create_prototype`] for each inspiration concept,
    /// collecting the recoverable failures.
    pub fn create_prototypes(
        &mut self,
        registry: &GraphRegistry,
        pattern: &CreationPattern,
        xs: &[SctId],
    ) -> GraphResult<BatchOutcome<PrototypeSet>> {
        run_batch(xs.iter().copied(), |&x| self.create_prototype(registry, pattern, x))
    }

    /// Registers every concept of a prototype set. Returns the primary id.
    pub fn register(&self, registry: &mut GraphRegistry, set: PrototypeSet) -> GraphResult<SctId> {
        for concept in set.derived {
            registry.register_concept(concept)?;
        }
        let id = registry.register_concept(set.primary)?;
        tracing::info!("Registered concept {} inspired by {}", id, set.inspiration);
        Ok(id)
    }

    fn instantiate(
        &mut self,
        build: &mut Instantiation<'_>,
        pattern: &CreationPattern,
        parents_override: Option<Vec<SctId>>,
        primary: bool,
    ) -> GraphResult<SctId> {
        let (term, case_significance) = render(pattern.term_template(), &build.x, build.y.as_ref())
            .map_err(|message| build.error(message))?;
        let fsn = format!("{} ({})", term, pattern.semantic_tag());

        let registry = build.registry;
        if let Some(existing) = registry.find_by_fsn(&fsn)? {
            if primary {
                return Err(build.error(format!("'{}' already exists as {}", fsn, existing.id())));
            }
            build.reused.push(existing.id());
            return Ok(existing.id());
        }
        if let Some(pending) = build
            .created
            .iter()
            .find(|c| c.fsn().is_some_and(|d| d.term() == fsn))
        {
            return Ok(pending.id());
        }

        let parents = match parents_override {
            Some(parents) => parents,
            None if pattern.parents.is_empty() => match &build.y {
                Some((y, _)) => vec![*y],
                None => return Err(build.error("no parent sub-pattern and no [Y] to default to")),
            },
            None => {
                let mut parents = Vec::with_capacity(pattern.parents.len());
                for sub in &pattern.parents {
                    parents.push(self.instantiate(build, sub, None, false)?);
                }
                parents
            }
        };

        let module_id = self.config.module_id;
        let id = self.allocate(registry, Partition::Concept);
        let mut concept = Concept::new(id, module_id, pattern.definition_status);
        let fsn_description = self.description(registry, id, fsn, DescriptionType::Fsn, case_significance);
        concept.add_description(fsn_description);
        let synonym = self.description(registry, id, term, DescriptionType::Synonym, case_significance);
        concept.add_description(synonym);
        for &parent in &parents {
            let rel_id = self.allocate(registry, Partition::Relationship);
            concept.add_relationship(Relationship::is_a(
                rel_id,
                id,
                parent,
                CharacteristicType::Stated,
                module_id,
            ));
        }
        build.created.push(concept);

        for sub in &pattern.children {
            self.instantiate(build, sub, Some(vec![id]), false)?;
        }
        for sub in &pattern.siblings {
            self.instantiate(build, sub, Some(parents.clone()), false)?;
        }
        Ok(id)
    }

    fn description(
        &mut self,
        registry: &GraphRegistry,
        concept_id: SctId,
        term: String,
        description_type: DescriptionType,
        case_significance: CaseSignificance,
    ) -> Description {
        let id = self.allocate(registry, Partition::Description);
        let mut description = Description::new(
            id,
            concept_id,
            term,
            description_type,
            case_significance,
            self.config.module_id,
        );
        for &refset in &self.config.language_refsets {
            description.set_acceptability(refset, Acceptability::Preferred);
        }
        description
    }

    fn allocate(&mut self, registry: &GraphRegistry, partition: Partition) -> SctId {
        loop {
            let id = self.ids.next_id(partition);
            if id != 0 && !registry.sctid_in_use(id) {
                return id;
            }
        }
    }

    /// FSN without its tag, or the preferred synonym when there is no FSN.
    fn term_of(&self, concept: &Concept) -> Option<Term> {
        if let Some(fsn) = concept.fsn() {
            return Some(Term {
                text: fsn.term_without_tag().to_string(),
                case_significance: fsn.case_significance(),
            });
        }
        self.config
            .language_refsets
            .iter()
            .find_map(|&refset| concept.preferred_synonym(refset))
            .map(|d| Term {
                text: d.term().to_string(),
                case_significance: d.case_significance(),
            })
    }
}

fn resolve_y(registry: &GraphRegistry, strategy: YStrategy, x: SctId) -> Result<SctId, String> {
    let characteristic_type = match strategy {
        YStrategy::Fixed(id) => return Ok(id),
        YStrategy::ImmediateInferredParentOfX => CharacteristicType::Inferred,
        YStrategy::ImmediateStatedParentOfX => CharacteristicType::Stated,
    };
    let parents = registry
        .get_parents(x, characteristic_type)
        .map_err(|e| e.to_string())?;
    match parents.as_slice() {
        [parent] => Ok(*parent),
        _ => Err(format!(
            "{} has {} {:?} parents, expected exactly one",
            x,
            parents.len(),
            characteristic_type
        )),
    }
}

/// Substitutes `[X]` and `[Y]` into `template`.
///
/// Values placed after the start of the term lose their initial capital
/// unless their initial character is case sensitive. Returns the term and
/// its case significance.
fn render(template: &str, x: &Term, y: Option<&(SctId, Term)>) -> Result<(String, CaseSignificance), String> {
    let mut out = String::with_capacity(template.len() + x.text.len());
    let mut significance = CaseSignificance::CaseInsensitive;
    let mut rest = template;

    while let Some(start) = rest.find('[') {
        let tail = &rest[start..];
        let (token, value) = if tail.starts_with(X_PLACEHOLDER) {
            (X_PLACEHOLDER, x)
        } else if tail.starts_with(Y_PLACEHOLDER) {
            match y {
                Some((_, term)) => (Y_PLACEHOLDER, term),
                None => return Err("template uses [Y] but the pattern resolves no [Y]".to_string()),
            }
        } else {
            out.push_str(&rest[..=start]);
            rest = &rest[start + 1..];
            continue;
        };

        out.push_str(&rest[..start]);
        let at_start = out.is_empty();
        match value.case_significance {
            CaseSignificance::EntireTermCaseSensitive => {
                out.push_str(&value.text);
                significance = if at_start {
                    CaseSignificance::EntireTermCaseSensitive
                } else if significance == CaseSignificance::CaseInsensitive {
                    CaseSignificance::InitialCharacterCaseInsensitive
                } else {
                    significance
                };
            }
            other => {
                if at_start {
                    out.push_str(&value.text);
                } else {
                    out.push_str(&decapitalize(&value.text));
                }
                if other == CaseSignificance::InitialCharacterCaseInsensitive
                    && significance == CaseSignificance::CaseInsensitive
                {
                    significance = CaseSignificance::InitialCharacterCaseInsensitive;
                }
            }
        }
        rest = &rest[start + token.len()..];
    }
    out.push_str(rest);
    Ok((out, significance))
}

fn decapitalize(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
