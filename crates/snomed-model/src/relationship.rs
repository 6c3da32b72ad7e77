//! Relationships between a concept and another concept or a literal value.

use std::fmt;

use crate::{
    well_known, CharacteristicType, Component, ComponentCore, ComponentId, ComponentType,
    ModifierType, SctId,
};

/// A concrete-domain literal.
///
/// RF2 writes strings in double quotes and numbers with a `#` prefix. Decimal
/// text is kept verbatim so a value is written back exactly as it was read.
///
/// # Examples
///
/// ```
/// use snomed_model::ConcreteValue;
///
/// let dose = ConcreteValue::parse("#0.50").unwrap();
/// assert_eq!(dose.to_string(), "#0.50");
/// assert_eq!(ConcreteValue::parse("#500"), Some(ConcreteValue::Integer(500)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConcreteValue {
    /// A string value (e.g., "tablet").
    String(String),
    /// An integer value in canonical form (e.g., 500).
    Integer(i64),
    /// Any other numeric literal, stored as written without the `#`.
    Decimal(String),
}

impl ConcreteValue {
    /// Parses an RF2 `value` column.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            return Some(ConcreteValue::String(s[1..s.len() - 1].to_string()));
        }

        let number = s.strip_prefix('#')?;
        if let Ok(i) = number.parse::<i64>() {
            if i.to_string() == number {
                return Some(ConcreteValue::Integer(i));
            }
        }
        if number.parse::<f64>().is_ok() {
            return Some(ConcreteValue::Decimal(number.to_string()));
        }
        None
    }

    /// Returns the type name as a string.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConcreteValue::String(_) => "string",
            ConcreteValue::Integer(_) => "integer",
            ConcreteValue::Decimal(_) => "decimal",
        }
    }
}

impl fmt::Display for ConcreteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcreteValue::String(s) => write!(f, "\"{}\"", s),
            ConcreteValue::Integer(i) => write!(f, "#{}", i),
            ConcreteValue::Decimal(d) => write!(f, "#{}", d),
        }
    }
}

/// What a relationship points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelationshipTarget {
    /// A destination concept.
    Concept(SctId),
    /// A literal value.
    Concrete(ConcreteValue),
}

impl RelationshipTarget {
    /// The destination concept, if this is not a concrete value.
    pub fn concept_id(&self) -> Option<SctId> {
        match self {
            RelationshipTarget::Concept(id) => Some(*id),
            RelationshipTarget::Concrete(_) => None,
        }
    }
}

/// A relationship owned by its source concept.
///
/// # Examples
///
/// ```
/// use snomed_model::{CharacteristicType, Relationship, well_known};
///
/// let rel = Relationship::is_a(
///     100000028,
///     73211009,
///     362969004,
///     CharacteristicType::Stated,
///     well_known::SNOMED_CT_CORE_MODULE,
/// );
/// assert!(rel.is_is_a());
/// assert_eq!(rel.target().concept_id(), Some(362969004));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relationship {
    id: SctId,
    core: ComponentCore,
    source_id: SctId,
    type_id: SctId,
    target: RelationshipTarget,
    group: u16,
    union_group: u16,
    characteristic_type: CharacteristicType,
    modifier: ModifierType,
}

impl Relationship {
    /// Creates a new, unpublished relationship.
    pub fn new(
        id: SctId,
        source_id: SctId,
        type_id: SctId,
        target: RelationshipTarget,
        group: u16,
        characteristic_type: CharacteristicType,
        module_id: SctId,
    ) -> Self {
        Self {
            id,
            core: ComponentCore::new(module_id),
            source_id,
            type_id,
            target,
            group,
            union_group: 0,
            characteristic_type,
            modifier: ModifierType::Existential,
        }
    }

    /// Creates a new, unpublished is-a relationship in group 0.
    pub fn is_a(
        id: SctId,
        source_id: SctId,
        parent_id: SctId,
        characteristic_type: CharacteristicType,
        module_id: SctId,
    ) -> Self {
        Self::new(
            id,
            source_id,
            well_known::IS_A,
            RelationshipTarget::Concept(parent_id),
            0,
            characteristic_type,
            module_id,
        )
    }

    /// Rebuilds a relationship from stored state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: SctId,
        core: ComponentCore,
        source_id: SctId,
        type_id: SctId,
        target: RelationshipTarget,
        group: u16,
        characteristic_type: CharacteristicType,
        modifier: ModifierType,
    ) -> Self {
        Self {
            id,
            core,
            source_id,
            type_id,
            target,
            group,
            union_group: 0,
            characteristic_type,
            modifier,
        }
    }

    /// Relationship SCTID.
    pub fn id(&self) -> SctId {
        self.id
    }

    /// Source concept.
    pub fn source_id(&self) -> SctId {
        self.source_id
    }

    /// Attribute type.
    pub fn type_id(&self) -> SctId {
        self.type_id
    }

    /// Destination concept or value.
    pub fn target(&self) -> &RelationshipTarget {
        &self.target
    }

    /// Relationship group, 0 for ungrouped.
    pub fn group(&self) -> u16 {
        self.group
    }

    /// Union group. Authoring only, never written to RF2.
    pub fn union_group(&self) -> u16 {
        self.union_group
    }

    /// Stated, inferred or additional.
    pub fn characteristic_type(&self) -> CharacteristicType {
        self.characteristic_type
    }

    /// Existential or universal.
    pub fn modifier(&self) -> ModifierType {
        self.modifier
    }

    /// Returns true if this is an IS_A relationship.
    pub fn is_is_a(&self) -> bool {
        self.type_id == well_known::IS_A
    }

    /// True for an active is-a edge to a concept of the given characteristic type.
    pub fn is_active_is_a(&self, characteristic_type: CharacteristicType) -> bool {
        self.is_is_a()
            && self.characteristic_type == characteristic_type
            && self.core.is_active_safely()
            && !self.core.is_deleted()
            && self.target.concept_id().is_some()
    }

    /// Same type, target, group and characteristic type.
    pub fn same_definition(&self, other: &Relationship) -> bool {
        self.type_id == other.type_id
            && self.target == other.target
            && self.group == other.group
            && self.characteristic_type == other.characteristic_type
    }

    /// Changes the group.
    pub fn set_group(&mut self, group: u16) {
        let changed = self.group != group;
        self.group = group;
        self.core.touch(changed);
    }

    /// Changes the union group.
    pub fn set_union_group(&mut self, union_group: u16) {
        self.union_group = union_group;
        self.core.mark_dirty();
    }

    /// Changes the destination.
    pub fn set_target(&mut self, target: RelationshipTarget) {
        let changed = self.target != target;
        self.target = target;
        self.core.touch(changed);
    }

    /// Changes the modifier.
    pub fn set_modifier(&mut self, modifier: ModifierType) {
        let changed = self.modifier != modifier;
        self.modifier = modifier;
        self.core.touch(changed);
    }
}

impl Component for Relationship {
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
        match (&self.target, self.characteristic_type) {
            (RelationshipTarget::Concrete(_), _) => ComponentType::ConcreteRelationship,
            (_, CharacteristicType::Stated) => ComponentType::StatedRelationship,
            _ => ComponentType::InferredRelationship,
        }
    }

    fn to_exchange_row(&self) -> Vec<String> {
        let mut row = self.base_fields();
        row.push(self.source_id.to_string());
        row.push(match &self.target {
            RelationshipTarget::Concept(id) => id.to_string(),
            RelationshipTarget::Concrete(value) => value.to_string(),
        });
        row.push(self.group.to_string());
        row.push(self.type_id.to_string());
        row.push(self.characteristic_type.to_id().to_string());
        row.push(self.modifier.to_id().to_string());
        row
    }
}
