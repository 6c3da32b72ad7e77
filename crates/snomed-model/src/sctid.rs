//! SNOMED CT identifiers.
//!
//! Concepts, descriptions and relationships are identified by SCTIDs, 64-bit
//! integers carrying a partition identifier and a Verhoeff check digit.
//! Reference set members are identified by UUIDs. [`ComponentId`] wraps both
//! so callers can treat any component identifier opaquely.

use std::fmt;

use uuid::Uuid;

/// A SNOMED CT identifier (SCTID).
///
/// # Examples
///
/// ```
/// use snomed_model::SctId;
///
/// let concept_id: SctId = 73211009; // Diabetes mellitus
/// let is_a_type: SctId = 116680003; // IS_A relationship type
/// ```
pub type SctId = u64;

/// Identifier of any versioned component in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComponentId {
    /// Concept, description or relationship.
    Sct(SctId),
    /// Reference set member.
    Member(Uuid),
}

impl ComponentId {
    /// Parses an identifier as it appears in the first column of an RF2 row.
    ///
    /// All-digit values are SCTIDs, anything else must be a UUID.
    pub fn parse(value: &str) -> Option<Self> {
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            return value.parse().ok().map(ComponentId::Sct);
        }
        Uuid::parse_str(value).ok().map(ComponentId::Member)
    }

    /// Returns the SCTID if this identifies a core component.
    pub fn as_sctid(&self) -> Option<SctId> {
        match self {
            ComponentId::Sct(id) => Some(*id),
            ComponentId::Member(_) => None,
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Sct(id) => write!(f, "{}", id),
            ComponentId::Member(uuid) => write!(f, "{}", uuid),
        }
    }
}

impl From<SctId> for ComponentId {
    fn from(id: SctId) -> Self {
        ComponentId::Sct(id)
    }
}

impl From<Uuid> for ComponentId {
    fn from(id: Uuid) -> Self {
        ComponentId::Member(id)
    }
}

/// The kind of component an SCTID was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Concept identifiers (`00` core, `10` extension).
    Concept,
    /// Description identifiers (`01` core, `11` extension).
    Description,
    /// Relationship identifiers (`02` core, `12` extension).
    Relationship,
}

impl Partition {
    fn digit(self) -> char {
        match self {
            Partition::Concept => '0',
            Partition::Description => '1',
            Partition::Relationship => '2',
        }
    }

    fn index(self) -> usize {
        match self {
            Partition::Concept => 0,
            Partition::Description => 1,
            Partition::Relationship => 2,
        }
    }

    /// Classifies an SCTID by its partition identifier.
    ///
    /// Returns `None` for ids too short to carry a partition or with an
    /// unknown partition.
    pub fn of(id: SctId) -> Option<Self> {
        let digits = id.to_string();
        if digits.len() < 6 {
            return None;
        }
        let bytes = digits.as_bytes();
        let kind = bytes[bytes.len() - 2];
        let format = bytes[bytes.len() - 3];
        if format != b'0' && format != b'1' {
            return None;
        }
        match kind {
            b'0' => Some(Partition::Concept),
            b'1' => Some(Partition::Description),
            b'2' => Some(Partition::Relationship),
            _ => None,
        }
    }
}

const VERHOEFF_D: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

const VERHOEFF_P: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 8, 7, 6, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

const VERHOEFF_INV: [u8; 10] = [0, 4, 3, 2, 1, 5, 6, 7, 8, 9];

/// Computes the Verhoeff check digit for a string of decimal digits.
///
/// Non-digit characters are ignored.
pub fn verhoeff_check_digit(digits: &str) -> u8 {
    let mut c = 0u8;
    for (i, d) in digits.bytes().rev().filter(u8::is_ascii_digit).enumerate() {
        let d = (d - b'0') as usize;
        c = VERHOEFF_D[c as usize][VERHOEFF_P[(i + 1) % 8][d] as usize];
    }
    VERHOEFF_INV[c as usize]
}

/// Returns true if `id` has a valid partition and Verhoeff check digit.
///
/// # Examples
///
/// ```
/// use snomed_model::is_valid_sctid;
///
/// assert!(is_valid_sctid(138875005));
/// assert!(!is_valid_sctid(138875006));
/// ```
pub fn is_valid_sctid(id: SctId) -> bool {
    if Partition::of(id).is_none() {
        return false;
    }
    let digits = id.to_string();
    let mut c = 0u8;
    for (i, d) in digits.bytes().rev().enumerate() {
        let d = (d - b'0') as usize;
        c = VERHOEFF_D[c as usize][VERHOEFF_P[i % 8][d] as usize];
    }
    c == 0
}

/// Issues fresh SCTIDs for synthetic components.
///
/// Item identifiers count up independently per partition. With a namespace
/// the long (extension) format is used: `item + namespace(7) + 1p + check`.
///
/// # Examples
///
/// ```
/// use snomed_model::{is_valid_sctid, Partition, SctIdGenerator};
///
/// let mut ids = SctIdGenerator::new(Some(1000124), 1);
/// let concept_id = ids.next_id(Partition::Concept);
/// assert!(is_valid_sctid(concept_id));
/// assert_eq!(Partition::of(concept_id), Some(Partition::Concept));
/// ```
#[derive(Debug, Clone)]
pub struct SctIdGenerator {
    namespace: Option<u32>,
    next_item: [u64; 3],
}

impl SctIdGenerator {
    /// Creates a generator whose first item identifier is `first_item`.
    pub fn new(namespace: Option<u32>, first_item: u64) -> Self {
        Self {
            namespace,
            next_item: [first_item; 3],
        }
    }

    /// Returns the namespace used for generated ids, if any.
    pub fn namespace(&self) -> Option<u32> {
        self.namespace
    }

    /// Allocates the next identifier in `partition`.
    pub fn next_id(&mut self, partition: Partition) -> SctId {
        let slot = partition.index();
        let item = self.next_item[slot];
        self.next_item[slot] += 1;

        let body = match self.namespace {
            Some(ns) => format!("{}{:07}1{}", item, ns, partition.digit()),
            None => format!("{}0{}", item, partition.digit()),
        };
        let check = verhoeff_check_digit(&body);
        // Digits only; the item counter keeps the value well below u64::MAX.
        format!("{}{}", body, check).parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ids_are_valid() {
        for id in [138875005u64, 116680003, 404684003, 754786011, 100000028] {
            assert!(is_valid_sctid(id), "{} should be valid", id);
        }
        assert!(!is_valid_sctid(404684004));
        assert!(!is_valid_sctid(12));
    }

    #[test]
    fn test_partition_of() {
        assert_eq!(Partition::of(404684003), Some(Partition::Concept));
        assert_eq!(Partition::of(754786011), Some(Partition::Description));
        assert_eq!(Partition::of(100000028), Some(Partition::Relationship));
        assert_eq!(Partition::of(100), None);
    }

    #[test]
    fn test_generator_core_format() {
        let mut ids = SctIdGenerator::new(None, 500);
        let concept = ids.next_id(Partition::Concept);
        let description = ids.next_id(Partition::Description);
        let next_concept = ids.next_id(Partition::Concept);

        assert!(concept.to_string().starts_with("50000"));
        assert!(next_concept.to_string().starts_with("50100"));
        assert!(description.to_string().starts_with("50001"));
        assert!(is_valid_sctid(concept));
        assert!(is_valid_sctid(description));
        assert!(is_valid_sctid(next_concept));
    }

    #[test]
    fn test_generator_extension_format() {
        let mut ids = SctIdGenerator::new(Some(1000124), 7);
        let rel = ids.next_id(Partition::Relationship);
        assert!(rel.to_string().starts_with("7100012412"));
        assert_eq!(Partition::of(rel), Some(Partition::Relationship));
        assert!(is_valid_sctid(rel));
    }

    #[test]
    fn test_component_id_parse_and_display() {
        assert_eq!(ComponentId::parse("404684003"), Some(ComponentId::Sct(404684003)));
        let uuid = "800aa109-431f-4407-a431-6fe65e9db160";
        let parsed = ComponentId::parse(uuid).unwrap();
        assert_eq!(parsed.to_string(), uuid);
        assert_eq!(parsed.as_sctid(), None);
        assert_eq!(ComponentId::parse(""), None);
        assert_eq!(ComponentId::parse("not-an-id"), None);
    }
}
