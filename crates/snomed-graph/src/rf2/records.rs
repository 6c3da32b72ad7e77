//! RF2 row decoding for each component type.

use csv::StringRecord;
use snomed_model::{
    Acceptability, CaseSignificance, CharacteristicType, ComponentCore, Concept, ConcreteValue,
    DefinitionStatus, Description, DescriptionType, HistoricalAssociation,
    InactivationIndicatorEntry, LangRefsetEntry, ModifierType, Relationship, RelationshipTarget,
    SctId, ASSOCIATION_COLUMNS, ATTRIBUTE_VALUE_COLUMNS, CONCEPT_COLUMNS,
    CONCRETE_RELATIONSHIP_COLUMNS, DESCRIPTION_COLUMNS, LANGUAGE_REFSET_COLUMNS,
    MODULE_DEPENDENCY_COLUMNS, RELATIONSHIP_COLUMNS,
};

use super::parser::{parse, Rf2Record};
use crate::error::FieldError;

/// Reads the `effectiveTime`, `active` and `moduleId` columns.
fn core(record: &StringRecord) -> Result<ComponentCore, FieldError> {
    Ok(ComponentCore::loaded(
        parse::sctid(parse::field(record, 3))?,
        parse::effective_time(parse::field(record, 1))?,
        parse::boolean(parse::field(record, 2))?,
    ))
}

impl Rf2Record for Concept {
    const EXPECTED_COLUMNS: &'static [&'static str] = &CONCEPT_COLUMNS;

    fn from_record(record: &StringRecord) -> Result<Self, FieldError> {
        Ok(Concept::from_parts(
            parse::sctid(parse::field(record, 0))?,
            core(record)?,
            parse::code(parse::field(record, 4), "definitionStatusId", DefinitionStatus::from_id)?,
        ))
    }
}

impl Rf2Record for Description {
    const EXPECTED_COLUMNS: &'static [&'static str] = &DESCRIPTION_COLUMNS;

    fn from_record(record: &StringRecord) -> Result<Self, FieldError> {
        Ok(Description::from_parts(
            parse::sctid(parse::field(record, 0))?,
            core(record)?,
            parse::sctid(parse::field(record, 4))?,
            parse::field(record, 5),
            parse::field(record, 7),
            parse::code(parse::field(record, 6), "typeId", DescriptionType::from_id)?,
            parse::code(parse::field(record, 8), "caseSignificanceId", CaseSignificance::from_id)?,
        ))
    }
}

fn relationship(record: &StringRecord, target: RelationshipTarget) -> Result<Relationship, FieldError> {
    Ok(Relationship::from_parts(
        parse::sctid(parse::field(record, 0))?,
        core(record)?,
        parse::sctid(parse::field(record, 4))?,
        parse::sctid(parse::field(record, 7))?,
        target,
        parse::integer(parse::field(record, 6))?,
        parse::code(parse::field(record, 8), "characteristicTypeId", CharacteristicType::from_id)?,
        parse::code(parse::field(record, 9), "modifierId", ModifierType::from_id)?,
    ))
}

impl Rf2Record for Relationship {
    const EXPECTED_COLUMNS: &'static [&'static str] = &RELATIONSHIP_COLUMNS;

    fn from_record(record: &StringRecord) -> Result<Self, FieldError> {
        let destination = parse::sctid(parse::field(record, 5))?;
        relationship(record, RelationshipTarget::Concept(destination))
    }
}

/// A row of a `sct2_RelationshipConcreteValues_` file.
#[derive(Debug, Clone)]
pub struct ConcreteRelationshipRow(pub Relationship);

impl Rf2Record for ConcreteRelationshipRow {
    const EXPECTED_COLUMNS: &'static [&'static str] = &CONCRETE_RELATIONSHIP_COLUMNS;

    fn from_record(record: &StringRecord) -> Result<Self, FieldError> {
        let raw = parse::field(record, 5);
        let value = ConcreteValue::parse(raw).ok_or_else(|| FieldError::InvalidConcreteValue {
            value: raw.to_string(),
        })?;
        relationship(record, RelationshipTarget::Concrete(value)).map(ConcreteRelationshipRow)
    }
}

impl Rf2Record for LangRefsetEntry {
    const EXPECTED_COLUMNS: &'static [&'static str] = &LANGUAGE_REFSET_COLUMNS;

    fn from_record(record: &StringRecord) -> Result<Self, FieldError> {
        Ok(LangRefsetEntry::from_parts(
            parse::uuid(parse::field(record, 0))?,
            core(record)?,
            parse::sctid(parse::field(record, 4))?,
            parse::sctid(parse::field(record, 5))?,
            parse::code(parse::field(record, 6), "acceptabilityId", Acceptability::from_id)?,
        ))
    }
}

impl Rf2Record for InactivationIndicatorEntry {
    const EXPECTED_COLUMNS: &'static [&'static str] = &ATTRIBUTE_VALUE_COLUMNS;

    fn from_record(record: &StringRecord) -> Result<Self, FieldError> {
        Ok(InactivationIndicatorEntry::from_parts(
            parse::uuid(parse::field(record, 0))?,
            core(record)?,
            parse::sctid(parse::field(record, 4))?,
            parse::sctid(parse::field(record, 5))?,
            parse::sctid(parse::field(record, 6))?,
        ))
    }
}

impl Rf2Record for HistoricalAssociation {
    const EXPECTED_COLUMNS: &'static [&'static str] = &ASSOCIATION_COLUMNS;

    fn from_record(record: &StringRecord) -> Result<Self, FieldError> {
        Ok(HistoricalAssociation::from_parts(
            parse::uuid(parse::field(record, 0))?,
            core(record)?,
            parse::sctid(parse::field(record, 4))?,
            parse::sctid(parse::field(record, 5))?,
            parse::sctid(parse::field(record, 6))?,
        ))
    }
}

/// A row of the module dependency reference set.
///
/// `module_id` depends on `target_module_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDependencyRow {
    /// Whether the dependency is current.
    pub active: bool,
    /// The dependent module.
    pub module_id: SctId,
    /// The module depended on (`referencedComponentId`).
    pub target_module_id: SctId,
}

impl Rf2Record for ModuleDependencyRow {
    const EXPECTED_COLUMNS: &'static [&'static str] = &MODULE_DEPENDENCY_COLUMNS;

    fn from_record(record: &StringRecord) -> Result<Self, FieldError> {
        Ok(ModuleDependencyRow {
            active: parse::boolean(parse::field(record, 2))?.unwrap_or(false),
            module_id: parse::sctid(parse::field(record, 3))?,
            target_module_id: parse::sctid(parse::field(record, 5))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snomed_model::{well_known, Component, RefsetEntry};

    fn make_record(fields: &[&str]) -> StringRecord {
        let mut record = StringRecord::new();
        for field in fields {
            record.push_field(field);
        }
        record
    }

    #[test]
    fn test_parse_concept_record() {
        let record = make_record(&[
            "404684003",
            "20020131",
            "1",
            "900000000000207008",
            "900000000000074008",
        ]);

        let concept = Concept::from_record(&record).unwrap();
        assert_eq!(concept.id(), 404684003);
        assert_eq!(concept.core().effective_time(), Some(20020131));
        assert!(concept.is_active_safely());
        assert!(concept.core().is_released());
        assert!(!concept.core().is_dirty());
        assert!(concept.is_primitive());
        assert_eq!(concept.to_exchange_row(), vec![
            "404684003",
            "20020131",
            "1",
            "900000000000207008",
            "900000000000074008",
        ]);
    }

    #[test]
    fn test_parse_description_record() {
        let record = make_record(&[
            "754786011",
            "20020131",
            "1",
            "900000000000207008",
            "73211009",
            "en",
            "900000000000003001",
            "Diabetes mellitus (disorder)",
            "900000000000448009",
        ]);

        let desc = Description::from_record(&record).unwrap();
        assert_eq!(desc.concept_id(), 73211009);
        assert!(desc.is_fsn());
        assert_eq!(desc.term(), "Diabetes mellitus (disorder)");
    }

    #[test]
    fn test_parse_relationship_record() {
        let record = make_record(&[
            "100000028",
            "20020131",
            "1",
            "900000000000207008",
            "73211009",
            "362969004",
            "0",
            "116680003",
            "900000000000011006",
            "900000000000451002",
        ]);

        let rel = Relationship::from_record(&record).unwrap();
        assert!(rel.is_is_a());
        assert_eq!(rel.characteristic_type(), CharacteristicType::Inferred);
        assert_eq!(rel.target().concept_id(), Some(362969004));
    }

    #[test]
    fn test_unknown_characteristic_type_is_rejected() {
        let record = make_record(&[
            "100000028", "20020131", "1", "900000000000207008", "73211009", "362969004", "0",
            "116680003", "123", "900000000000451002",
        ]);
        assert!(matches!(
            Relationship::from_record(&record),
            Err(FieldError::UnknownCode { column: "characteristicTypeId", .. })
        ));
    }

    #[test]
    fn test_parse_concrete_relationship_record() {
        let record = make_record(&[
            "12345678901234",
            "20230101",
            "1",
            "900000000000207008",
            "322236009",
            "#0.50",
            "1",
            "1142135004",
            "900000000000011006",
            "900000000000451002",
        ]);

        let ConcreteRelationshipRow(rel) = ConcreteRelationshipRow::from_record(&record).unwrap();
        assert_eq!(rel.to_exchange_row()[5], "#0.50");
        assert_eq!(rel.group(), 1);
    }

    #[test]
    fn test_parse_language_record() {
        let record = make_record(&[
            "800aa109-431f-4407-a431-6fe65e9db160",
            "20170731",
            "1",
            "900000000000207008",
            "900000000000509007",
            "754786011",
            "900000000000548007",
        ]);

        let entry = LangRefsetEntry::from_record(&record).unwrap();
        assert_eq!(entry.refset_id(), well_known::US_ENGLISH_REFSET);
        assert_eq!(entry.referenced_component_id(), 754786011);
        assert_eq!(entry.acceptability(), Acceptability::Preferred);
        assert_eq!(entry.to_exchange_row()[0], "800aa109-431f-4407-a431-6fe65e9db160");
    }

    #[test]
    fn test_parse_module_dependency_record() {
        let record = make_record(&[
            "1244116f-5b79-4f4a-8d4c-2e8e8e8e8e8e",
            "20250101",
            "1",
            "21000210109",
            "900000000000534007",
            "900000000000207008",
            "20250101",
            "20250101",
        ]);

        let row = ModuleDependencyRow::from_record(&record).unwrap();
        assert!(row.active);
        assert_eq!(row.module_id, 21000210109);
        assert_eq!(row.target_module_id, well_known::SNOMED_CT_CORE_MODULE);
    }
}
