//! Shared RF2 fixtures for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const CORE: &str = "900000000000207008";
pub const CONCEPT_HEADER: &str = "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId";
pub const DESCRIPTION_HEADER: &str =
    "id\teffectiveTime\tactive\tmoduleId\tconceptId\tlanguageCode\ttypeId\tterm\tcaseSignificanceId";
pub const RELATIONSHIP_HEADER: &str =
    "id\teffectiveTime\tactive\tmoduleId\tsourceId\tdestinationId\trelationshipGroup\ttypeId\tcharacteristicTypeId\tmodifierId";
pub const CONCRETE_HEADER: &str =
    "id\teffectiveTime\tactive\tmoduleId\tsourceId\tvalue\trelationshipGroup\ttypeId\tcharacteristicTypeId\tmodifierId";
pub const LANGUAGE_HEADER: &str =
    "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\tacceptabilityId";
pub const ATTRIBUTE_VALUE_HEADER: &str =
    "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\tvalueId";
pub const ASSOCIATION_HEADER: &str =
    "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\ttargetComponentId";

pub const ROOT: u64 = 138875005;
pub const BODY_STRUCTURE: u64 = 123037004;
pub const SKIN: u64 = 39937001;
pub const HAIR_FOLLICLE: u64 = 67290009;
pub const FINDING: u64 = 404684003;
pub const RETIRED: u64 = 198609003;

/// Writes one RF2 file with its rows in sorted order.
pub fn write_rf2(root: &Path, relative: &str, header: &str, rows: &[String]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut sorted = rows.to_vec();
    sorted.sort();
    let mut content = format!("{}\n", header);
    for row in sorted {
        content.push_str(&row);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

pub fn concept_row(id: u64, effective_time: &str, active: &str, definition_status: &str) -> String {
    format!("{}\t{}\t{}\t{}\t{}", id, effective_time, active, CORE, definition_status)
}

pub fn fsn_row(id: u64, effective_time: &str, concept_id: u64, term: &str) -> String {
    format!(
        "{}\t{}\t1\t{}\t{}\ten\t900000000000003001\t{}\t900000000000448009",
        id, effective_time, CORE, concept_id, term
    )
}

pub fn is_a_row(id: u64, effective_time: &str, module: &str, source: u64, parent: u64, characteristic_type: &str) -> String {
    format!(
        "{}\t{}\t1\t{}\t{}\t{}\t0\t116680003\t{}\t900000000000451002",
        id, effective_time, module, source, parent, characteristic_type
    )
}

pub fn preferred_row(member: &str, effective_time: &str, description_id: u64) -> String {
    format!(
        "{}\t{}\t1\t{}\t900000000000509007\t{}\t900000000000548007",
        member, effective_time, CORE, description_id
    )
}

pub const PRIMITIVE: &str = "900000000000074008";
pub const FULLY_DEFINED: &str = "900000000000073002";
pub const STATED: &str = "900000000000010007";
pub const INFERRED: &str = "900000000000011006";

/// A small body structure hierarchy with one file of every type under
/// `<root>/Snapshot/`, named the way the exporter names them.
///
/// ```text
/// root <- Body structure <- Skin structure <- Hair follicle
/// root <- Clinical finding
/// ```
pub fn write_snapshot(root: &Path) {
    let base = root.join("Snapshot");
    let t = "20020131";

    write_rf2(
        &base,
        "Terminology/sct2_Concept_Snapshot_INT_20250101.txt",
        CONCEPT_HEADER,
        &[
            concept_row(ROOT, t, "1", PRIMITIVE),
            concept_row(BODY_STRUCTURE, t, "1", PRIMITIVE),
            concept_row(SKIN, t, "1", PRIMITIVE),
            concept_row(HAIR_FOLLICLE, t, "1", PRIMITIVE),
            concept_row(FINDING, t, "1", PRIMITIVE),
            concept_row(RETIRED, "20090731", "0", PRIMITIVE),
        ],
    );
    write_rf2(
        &base,
        "Terminology/sct2_Description_Snapshot-en_INT_20250101.txt",
        DESCRIPTION_HEADER,
        &[
            fsn_row(220309016, t, ROOT, "SNOMED CT Concept (SNOMED RT+CTV3)"),
            fsn_row(486939015, t, BODY_STRUCTURE, "Body structure (body structure)"),
            fsn_row(754786011, t, SKIN, "Skin structure (body structure)"),
            fsn_row(111803014, t, HAIR_FOLLICLE, "Hair follicle (body structure)"),
            fsn_row(2470645019, t, FINDING, "Clinical finding (finding)"),
            format!(
                "754787019\t{}\t1\t{}\t{}\ten\t900000000000013009\tSkin\t900000000000448009",
                t, CORE, SKIN
            ),
        ],
    );
    write_rf2(
        &base,
        "Terminology/sct2_TextDefinition_Snapshot-en_INT_20250101.txt",
        DESCRIPTION_HEADER,
        &[format!(
            "3291870017\t{}\t1\t{}\t{}\ten\t900000000000550004\tThe outer covering of the body.\t900000000000017005",
            t, CORE, SKIN
        )],
    );
    write_rf2(
        &base,
        "Terminology/sct2_StatedRelationship_Snapshot_INT_20250101.txt",
        RELATIONSHIP_HEADER,
        &[
            is_a_row(3000000021, t, CORE, BODY_STRUCTURE, ROOT, STATED),
            is_a_row(3000001025, t, CORE, SKIN, BODY_STRUCTURE, STATED),
            is_a_row(3000002024, t, CORE, HAIR_FOLLICLE, SKIN, STATED),
            is_a_row(3000003020, t, CORE, FINDING, ROOT, STATED),
        ],
    );
    write_rf2(
        &base,
        "Terminology/sct2_Relationship_Snapshot_INT_20250101.txt",
        RELATIONSHIP_HEADER,
        &[
            is_a_row(4000000022, t, CORE, BODY_STRUCTURE, ROOT, INFERRED),
            is_a_row(4000001026, t, CORE, SKIN, BODY_STRUCTURE, INFERRED),
            is_a_row(4000002020, t, CORE, HAIR_FOLLICLE, SKIN, INFERRED),
            is_a_row(4000003024, t, CORE, FINDING, ROOT, INFERRED),
        ],
    );
    write_rf2(
        &base,
        "Terminology/sct2_RelationshipConcreteValues_Snapshot_INT_20250101.txt",
        CONCRETE_HEADER,
        &[
            format!(
                "5000000026\t{}\t1\t{}\t{}\t#0.50\t1\t1142135004\t{}\t900000000000451002",
                t, CORE, HAIR_FOLLICLE, INFERRED
            ),
            format!(
                "5000001022\t{}\t1\t{}\t{}\t\"follicle\"\t2\t1142136003\t{}\t900000000000451002",
                t, CORE, HAIR_FOLLICLE, INFERRED
            ),
        ],
    );
    write_rf2(
        &base,
        "Refset/Language/der2_cRefset_LanguageSnapshot-en_INT_20250101.txt",
        LANGUAGE_HEADER,
        &[
            preferred_row("0a0c2a8b-7b1e-4b5c-9a54-1f0d3c3b1a01", t, 220309016),
            preferred_row("1b1d3b9c-8c2f-4c6d-8b65-2e1e4d4c2b02", t, 486939015),
            preferred_row("2c2e4cad-9d3a-4d7e-9c76-3f2f5e5d3c03", t, 754786011),
            preferred_row("3d3f5dbe-ae4b-4e8f-ad87-4a3a6f6e4d04", t, 111803014),
            preferred_row("4e4a6ecf-bf5c-4f9a-be98-5b4b7a7f5e05", t, 2470645019),
            preferred_row("5f5b7fda-ca6d-4aab-8fa9-6c5c8b8a6f06", t, 754787019),
        ],
    );
    write_rf2(
        &base,
        "Refset/Content/der2_cRefset_AttributeValueSnapshot_INT_20250101.txt",
        ATTRIBUTE_VALUE_HEADER,
        &[format!(
            "6a6c8aeb-db7e-4bbc-9aba-7d6d9c9b7a07\t20090731\t1\t{}\t900000000000489007\t{}\t900000000000482003",
            CORE, RETIRED
        )],
    );
    write_rf2(
        &base,
        "Refset/Content/der2_cRefset_AssociationSnapshot_INT_20250101.txt",
        ASSOCIATION_HEADER,
        &[],
    );
}

/// Every file under `dir`, as paths relative to it, sorted.
pub fn list_files(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(next) = stack.pop() {
        for entry in fs::read_dir(&next).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                found.push(path.strip_prefix(dir).unwrap().to_path_buf());
            }
        }
    }
    found.sort();
    found
}
