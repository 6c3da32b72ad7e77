//! Full runs of the release tool over a small package.

use std::fs;
use std::path::Path;

use snomed_model::ComponentType;
use snomed_rf2_tool::{run, ToolConfig, ToolError};

const CORE: &str = "900000000000207008";
const EXTENSION: &str = "21000210109";

fn write(root: &Path, relative: &str, lines: &[String]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, lines.join("\n") + "\n").unwrap();
}

/// Root and one child, inferred is-a only.
fn make_release(root: &Path) {
    write(
        root,
        "Snapshot/sct2_Concept_Snapshot_INT_20250101.txt",
        &[
            "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId".to_string(),
            format!("138875005\t20020131\t1\t{}\t900000000000074008", CORE),
            format!("404684003\t20020131\t1\t{}\t900000000000074008", CORE),
        ],
    );
    write(
        root,
        "Snapshot/sct2_Relationship_Snapshot_INT_20250101.txt",
        &[
            "id\teffectiveTime\tactive\tmoduleId\tsourceId\tdestinationId\trelationshipGroup\ttypeId\tcharacteristicTypeId\tmodifierId".to_string(),
            format!(
                "4000003024\t20020131\t1\t{}\t404684003\t138875005\t0\t116680003\t900000000000011006\t900000000000451002",
                CORE
            ),
        ],
    );
}

/// Moves the is-a into an extension module with no declared dependency.
fn make_delta(root: &Path) {
    write(
        root,
        "Delta/sct2_Relationship_Delta_INT_20250731.txt",
        &[
            "id\teffectiveTime\tactive\tmoduleId\tsourceId\tdestinationId\trelationshipGroup\ttypeId\tcharacteristicTypeId\tmodifierId".to_string(),
            format!(
                "4000003024\t\t1\t{}\t404684003\t138875005\t0\t116680003\t900000000000011006\t900000000000451002",
                EXTENSION
            ),
        ],
    );
}

fn make_config(data: &Path, output: &Path) -> ToolConfig {
    ToolConfig {
        data_path: data.join("Snapshot"),
        output_path: output.to_path_buf(),
        ..ToolConfig::default()
    }
}

#[test]
fn test_run_writes_delta_and_negative_delta() {
    let data = tempfile::tempdir().unwrap();
    make_release(data.path());
    let output = tempfile::tempdir().unwrap();

    let summary = run(&make_config(data.path(), output.path())).unwrap();
    assert_eq!(summary.release_date, 20250101);
    assert_eq!(summary.misalignments, 0);
    assert_eq!(summary.reports.len(), 2);
    assert!(output.path().join("Delta").is_dir());
    assert!(output.path().join("Deleted").is_dir());
    assert!(!output.path().join("Snapshot").exists());
    assert_eq!(summary.reports[0].total_rows(), 0);
}

#[test]
fn test_run_repairs_delta_alignment() {
    let data = tempfile::tempdir().unwrap();
    make_release(data.path());
    make_delta(data.path());
    let output = tempfile::tempdir().unwrap();

    let config = ToolConfig {
        delta_path: Some(data.path().join("Delta")),
        repair_alignment: true,
        write_snapshot: true,
        ..make_config(data.path(), output.path())
    };
    let summary = run(&config).unwrap();

    assert_eq!(summary.release_date, 20250731);
    assert_eq!(summary.misalignments, 1);
    assert_eq!(summary.repaired, 1);
    // The relationship and its source concept.
    assert_eq!(summary.unpromoted_changes, 2);
    assert_eq!(summary.reports.len(), 3);

    let delta = &summary.reports[0];
    let rels = delta.file(ComponentType::InferredRelationship).unwrap();
    assert_eq!(rels.rows, 1);
    let written = fs::read_to_string(&rels.path).unwrap();
    assert!(written.lines().nth(1).unwrap().contains(&format!("\t1\t{}\t", CORE)));
}

#[test]
fn test_run_without_release_date_fails() {
    let data = tempfile::tempdir().unwrap();
    write(
        data.path(),
        "Snapshot/sct2_Concept_Snapshot_INT.txt",
        &["id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId".to_string()],
    );
    let output = tempfile::tempdir().unwrap();

    let err = run(&make_config(data.path(), output.path())).unwrap_err();
    assert!(matches!(err, ToolError::Config(_)), "got {:?}", err);
}
