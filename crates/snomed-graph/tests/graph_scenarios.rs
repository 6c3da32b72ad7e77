//! End-to-end scenarios over a loaded package.

mod common;

use common::*;
use snomed_graph::rf2::Rf2Exporter;
use snomed_graph::{
    align_modules, detect_misalignments, AlignmentConfig, AlignmentRule, CreationPattern, Depth, ExportConfig,
    GraphError, GraphRegistry, PrimitiveConfig, Rf2Package, TemplateConfig, TemplateEngine, UnpromotedChanges,
    YStrategy,
};
use snomed_model::{CharacteristicType, Component, ComponentId, ComponentType};

const EXTENSION: &str = "21000210109";

fn load(extra: impl FnOnce(&std::path::Path)) -> GraphRegistry {
    let input = tempfile::tempdir().unwrap();
    write_snapshot(input.path());
    extra(input.path());
    GraphRegistry::from_package(&Rf2Package::open(input.path()).unwrap()).unwrap()
}

#[test]
fn test_proximal_primitive_parents_of_fully_defined_concept() {
    // Hair follicle structure: fully defined under Skin structure.
    let registry = load(|root| {
        write_rf2(
            root,
            "Delta/sct2_Concept_Delta_INT_20250731.txt",
            CONCEPT_HEADER,
            &[concept_row(400199006, "", "1", FULLY_DEFINED)],
        );
        write_rf2(
            root,
            "Delta/sct2_StatedRelationship_Delta_INT_20250731.txt",
            RELATIONSHIP_HEADER,
            &[
                is_a_row(6000000020, "", CORE, 400199006, SKIN, STATED),
                format!(
                    "6000001024\t\t1\t{}\t400199006\t{}\t1\t272741003\t{}\t900000000000451002",
                    CORE, HAIR_FOLLICLE, STATED
                ),
            ],
        );
    });

    assert_eq!(registry.determine_proximal_primitive_parents(400199006).unwrap(), vec![SKIN]);
    let config = PrimitiveConfig::default();
    let report = registry.proximal_primitive_report(400199006, &config).unwrap();
    assert_eq!(report.intermediate_primitives, vec![SKIN]);
    assert!(report.parents_match);
    assert!(registry.is_intermediate_primitive(SKIN, &config).unwrap());
    assert!(!registry.is_intermediate_primitive(BODY_STRUCTURE, &config).unwrap());

    let ancestors = registry
        .get_ancestors(400199006, CharacteristicType::Stated, Depth::Transitive)
        .unwrap();
    assert!(ancestors.contains(&ROOT));
    assert!(registry
        .get_descendants(400199006, CharacteristicType::Stated, Depth::Transitive)
        .unwrap()
        .is_empty());
}

#[test]
fn test_hair_follicle_structure_prototype() {
    let mut registry = load(|_| {});
    let pattern = CreationPattern::new("structure", "[X] structure", "(body structure)")
        .with_y_strategy(YStrategy::ImmediateInferredParentOfX)
        .with_parent(CreationPattern::new("parent", "[Y]", "(body structure)"))
        .with_inspiration(BODY_STRUCTURE);

    let mut engine = TemplateEngine::new(TemplateConfig {
        namespace: Some(1000210),
        ..TemplateConfig::default()
    });
    let set = engine.create_prototype(&registry, &pattern, HAIR_FOLLICLE).unwrap();
    assert_eq!(
        set.primary.fsn().map(|d| d.term()),
        Some("Hair follicle structure (body structure)")
    );
    assert_eq!(set.primary.parent_ids(CharacteristicType::Stated), vec![SKIN]);
    assert!(snomed_model::is_valid_sctid(set.primary.id()));
    assert!(!registry.contains_concept(set.primary.id()));

    let id = engine.register(&mut registry, set).unwrap();
    assert!(registry.is_descendant_or_self_of(id, BODY_STRUCTURE, CharacteristicType::Stated).unwrap());

    let outcome = engine
        .create_prototypes(&registry, &pattern, &[FINDING, 99999999])
        .unwrap();
    assert!(outcome.succeeded.is_empty());
    assert!(matches!(outcome.failed[0].error, GraphError::PatternResolution { .. }));
    assert!(matches!(outcome.failed[1].error, GraphError::NotFound { .. }));
}

#[test]
fn test_extension_relationship_is_realigned() {
    let mut registry = load(|root| {
        write_rf2(
            root,
            "Delta/sct2_Relationship_Delta_INT_20250731.txt",
            RELATIONSHIP_HEADER,
            &[is_a_row(4000004028, "", EXTENSION, HAIR_FOLLICLE, BODY_STRUCTURE, INFERRED)],
        );
    });
    let rel = ComponentId::Sct(4000004028);

    let issues = detect_misalignments(&registry, &AlignmentConfig::default()).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].rule, AlignmentRule::ModuleAlignment);
    assert_eq!(issues[0].component_id, rel);
    assert_eq!(issues[0].owner_id, ComponentId::Sct(HAIR_FOLLICLE));

    let changes = UnpromotedChanges::from_graph(&registry).unwrap();
    assert!(changes.has_unpromoted_change(HAIR_FOLLICLE));
    assert!(!changes.has_unpromoted_change(SKIN));

    align_modules(&mut registry, &AlignmentConfig::default()).unwrap();
    let module = registry.get_component(rel).unwrap().module_id();
    assert_eq!(module.to_string(), CORE);
    assert!(detect_misalignments(&registry, &AlignmentConfig::default())
        .unwrap()
        .is_empty());

    let output = tempfile::tempdir().unwrap();
    let report = Rf2Exporter::new(&registry, ExportConfig::new(20250731))
        .generate_delta(output.path())
        .unwrap();
    assert_eq!(report.file(ComponentType::InferredRelationship).unwrap().rows, 1);
    assert_eq!(report.total_rows(), 1);
}

#[test]
fn test_module_dependency_rows_justify_extension_content() {
    let registry = load(|root| {
        write_rf2(
            root,
            "Delta/sct2_Relationship_Delta_INT_20250731.txt",
            RELATIONSHIP_HEADER,
            &[is_a_row(4000004028, "", EXTENSION, HAIR_FOLLICLE, BODY_STRUCTURE, INFERRED)],
        );
        write_rf2(
            root,
            "Delta/der2_ssRefset_ModuleDependencyDelta_INT_20250731.txt",
            "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\tsourceEffectiveTime\ttargetEffectiveTime",
            &[format!(
                "7b7d9bfc-ec8f-4ccd-8bcb-8e7eadac8b08\t\t1\t{}\t900000000000534007\t{}\t20250731\t20250101",
                EXTENSION, CORE
            )],
        );
    });

    assert!(registry
        .get_dependencies(21000210109)
        .unwrap()
        .contains(&900000000000207008));
    assert!(detect_misalignments(&registry, &AlignmentConfig::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_inactivation_round_trips_through_delta() {
    let mut registry = load(|_| {});
    registry
        .inactivate_concept(
            HAIR_FOLLICLE,
            snomed_model::well_known::REASON_DUPLICATE,
            &[(snomed_model::well_known::SAME_AS, SKIN)],
        )
        .unwrap();

    let output = tempfile::tempdir().unwrap();
    let report = Rf2Exporter::new(&registry, ExportConfig::new(20250731))
        .generate_delta(output.path())
        .unwrap();
    assert_eq!(report.file(ComponentType::Concept).unwrap().rows, 1);
    // Concept indicator plus the non-current flag on its FSN.
    assert_eq!(report.file(ComponentType::AttributeValue).unwrap().rows, 2);
    assert_eq!(report.file(ComponentType::Association).unwrap().rows, 1);

    // The delta loads back on top of the original snapshot.
    let mut reloaded = load(|_| {});
    reloaded.load(&Rf2Package::open(&report.directory).unwrap()).unwrap();
    let concept = reloaded.get_concept(HAIR_FOLLICLE).unwrap();
    assert!(!concept.is_active_safely());
    assert_eq!(concept.association_targets().get(&snomed_model::well_known::SAME_AS), Some(&vec![SKIN]));
}
