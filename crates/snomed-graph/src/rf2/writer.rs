//! RF2 package generation.
//!
//! Writes the registry out as a snapshot, a delta or a negative delta. Every
//! run writes all nine file types, with a header row even when a file has no
//! data. Files are built in a hidden staging directory next to the target and
//! moved into place only once every file has been written.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use snomed_model::{Component, ComponentCore, ComponentType, Concept};

use crate::config::ExportConfig;
use crate::error::{GraphError, GraphResult};
use crate::registry::GraphRegistry;

/// Which components a generation run writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportMode {
    /// Every component that is not deleted.
    Snapshot,
    /// Components changed since they were loaded.
    Delta,
    /// Deleted components that came from an input package but were never
    /// released, as paired before and after rows.
    NegativeDelta,
}

impl ExportMode {
    /// Release label used in directory and file names.
    pub fn label(self) -> &'static str {
        match self {
            ExportMode::Snapshot => "Snapshot",
            ExportMode::Delta => "Delta",
            ExportMode::NegativeDelta => "Deleted",
        }
    }

    fn includes(self, core: &ComponentCore) -> bool {
        match self {
            ExportMode::Snapshot => !core.is_deleted(),
            ExportMode::Delta => core.is_dirty() && !core.is_deleted(),
            ExportMode::NegativeDelta => core.is_deleted() && core.is_persisted() && !core.is_released(),
        }
    }
}

/// One file written by a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Final location of the file.
    pub path: PathBuf,
    /// Content of the file.
    pub component_type: ComponentType,
    /// Data rows, not counting the header.
    pub rows: usize,
}

/// Summary of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Mode the package was written in.
    pub mode: ExportMode,
    /// Root of the written package (`Snapshot/`, `Delta/` or `Deleted/`).
    pub directory: PathBuf,
    /// Every file written, in [`ComponentType::ALL`] order.
    pub files: Vec<GeneratedFile>,
}

impl GenerationReport {
    /// Data rows over all files.
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }

    /// The file written for one component type.
    pub fn file(&self, component_type: ComponentType) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.component_type == component_type)
    }
}

/// Directory of a component type's file, relative to the package root.
pub fn subdirectory(component_type: ComponentType) -> &'static str {
    match component_type {
        ComponentType::LanguageRefset => "Refset/Language",
        ComponentType::AttributeValue | ComponentType::Association => "Refset/Content",
        _ => "Terminology",
    }
}

/// Canonical RF2 file name of a component type.
///
/// # Examples
///
/// ```
/// use snomed_graph::rf2::{file_name, ExportMode};
/// use snomed_graph::ExportConfig;
/// use snomed_model::ComponentType;
///
/// let config = ExportConfig::new(20250101);
/// assert_eq!(
///     file_name(ComponentType::LanguageRefset, ExportMode::Delta, &config),
///     "der2_cRefset_LanguageDelta-en_INT_20250101.txt"
/// );
/// ```
pub fn file_name(component_type: ComponentType, mode: ExportMode, config: &ExportConfig) -> String {
    let label = mode.label();
    let lang = &config.language_code;
    let stem = match component_type {
        ComponentType::Concept => format!("sct2_Concept_{}", label),
        ComponentType::Description => format!("sct2_Description_{}-{}", label, lang),
        ComponentType::TextDefinition => format!("sct2_TextDefinition_{}-{}", label, lang),
        ComponentType::InferredRelationship => format!("sct2_Relationship_{}", label),
        ComponentType::StatedRelationship => format!("sct2_StatedRelationship_{}", label),
        ComponentType::ConcreteRelationship => format!("sct2_RelationshipConcreteValues_{}", label),
        ComponentType::LanguageRefset => format!("der2_cRefset_Language{}-{}", label, lang),
        ComponentType::AttributeValue => format!("der2_cRefset_AttributeValue{}", label),
        ComponentType::Association => format!("der2_cRefset_Association{}", label),
    };
    format!("{}_{}_{}.txt", stem, config.edition, config.release_date)
}

type Rows = BTreeMap<ComponentType, Vec<Vec<String>>>;

/// Writes RF2 packages from a registry.
///
/// # Example
///
/// ```ignore
/// use snomed_graph::rf2::Rf2Exporter;
/// use snomed_graph::ExportConfig;
///
/// let exporter = Rf2Exporter::new(&registry, ExportConfig::new(20250731));
/// let report = exporter.generate_delta("/tmp/out")?;
/// println!("{} rows in {}", report.total_rows(), report.directory.display());
/// ```
pub struct Rf2Exporter<'a> {
    registry: &'a GraphRegistry,
    config: ExportConfig,
}

impl<'a> Rf2Exporter<'a> {
    /// Creates an exporter over `registry`.
    pub fn new(registry: &'a GraphRegistry, config: ExportConfig) -> Self {
        Self { registry, config }
    }

    /// Writes `<out_dir>/Snapshot/`.
    pub fn generate_snapshot(&self, out_dir: impl AsRef<Path>) -> GraphResult<GenerationReport> {
        self.generate(ExportMode::Snapshot, out_dir.as_ref())
    }

    /// Writes `<out_dir>/Delta/`.
    pub fn generate_delta(&self, out_dir: impl AsRef<Path>) -> GraphResult<GenerationReport> {
        self.generate(ExportMode::Delta, out_dir.as_ref())
    }

    /// Writes `<out_dir>/Deleted/`.
    pub fn generate_negative_delta(&self, out_dir: impl AsRef<Path>) -> GraphResult<GenerationReport> {
        self.generate(ExportMode::NegativeDelta, out_dir.as_ref())
    }

    /// Writes one package, replacing any earlier package of the same mode.
    ///
    /// # Errors
    ///
    /// `Output` naming the file or directory that could not be written. No
    /// partial package is left behind.
    pub fn generate(&self, mode: ExportMode, out_dir: &Path) -> GraphResult<GenerationReport> {
        self.registry.ensure_loaded()?;
        let rows = self.collect_rows(mode)?;

        let final_dir = out_dir.join(mode.label());
        let staging = out_dir.join(format!(".{}.staging", mode.label()));
        let result = self.write_package(mode, rows, &staging, &final_dir);
        if result.is_err() {
            let _ = fs::remove_dir_all(&staging);
        }

        let report = result?;
        tracing::info!(
            "Wrote {} package to {}: {} rows in {} files",
            mode.label(),
            report.directory.display(),
            report.total_rows(),
            report.files.len()
        );
        Ok(report)
    }

    fn collect_rows(&self, mode: ExportMode) -> GraphResult<Rows> {
        let concepts: Vec<&Concept> = self.registry.get_all_concepts()?.collect();
        let deletion_date = self.config.deletion_date();

        #[cfg(feature = "parallel")]
        let rendered: Vec<(ComponentType, Vec<String>)> = concepts
            .par_iter()
            .flat_map_iter(|c| render_all(c.components(), mode, deletion_date))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let rendered: Vec<(ComponentType, Vec<String>)> = concepts
            .iter()
            .flat_map(|c| render_all(c.components(), mode, deletion_date))
            .collect();

        let mut rows = Rows::new();
        for (component_type, row) in rendered {
            rows.entry(component_type).or_default().push(row);
        }
        let unattached = self
            .registry
            .unattached_members()
            .map(|m| m as &dyn Component)
            .collect();
        for (component_type, row) in render_all(unattached, mode, deletion_date) {
            rows.entry(component_type).or_default().push(row);
        }

        for file_rows in rows.values_mut() {
            file_rows.sort_unstable();
        }
        Ok(rows)
    }

    fn write_package(
        &self,
        mode: ExportMode,
        mut rows: Rows,
        staging: &Path,
        final_dir: &Path,
    ) -> GraphResult<GenerationReport> {
        if staging.exists() {
            fs::remove_dir_all(staging).map_err(|e| GraphError::output(staging, e))?;
        }

        let mut files = Vec::with_capacity(ComponentType::ALL.len());
        for component_type in ComponentType::ALL {
            let relative = Path::new(subdirectory(component_type));
            let dir = staging.join(relative);
            fs::create_dir_all(&dir).map_err(|e| GraphError::output(&dir, e))?;

            let name = file_name(component_type, mode, &self.config);
            let header: Vec<String> = match mode {
                ExportMode::NegativeDelta => component_type.deletion_columns(),
                _ => component_type.columns().iter().map(|c| c.to_string()).collect(),
            };
            let file_rows = rows.remove(&component_type).unwrap_or_default();
            let final_path = final_dir.join(relative).join(&name);

            write_file(&dir.join(&name), &header, &file_rows).map_err(|e| GraphError::output(&final_path, e))?;
            tracing::debug!("Wrote {} rows to {}", file_rows.len(), name);
            files.push(GeneratedFile {
                path: final_path,
                component_type,
                rows: file_rows.len(),
            });
        }

        if final_dir.exists() {
            fs::remove_dir_all(final_dir).map_err(|e| GraphError::output(final_dir, e))?;
        }
        fs::rename(staging, final_dir).map_err(|e| GraphError::output(final_dir, e))?;

        Ok(GenerationReport {
            mode,
            directory: final_dir.to_path_buf(),
            files,
        })
    }
}

fn render_all(components: Vec<&dyn Component>, mode: ExportMode, deletion_date: u32) -> Vec<(ComponentType, Vec<String>)> {
    components
        .into_iter()
        .filter(|c| mode.includes(c.core()))
        .map(|c| {
            let row = match mode {
                ExportMode::NegativeDelta => c.to_deletion_row(deletion_date),
                _ => c.to_exchange_row(),
            };
            (c.component_type(), row)
        })
        .collect()
}

fn write_file(path: &Path, header: &[String], rows: &[Vec<String>]) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(BufWriter::new(file));

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rf2::Rf2Package;
    use snomed_model::{well_known, CaseSignificance, ComponentId, DefinitionStatus, Description, DescriptionType};

    const MODULE: u64 = well_known::SNOMED_CT_CORE_MODULE;

    fn make_registry() -> GraphRegistry {
        let mut package = Rf2Package::new();
        package.add_bytes(
            "sct2_Concept_Snapshot_INT_20250101.txt",
            b"id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n\
              138875005\t20020131\t1\t900000000000207008\t900000000000074008\n"
                .to_vec(),
        );
        package.add_bytes(
            "sct2_Concept_Delta_INT_20250101.txt",
            b"id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n\
              404684003\t\t1\t900000000000207008\t900000000000074008\n"
                .to_vec(),
        );
        GraphRegistry::from_package(&package).unwrap()
    }

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_file_names() {
        let config = ExportConfig::new(20250101).with_edition("NZ1000210");
        assert_eq!(
            file_name(ComponentType::Concept, ExportMode::Snapshot, &config),
            "sct2_Concept_Snapshot_NZ1000210_20250101.txt"
        );
        assert_eq!(
            file_name(ComponentType::Description, ExportMode::NegativeDelta, &config),
            "sct2_Description_Deleted-en_NZ1000210_20250101.txt"
        );
        assert_eq!(
            file_name(ComponentType::Association, ExportMode::Snapshot, &config),
            "der2_cRefset_AssociationSnapshot_NZ1000210_20250101.txt"
        );
        assert_eq!(subdirectory(ComponentType::AttributeValue), "Refset/Content");
    }

    #[test]
    fn test_snapshot_writes_every_file_with_header() {
        let registry = make_registry();
        let dir = tempfile::tempdir().unwrap();
        let report = Rf2Exporter::new(&registry, ExportConfig::new(20250101))
            .generate_snapshot(dir.path())
            .unwrap();

        assert_eq!(report.files.len(), 9);
        assert_eq!(report.total_rows(), 2);
        let concepts = report.file(ComponentType::Concept).unwrap();
        assert_eq!(
            read(&concepts.path),
            "id\teffectiveTime\tactive\tmoduleId\tdefinitionStatusId\n\
             138875005\t20020131\t1\t900000000000207008\t900000000000074008\n\
             404684003\t\t1\t900000000000207008\t900000000000074008\n"
        );
        let associations = report.file(ComponentType::Association).unwrap();
        assert_eq!(associations.rows, 0);
        assert_eq!(
            read(&associations.path),
            "id\teffectiveTime\tactive\tmoduleId\trefsetId\treferencedComponentId\ttargetComponentId\n"
        );
        assert!(!dir.path().join(".Snapshot.staging").exists());
    }

    #[test]
    fn test_delta_has_only_changed_rows() {
        let mut registry = make_registry();
        registry
            .add_description(Description::new(
                100000001,
                404684003,
                "Clinical finding (finding)",
                DescriptionType::Fsn,
                CaseSignificance::CaseInsensitive,
                MODULE,
            ))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let report = Rf2Exporter::new(&registry, ExportConfig::new(20250101))
            .generate_delta(dir.path())
            .unwrap();
        assert_eq!(report.file(ComponentType::Concept).unwrap().rows, 1);
        assert_eq!(report.file(ComponentType::Description).unwrap().rows, 1);
        assert!(read(&report.file(ComponentType::Concept).unwrap().path).contains("404684003"));
    }

    #[test]
    fn test_negative_delta_pairs_rows() {
        let mut registry = make_registry();
        registry.delete_component(ComponentId::Sct(404684003)).unwrap();
        // Synthetic and deleted: written nowhere.
        let synthetic = snomed_model::Concept::new(64572001, MODULE, DefinitionStatus::Primitive);
        registry.register_concept(synthetic).unwrap();
        registry.delete_component(ComponentId::Sct(64572001)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let exporter = Rf2Exporter::new(&registry, ExportConfig::new(20250731));
        let report = exporter.generate_negative_delta(dir.path()).unwrap();
        let concepts = report.file(ComponentType::Concept).unwrap();
        assert_eq!(concepts.rows, 1);
        assert_eq!(
            read(&concepts.path).lines().nth(1).unwrap(),
            "404684003\t\t1\t900000000000207008\t900000000000074008\t\
             404684003\t20250731\t0\t900000000000207008\t900000000000074008"
        );

        let snapshot = exporter.generate_snapshot(dir.path()).unwrap();
        assert_eq!(snapshot.file(ComponentType::Concept).unwrap().rows, 1);
    }

    #[test]
    fn test_unwritable_target_is_output_error() {
        let registry = make_registry();
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"not a directory").unwrap();

        let result = Rf2Exporter::new(&registry, ExportConfig::new(20250101)).generate_snapshot(&blocker);
        assert!(matches!(result, Err(GraphError::Output { .. })));
    }
}
