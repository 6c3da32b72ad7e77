//! One release run: load, check alignment, write packages.

use snomed_graph::rf2::{GenerationReport, Rf2Exporter};
use snomed_graph::{detect_misalignments, repair_misalignments, GraphRegistry, Rf2Package, UnpromotedChanges};

use crate::config::{parse_date, ToolConfig};
use crate::error::{ToolError, ToolResult};

/// What a run did.
#[derive(Debug)]
pub struct RunSummary {
    /// Release date the packages were written for.
    pub release_date: u32,
    /// Alignment defects found after loading.
    pub misalignments: usize,
    /// Defects repaired.
    pub repaired: usize,
    /// Components named by the input delta, with their owning concepts.
    pub unpromoted_changes: usize,
    /// Packages written, delta first.
    pub reports: Vec<GenerationReport>,
}

/// Runs the tool against `config`.
///
/// Writes `Delta/` and `Deleted/` under the output path, and `Snapshot/`
/// when configured.
pub fn run(config: &ToolConfig) -> ToolResult<RunSummary> {
    tracing::info!("Loading RF2 package from {}", config.data_path.display());
    let package = Rf2Package::open(&config.data_path)?;
    let mut release_date = package.release_date();
    let mut registry = GraphRegistry::from_package(&package)?;

    let mut unpromoted_changes = 0;
    if let Some(delta_path) = &config.delta_path {
        tracing::info!("Applying delta from {}", delta_path.display());
        let delta = Rf2Package::open(delta_path)?;
        registry.load(&delta)?;
        unpromoted_changes = UnpromotedChanges::from_package(&delta, Some(&registry))?.len();
        if delta.release_date().is_some() {
            release_date = delta.release_date();
        }
    }

    let release_date = match (config.release_date, release_date) {
        (Some(date), _) => date,
        (None, Some(found)) => parse_date("release date from file names", &found)?,
        (None, None) => {
            return Err(ToolError::Config(
                "no release date configured and none found in the input file names".to_string(),
            ))
        }
    };

    let issues = detect_misalignments(&registry, &config.alignment_config())?;
    let repaired = if config.repair_alignment && !issues.is_empty() {
        repair_misalignments(&mut registry, &issues)?
    } else {
        0
    };
    tracing::info!("{} alignment defects, {} repaired", issues.len(), repaired);

    let exporter = Rf2Exporter::new(&registry, config.export_config(release_date));
    let mut reports = vec![
        exporter.generate_delta(&config.output_path)?,
        exporter.generate_negative_delta(&config.output_path)?,
    ];
    if config.write_snapshot {
        reports.push(exporter.generate_snapshot(&config.output_path)?);
    }

    Ok(RunSummary {
        release_date,
        misalignments: issues.len(),
        repaired,
        unpromoted_changes,
        reports,
    })
}
