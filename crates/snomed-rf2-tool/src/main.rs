//! SNOMED CT RF2 release tool binary.

use snomed_rf2_tool::{run, ToolConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ToolConfig::from_env()?;
    let summary = run(&config)?;

    for report in &summary.reports {
        tracing::info!(
            "{}: {} rows in {} files under {}",
            report.mode.label(),
            report.total_rows(),
            report.files.len(),
            report.directory.display()
        );
    }
    if summary.unpromoted_changes > 0 {
        tracing::warn!("{} components carry unpromoted changes", summary.unpromoted_changes);
    }
    Ok(())
}
