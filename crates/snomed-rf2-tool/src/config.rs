//! Tool configuration from environment variables and an optional JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snomed_graph::{AlignmentConfig, ExportConfig};
use snomed_model::SctId;

use crate::error::{ToolError, ToolResult};

/// Names a JSON file the environment is layered over.
pub const CONFIG_FILE_VAR: &str = "SNOMED_TOOL_CONFIG";

const DEFAULT_DATA_PATH: &str = "data";
const DEFAULT_OUTPUT_PATH: &str = "output";

/// Settings for one run of the tool.
///
/// Every field can come from the JSON file, and each has an environment
/// variable that takes precedence over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Release package to load (`SNOMED_DATA_PATH`), a directory or zip.
    pub data_path: PathBuf,
    /// Delta applied on top of it (`SNOMED_DELTA_PATH`).
    pub delta_path: Option<PathBuf>,
    /// Where packages are written (`SNOMED_OUTPUT_PATH`).
    pub output_path: PathBuf,
    /// Release date of written files (`SNOMED_RELEASE_DATE`). Taken from the
    /// input file names when absent.
    pub release_date: Option<u32>,
    /// Edition code (`SNOMED_EDITION`).
    pub edition: String,
    /// Language code (`SNOMED_LANGUAGE`).
    pub language: String,
    /// Move misaligned components into their owner's module
    /// (`SNOMED_REPAIR_ALIGNMENT`).
    pub repair_alignment: bool,
    /// Also write a full snapshot (`SNOMED_WRITE_SNAPSHOT`).
    pub write_snapshot: bool,
    /// Modules never reported by the alignment check.
    pub exempt_modules: Option<Vec<SctId>>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            delta_path: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            release_date: None,
            edition: "INT".to_string(),
            language: "en".to_string(),
            repair_alignment: false,
            write_snapshot: false,
            exempt_modules: None,
        }
    }
}

impl ToolConfig {
    /// Reads the process environment.
    pub fn from_env() -> ToolResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from `lookup`, which maps variable names to
    /// values.
    ///
    /// # Examples
    ///
    /// ```
    /// use snomed_rf2_tool::ToolConfig;
    ///
    /// let config = ToolConfig::from_lookup(|name| match name {
    ///     "SNOMED_DATA_PATH" => Some("release.zip".to_string()),
    ///     "SNOMED_REPAIR_ALIGNMENT" => Some("true".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(config.data_path.to_str(), Some("release.zip"));
    /// assert!(config.repair_alignment);
    /// assert!(!config.write_snapshot);
    /// ```
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ToolResult<Self> {
        let mut config = match lookup(CONFIG_FILE_VAR) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(v) = lookup("SNOMED_DATA_PATH") {
            config.data_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SNOMED_DELTA_PATH") {
            config.delta_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SNOMED_OUTPUT_PATH") {
            config.output_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SNOMED_RELEASE_DATE") {
            config.release_date = Some(parse_date("SNOMED_RELEASE_DATE", &v)?);
        }
        if let Some(v) = lookup("SNOMED_EDITION") {
            config.edition = v;
        }
        if let Some(v) = lookup("SNOMED_LANGUAGE") {
            config.language = v;
        }
        if let Some(v) = lookup("SNOMED_REPAIR_ALIGNMENT") {
            config.repair_alignment = parse_flag("SNOMED_REPAIR_ALIGNMENT", &v)?;
        }
        if let Some(v) = lookup("SNOMED_WRITE_SNAPSHOT") {
            config.write_snapshot = parse_flag("SNOMED_WRITE_SNAPSHOT", &v)?;
        }
        Ok(config)
    }

    /// Reads a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> ToolResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!("Read tool configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Writer settings for `release_date`.
    pub fn export_config(&self, release_date: u32) -> ExportConfig {
        ExportConfig::new(release_date)
            .with_edition(self.edition.clone())
            .with_language(self.language.clone())
    }

    /// Alignment settings.
    pub fn alignment_config(&self) -> AlignmentConfig {
        match &self.exempt_modules {
            Some(modules) => AlignmentConfig {
                exempt_modules: modules.clone(),
            },
            None => AlignmentConfig::default(),
        }
    }
}

fn parse_flag(name: &str, value: &str) -> ToolResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ToolError::Config(format!("{} must be a boolean, got '{}'", name, other))),
    }
}

/// Parses a `YYYYMMDD` date.
pub fn parse_date(name: &str, value: &str) -> ToolResult<u32> {
    let value = value.trim();
    if value.len() != 8 {
        return Err(ToolError::Config(format!("{} must be YYYYMMDD, got '{}'", name, value)));
    }
    value
        .parse()
        .map_err(|_| ToolError::Config(format!("{} must be YYYYMMDD, got '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = ToolConfig::from_lookup(make_lookup(&[])).unwrap();
        assert_eq!(config, ToolConfig::default());
        assert_eq!(config.alignment_config().exempt_modules, AlignmentConfig::default().exempt_modules);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tool.json");
        std::fs::write(
            &file,
            r#"{ "data_path": "from-file", "edition": "NZ", "release_date": 20250101, "exempt_modules": [] }"#,
        )
        .unwrap();

        let config = ToolConfig::from_lookup(make_lookup(&[
            (CONFIG_FILE_VAR, file.to_str().unwrap()),
            ("SNOMED_RELEASE_DATE", "20250731"),
            ("SNOMED_WRITE_SNAPSHOT", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.data_path, PathBuf::from("from-file"));
        assert_eq!(config.edition, "NZ");
        assert_eq!(config.release_date, Some(20250731));
        assert!(config.write_snapshot);
        assert!(config.alignment_config().exempt_modules.is_empty());

        let export = config.export_config(20250731);
        assert_eq!(export.edition, "NZ");
        assert_eq!(export.language_code, "en");
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let err = ToolConfig::from_lookup(make_lookup(&[("SNOMED_REPAIR_ALIGNMENT", "maybe")])).unwrap_err();
        assert!(matches!(err, ToolError::Config(_)));

        let err = ToolConfig::from_lookup(make_lookup(&[("SNOMED_RELEASE_DATE", "2025-07-31")])).unwrap_err();
        assert!(matches!(err, ToolError::Config(_)));
    }

    #[test]
    fn test_malformed_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tool.json");
        std::fs::write(&file, "{ not json").unwrap();

        let err = ToolConfig::from_file(&file).unwrap_err();
        assert!(matches!(err, ToolError::Json(_)));
    }
}
