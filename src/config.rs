// Run settings, read from an optional `dashboard.json` next to the binary's
// working directory. Any field left out takes its default.
use crate::loader::NATURAL_GAS_EMISSION_FACTOR;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "dashboard.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("emission_factor must be a finite, non-negative number (got {0})")]
    EmissionFactor(f64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub html_file: String,
    pub summary_file: String,
    pub export_csv: bool,
    /// kg CO₂ per kg H₂ applied to every project.
    pub emission_factor: f64,
    /// Rows shown per view in the console preview.
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("db_operational.xlsx"),
            output_dir: PathBuf::from("."),
            html_file: "hydrogen_dashboard.html".to_string(),
            summary_file: "summary.json".to_string(),
            export_csv: true,
            emission_factor: NATURAL_GAS_EMISSION_FACTOR,
            preview_rows: 5,
        }
    }
}

impl DashboardConfig {
    /// Read `path` if it exists; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path: path.to_path_buf(), source }),
        };
        let cfg: Self = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        if !cfg.emission_factor.is_finite() || cfg.emission_factor < 0.0 {
            return Err(ConfigError::EmissionFactor(cfg.emission_factor));
        }
        Ok(cfg)
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DashboardConfig::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.emission_factor, 10.5);
    }

    #[test]
    fn partial_file_overrides_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"input_path": "data/projects.csv", "emission_factor": 9.0}"#).unwrap();
        let cfg = DashboardConfig::load(&path).unwrap();
        assert_eq!(cfg.input_path, PathBuf::from("data/projects.csv"));
        assert_eq!(cfg.emission_factor, 9.0);
        assert_eq!(cfg.html_file, "hydrogen_dashboard.html");
        assert_eq!(cfg.output_path("summary.json"), PathBuf::from("./summary.json"));
    }

    #[test]
    fn rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"emission_factor": -1}"#).unwrap();
        assert!(matches!(DashboardConfig::load(&path), Err(ConfigError::EmissionFactor(_))));
        std::fs::write(&path, r#"{"emision_factor": 3}"#).unwrap();
        assert!(matches!(DashboardConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
