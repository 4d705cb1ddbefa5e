//! Conversion settings file
//!
//! Read from `--config`, or from `~/.config/kubechart/config.yaml` when that
//! exists. Every field is optional; command-line flags win over file values.

use kubechart_core::ScaffoldOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConvertConfig {
    pub chart_name: Option<String>,
    pub chart_version: Option<String>,
    pub app_version: Option<String>,
    /// Namespace written into `global.namespace`
    pub namespace: Option<String>,
    pub mode: Option<String>,
    pub output: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub scaffold: Option<ScaffoldOptions>,
}

impl ConvertConfig {
    /// Load `explicit` if given, otherwise the default file if present
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::Io {
            message: format!("cannot read config {}: {}", path.display(), e),
        })?;
        serde_yaml::from_str(&content).map_err(|e| CliError::Usage {
            message: format!("invalid config {}: {}", path.display(), e),
            help: Some(
                "known keys: chartName, chartVersion, appVersion, namespace, mode, output, timeout, scaffold"
                    .to_string(),
            ),
        })
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kubechart").join("config.yaml"))
    }
}
