//! Generation options

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};

/// Maximum edit distance for "did you mean" suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Chart packaging topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One chart holding every service
    #[default]
    Universal,
    /// One chart per service
    Separate,
    /// A library chart plus thin wrapper charts
    Library,
    /// A parent chart with one subchart per service
    Umbrella,
}

impl OutputMode {
    pub const ALL: [OutputMode; 4] = [
        OutputMode::Universal,
        OutputMode::Separate,
        OutputMode::Library,
        OutputMode::Umbrella,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Universal => "universal",
            OutputMode::Separate => "separate",
            OutputMode::Library => "library",
            OutputMode::Umbrella => "umbrella",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        if let Some(mode) = Self::ALL.iter().find(|m| m.as_str() == wanted) {
            return Ok(*mode);
        }

        let suggestion = Self::ALL
            .iter()
            .map(|m| (m.as_str(), strsim::levenshtein(&wanted, m.as_str())))
            .filter(|(_, distance)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(_, distance)| *distance)
            .map(|(name, _)| name.to_string());

        Err(CoreError::UnknownMode {
            value: s.to_string(),
            suggestion,
        })
    }
}

/// External library chart declared by the scaffold step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaffoldOptions {
    /// Dependency name of the shared library chart
    pub library_name: String,

    /// Version constraint
    #[serde(default = "default_library_version")]
    pub library_version: String,

    /// Repository URL
    pub library_repository: String,
}

fn default_library_version() -> String {
    "*".to_string()
}

impl ScaffoldOptions {
    pub fn new(name: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            library_name: name.into(),
            library_version: default_library_version(),
            library_repository: repository.into(),
        }
    }
}

/// Everything the chart generators need besides the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOptions {
    /// Chart name (parent chart, universal chart, or library prefix)
    pub chart_name: String,

    /// Chart version, must be SemVer
    #[serde(default = "default_chart_version")]
    pub chart_version: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub app_version: String,

    /// Target namespace written to `global.namespace`
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub mode: OutputMode,

    #[serde(default)]
    pub scaffold: Option<ScaffoldOptions>,
}

fn default_chart_version() -> String {
    "0.1.0".to_string()
}

fn default_app_version() -> String {
    "latest".to_string()
}

impl GenerateOptions {
    pub fn new(chart_name: impl Into<String>) -> Self {
        Self {
            chart_name: chart_name.into(),
            chart_version: default_chart_version(),
            app_version: default_app_version(),
            namespace: None,
            mode: OutputMode::default(),
            scaffold: None,
        }
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_scaffold(mut self, scaffold: ScaffoldOptions) -> Self {
        self.scaffold = Some(scaffold);
        self
    }

    /// Check the chart name and version before any chart is built
    pub fn validate(&self) -> Result<()> {
        if self.chart_name.is_empty() {
            return Err(CoreError::InvalidOption {
                message: "chart name must not be empty".to_string(),
            });
        }
        if !self
            .chart_name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(CoreError::InvalidOption {
                message: format!(
                    "chart name '{}' may only contain lowercase letters, digits and '-'",
                    self.chart_name
                ),
            });
        }

        semver::Version::parse(&self.chart_version).map_err(|source| {
            CoreError::InvalidVersion {
                value: self.chart_version.clone(),
                source,
            }
        })?;

        if let Some(scaffold) = &self.scaffold
            && scaffold.library_name.is_empty()
        {
            return Err(CoreError::InvalidOption {
                message: "scaffold library name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("universal".parse::<OutputMode>().unwrap(), OutputMode::Universal);
        assert_eq!("Umbrella".parse::<OutputMode>().unwrap(), OutputMode::Umbrella);
        for mode in OutputMode::ALL {
            assert_eq!(mode.to_string().parse::<OutputMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_suggestion() {
        let err = "seperate".parse::<OutputMode>().unwrap_err();
        assert!(err.to_string().contains("did you mean 'separate'"));

        let err = "kustomize".parse::<OutputMode>().unwrap_err();
        assert!(!err.to_string().contains("did you mean"));
    }

    #[test]
    fn test_defaults() {
        let opts = GenerateOptions::new("shop");
        assert_eq!(opts.chart_version, "0.1.0");
        assert_eq!(opts.app_version, "latest");
        assert_eq!(opts.mode, OutputMode::Universal);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_invalid_version() {
        let mut opts = GenerateOptions::new("shop");
        opts.chart_version = "1.0".to_string();
        let err = opts.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidVersion { .. }));
    }

    #[test]
    fn test_invalid_name() {
        assert!(GenerateOptions::new("").validate().is_err());
        assert!(GenerateOptions::new("My_Chart").validate().is_err());
    }
}
