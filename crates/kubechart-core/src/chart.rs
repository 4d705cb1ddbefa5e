//! Generated Helm charts
//!
//! `GeneratedChart` is the in-memory form handed to the writer: Chart.yaml
//! metadata, values, helpers, notes and template files keyed by path.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::values::Values;

/// Chart type (application or library)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Application,
    Library,
}

/// Helm Chart.yaml structure (apiVersion v2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// Always `v2`
    pub api_version: String,

    /// Chart name
    pub name: String,

    /// Chart description
    pub description: String,

    /// Chart type (application or library)
    #[serde(rename = "type")]
    pub chart_type: ChartType,

    /// Chart version (SemVer)
    pub version: String,

    /// App version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    /// Chart dependencies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ChartDependency>,

    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ChartMetadata {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        chart_type: ChartType,
        version: impl Into<String>,
        app_version: Option<String>,
    ) -> Self {
        Self {
            api_version: "v2".to_string(),
            name: name.into(),
            description: description.into(),
            chart_type,
            version: version.into(),
            app_version,
            dependencies: Vec::new(),
            annotations: BTreeMap::new(),
        }
    }
}

/// Chart dependency entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDependency {
    /// Dependency name
    pub name: String,

    /// Version constraint
    pub version: String,

    /// Repository URL (`file://...` for local charts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Condition to enable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Alias name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ChartDependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            repository: None,
            condition: None,
            alias: None,
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// Locked dependency in Chart.lock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedDependency {
    pub name: String,
    pub repository: String,
    pub version: String,
}

/// Helm Chart.lock contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLock {
    pub dependencies: Vec<LockedDependency>,

    /// SHA256 digest of the declared dependency list
    pub digest: String,

    /// RFC 3339 timestamp
    pub generated: String,
}

impl ChartLock {
    /// Lock the dependencies declared by `metadata`, `None` if there are none
    pub fn for_chart(metadata: &ChartMetadata, generated: DateTime<Utc>) -> Result<Option<Self>> {
        if metadata.dependencies.is_empty() {
            return Ok(None);
        }

        let declared = serde_yaml::to_string(&metadata.dependencies)?;
        let dependencies = metadata
            .dependencies
            .iter()
            .map(|d| LockedDependency {
                name: d.name.clone(),
                repository: d.repository.clone().unwrap_or_default(),
                version: d.version.clone(),
            })
            .collect();

        Ok(Some(Self {
            dependencies,
            digest: compute_sha256(declared.as_bytes()),
            generated: generated.to_rfc3339_opts(SecondsFormat::Secs, true),
        }))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Compute SHA256 digest of data
fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(result))
}

/// In-memory chart, ready to be written
#[derive(Debug, Clone)]
pub struct GeneratedChart {
    /// Chart name (also the `name` in Chart.yaml)
    pub name: String,

    /// Output directory relative to the output root
    pub location: PathBuf,

    pub metadata: ChartMetadata,

    pub values: Values,

    /// `templates/_helpers.tpl`
    pub helpers: String,

    /// `templates/NOTES.txt`, absent for library charts
    pub notes: Option<String>,

    /// Files under `templates/`, keyed by file name
    pub templates: BTreeMap<String, String>,

    /// Files at the chart root other than Chart.yaml and values.yaml
    pub external_files: BTreeMap<String, String>,
}

impl GeneratedChart {
    pub fn chart_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.metadata)?)
    }

    pub fn values_yaml(&self) -> Result<String> {
        self.values.to_yaml()
    }

    pub fn dependencies(&self) -> &[ChartDependency] {
        &self.metadata.dependencies
    }

    pub fn is_library(&self) -> bool {
        self.metadata.chart_type == ChartType::Library
    }

    /// Every file of the chart, keyed by path relative to `location`
    pub fn files(&self) -> Result<BTreeMap<String, String>> {
        let mut files = BTreeMap::new();
        files.insert("Chart.yaml".to_string(), self.chart_yaml()?);
        files.insert("values.yaml".to_string(), self.values_yaml()?);
        files.insert("templates/_helpers.tpl".to_string(), self.helpers.clone());
        if let Some(notes) = &self.notes {
            files.insert("templates/NOTES.txt".to_string(), notes.clone());
        }
        for (path, content) in &self.templates {
            files.insert(format!("templates/{}", path), content.clone());
        }
        for (path, content) in &self.external_files {
            files.insert(path.clone(), content.clone());
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn metadata() -> ChartMetadata {
        ChartMetadata::new(
            "shop",
            "Helm chart for shop",
            ChartType::Application,
            "0.1.0",
            Some("latest".to_string()),
        )
    }

    #[test]
    fn test_chart_yaml_shape() {
        let yaml = serde_yaml::to_string(&metadata()).unwrap();
        assert!(yaml.contains("apiVersion: v2"));
        assert!(yaml.contains("type: application"));
        assert!(yaml.contains("appVersion: latest"));
        assert!(!yaml.contains("dependencies"));

        let mut lib = metadata();
        lib.chart_type = ChartType::Library;
        assert!(serde_yaml::to_string(&lib).unwrap().contains("type: library"));
    }

    #[test]
    fn test_dependency_serialization() {
        let mut meta = metadata();
        meta.dependencies.push(
            ChartDependency::new("web", "0.1.0")
                .with_repository("file://charts/web")
                .with_condition("web.enabled"),
        );
        let yaml = serde_yaml::to_string(&meta).unwrap();
        assert!(yaml.contains("repository: file://charts/web"));
        assert!(yaml.contains("condition: web.enabled"));
        assert!(!yaml.contains("alias"));
    }

    #[test]
    fn test_lock_digest_is_stable() {
        let mut meta = metadata();
        assert!(ChartLock::for_chart(&meta, Utc::now()).unwrap().is_none());

        meta.dependencies
            .push(ChartDependency::new("shop-library", "0.1.0").with_repository("file://../shop-library"));
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let a = ChartLock::for_chart(&meta, at).unwrap().unwrap();
        let b = ChartLock::for_chart(&meta, Utc::now()).unwrap().unwrap();

        assert_eq!(a.digest, b.digest);
        assert!(a.digest.starts_with("sha256:"));
        assert_eq!(a.generated, "2024-01-01T00:00:00Z");
        assert_eq!(a.dependencies[0].repository, "file://../shop-library");
    }
}
