//! Values handling with deep merge support

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::error::Result;

/// Values container with deep merge capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self(value))
    }

    /// Render as a YAML document
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    /// Deep merge another Values into this one
    ///
    /// Rules:
    /// - Scalars: overlay replaces base
    /// - Objects: recursive merge
    /// - Arrays: overlay replaces base (not appended)
    pub fn merge(&mut self, overlay: &Values) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Set a value at a path, creating intermediate objects
    pub fn set(&mut self, path: &ValuesPath, value: JsonValue) {
        set_nested(&mut self.0, path.segments(), value);
    }

    /// Set a value under a single top-level key
    pub fn insert(&mut self, key: &str, value: JsonValue) {
        set_nested(&mut self.0, &[key.to_string()], value);
    }

    /// Get a value by dotted path (e.g., "services.web.deployment.replicas")
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        path.split('.')
            .try_fold(&self.0, |value, key| value.as_object()?.get(key))
    }

    /// Get a value by segment path
    pub fn get_path(&self, path: &ValuesPath) -> Option<&JsonValue> {
        path.segments()
            .iter()
            .try_fold(&self.0, |value, key| value.as_object()?.get(key))
    }

    /// Top-level keys in insertion order
    pub fn keys(&self) -> Vec<&str> {
        match &self.0 {
            JsonValue::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert to JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

/// Location of a values fragment inside a chart's values tree.
///
/// Stored as segments rather than a dotted string because resource names
/// (ConfigMap and Secret names in particular) may themselves contain dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValuesPath(Vec<String>);

impl ValuesPath {
    pub fn new(key: impl Into<String>) -> Self {
        Self(vec![key.into()])
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// `configMaps` + `app-settings` -> `configMaps.app-settings`
    pub fn nested(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self(vec![parent.into(), child.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Path rooted under the given prefix segments
    pub fn prefixed(&self, prefix: &[&str]) -> Self {
        let mut segments: Vec<String> = prefix.iter().map(|s| s.to_string()).collect();
        segments.extend(self.0.iter().cloned());
        Self(segments)
    }

    /// Same path with `-suffix` appended to the last segment
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut segments = self.0.clone();
        if let Some(last) = segments.last_mut() {
            last.push('-');
            last.push_str(suffix);
        }
        Self(segments)
    }

    /// Go template expression reading this path from `root`.
    ///
    /// Uses `index` so segments containing `-` or `.` stay addressable:
    /// `(index .Values "services" "my-app" "deployment")`
    pub fn index_expr(&self, root: &str) -> String {
        if self.0.is_empty() {
            return root.to_string();
        }
        let keys: Vec<String> = self.0.iter().map(|s| format!("{:?}", s)).collect();
        format!("(index {} {})", root, keys.join(" "))
    }
}

impl fmt::Display for ValuesPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Deep merge two JSON values
fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Set a nested value by path
fn set_nested(value: &mut JsonValue, path: &[String], new_value: JsonValue) {
    let Some((key, remaining)) = path.split_first() else {
        *value = new_value;
        return;
    };

    if !value.is_object() {
        *value = JsonValue::Object(serde_json::Map::new());
    }

    if let JsonValue::Object(map) = value {
        if remaining.is_empty() {
            map.insert(key.clone(), new_value);
        } else {
            let entry = map
                .entry(key.clone())
                .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
            set_nested(entry, remaining, new_value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge() {
        let mut base = Values::from_yaml(
            r#"
image:
  repository: nginx
  tag: "1.0"
replicas: 1
"#,
        )
        .unwrap();

        let overlay = Values::from_yaml(
            r#"
image:
  tag: "2.0"
  pullPolicy: Always
replicas: 3
"#,
        )
        .unwrap();

        base.merge(&overlay);

        assert_eq!(base.get("image.repository").unwrap(), "nginx");
        assert_eq!(base.get("image.tag").unwrap(), "2.0");
        assert_eq!(base.get("image.pullPolicy").unwrap(), "Always");
        assert_eq!(base.get("replicas").unwrap(), 3);
    }

    #[test]
    fn test_set_by_segments_keeps_dots_in_names() {
        let mut values = Values::new();
        let path = ValuesPath::nested("configMaps", "app.settings").prefixed(&["services", "web"]);
        values.set(&path, json!({"data": {"a": "1"}}));

        assert_eq!(
            values.get_path(&path).unwrap(),
            &json!({"data": {"a": "1"}})
        );
        // the dotted accessor cannot address a key containing a dot
        assert!(values.get("services.web.configMaps.app.settings").is_none());
    }

    #[test]
    fn test_set_merges_siblings() {
        let mut values = Values::new();
        values.set(&ValuesPath::nested("secrets", "a"), json!({"type": "Opaque"}));
        values.set(&ValuesPath::nested("secrets", "b"), json!({"type": "Opaque"}));

        assert_eq!(values.get("secrets.a.type").unwrap(), "Opaque");
        assert_eq!(values.get("secrets.b.type").unwrap(), "Opaque");
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut values = Values::new();
        values.insert("global", json!({}));
        values.insert("webapp", json!({}));
        values.insert("api", json!({}));
        assert_eq!(values.keys(), vec!["global", "webapp", "api"]);
    }

    #[test]
    fn test_values_path_display_and_suffix() {
        let path = ValuesPath::new("deployment");
        assert_eq!(path.to_string(), "deployment");
        assert_eq!(path.with_suffix("worker").to_string(), "deployment-worker");
        assert_eq!(
            ValuesPath::nested("configMaps", "shared").to_string(),
            "configMaps.shared"
        );
    }

    #[test]
    fn test_index_expr() {
        let path = ValuesPath::new("deployment").prefixed(&["services", "my-app"]);
        assert_eq!(
            path.index_expr(".Values"),
            r#"(index .Values "services" "my-app" "deployment")"#
        );
        assert_eq!(ValuesPath::from_segments(Vec::<String>::new()).index_expr(".Values"), ".Values");
    }
}
