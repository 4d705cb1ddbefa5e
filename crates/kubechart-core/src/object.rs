//! Generic Kubernetes objects
//!
//! A `K8sObject` wraps a `DynamicObject` (arbitrary key/value tree) together
//! with its parsed Group/Version/Kind and the file it was read from. Typed
//! access to known kinds is layered on top by the processor rules; this type
//! only offers identity, metadata and nested field lookup.

use kube::core::{DynamicObject, GroupVersionKind, TypeMeta};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::reference::ResourceRef;

#[derive(Debug, Clone)]
pub struct K8sObject {
    object: DynamicObject,
    gvk: GroupVersionKind,
    source: Option<PathBuf>,
}

impl K8sObject {
    /// Build from a generic JSON tree (as produced by parsing one YAML document)
    pub fn from_value(value: JsonValue, source: Option<PathBuf>) -> Result<Self> {
        let object: DynamicObject =
            serde_json::from_value(value).map_err(|e| CoreError::InvalidObject {
                message: e.to_string(),
                source_path: source.as_ref().map(|p| p.display().to_string()),
            })?;
        Self::from_dynamic(object, source)
    }

    /// Build from an already deserialized `DynamicObject`
    pub fn from_dynamic(object: DynamicObject, source: Option<PathBuf>) -> Result<Self> {
        let invalid = |message: &str| CoreError::InvalidObject {
            message: message.to_string(),
            source_path: source.as_ref().map(|p| p.display().to_string()),
        };

        let types = object
            .types
            .as_ref()
            .ok_or_else(|| invalid("missing apiVersion or kind"))?;
        if types.api_version.is_empty() || types.kind.is_empty() {
            return Err(invalid("apiVersion and kind must not be empty"));
        }
        if object.metadata.name.is_none() && object.metadata.generate_name.is_none() {
            return Err(invalid("metadata.name is required"));
        }

        let gvk = gvk_from_type_meta(types);
        Ok(Self {
            object,
            gvk,
            source,
        })
    }

    /// Parse a single YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Self::from_value(value, None)
    }

    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    pub fn group(&self) -> &str {
        &self.gvk.group
    }

    pub fn version(&self) -> &str {
        &self.gvk.version
    }

    pub fn kind(&self) -> &str {
        &self.gvk.kind
    }

    pub fn api_version(&self) -> String {
        if self.gvk.group.is_empty() {
            self.gvk.version.clone()
        } else {
            format!("{}/{}", self.gvk.group, self.gvk.version)
        }
    }

    /// `metadata.name`, falling back to `metadata.generateName`
    pub fn name(&self) -> &str {
        self.object
            .metadata
            .name
            .as_deref()
            .or(self.object.metadata.generate_name.as_deref())
            .unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.object.metadata.namespace.as_deref()
    }

    pub fn labels(&self) -> Option<&BTreeMap<String, String>> {
        self.object.metadata.labels.as_ref()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels()
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
    }

    pub fn annotations(&self) -> Option<&BTreeMap<String, String>> {
        self.object.metadata.annotations.as_ref()
    }

    /// Whether a controller owns this object (ReplicaSets of a Deployment,
    /// Pods of a ReplicaSet, ...)
    pub fn is_controller_owned(&self) -> bool {
        self.object
            .metadata
            .owner_references
            .as_ref()
            .is_some_and(|owners| owners.iter().any(|o| o.controller == Some(true)))
    }

    /// Everything outside `apiVersion`, `kind` and `metadata`
    pub fn content(&self) -> &JsonValue {
        &self.object.data
    }

    /// Nested field lookup into the content tree, e.g. `&["spec", "selector"]`
    pub fn field(&self, path: &[&str]) -> Option<&JsonValue> {
        path.iter()
            .try_fold(&self.object.data, |value, key| value.get(*key))
    }

    /// Full object as a JSON tree, including `apiVersion` and `kind`
    pub fn to_value(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(&self.object)?)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(
            &self.gvk.group,
            &self.gvk.version,
            &self.gvk.kind,
            self.namespace().unwrap_or_default(),
            self.name(),
        )
    }
}

fn gvk_from_type_meta(tm: &TypeMeta) -> GroupVersionKind {
    let (group, version) = match tm.api_version.rsplit_once('/') {
        Some((g, v)) => (g.to_string(), v.to_string()),
        None => (String::new(), tm.api_version.clone()),
    };

    GroupVersionKind {
        group,
        version,
        kind: tm.kind.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: webapp
  namespace: prod
  labels:
    app.kubernetes.io/name: webapp
spec:
  replicas: 3
  selector:
    matchLabels:
      app: webapp
"#;

    #[test]
    fn test_parse_identity() {
        let obj = K8sObject::from_yaml(DEPLOYMENT).unwrap();
        assert_eq!(obj.group(), "apps");
        assert_eq!(obj.version(), "v1");
        assert_eq!(obj.kind(), "Deployment");
        assert_eq!(obj.api_version(), "apps/v1");
        assert_eq!(obj.name(), "webapp");
        assert_eq!(obj.namespace(), Some("prod"));
        assert_eq!(obj.label("app.kubernetes.io/name"), Some("webapp"));
    }

    #[test]
    fn test_core_group_is_empty() {
        let obj = K8sObject::from_yaml("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cfg\n")
            .unwrap();
        assert_eq!(obj.group(), "");
        assert_eq!(obj.reference(), ResourceRef::core("ConfigMap", "", "cfg"));
    }

    #[test]
    fn test_field_lookup() {
        let obj = K8sObject::from_yaml(DEPLOYMENT).unwrap();
        assert_eq!(obj.field(&["spec", "replicas"]).unwrap(), 3);
        assert_eq!(
            obj.field(&["spec", "selector", "matchLabels", "app"]).unwrap(),
            "webapp"
        );
        assert!(obj.field(&["spec", "template"]).is_none());
    }

    #[test]
    fn test_to_value_keeps_type_meta() {
        let obj = K8sObject::from_yaml(DEPLOYMENT).unwrap();
        let value = obj.to_value().unwrap();
        assert_eq!(value["apiVersion"], "apps/v1");
        assert_eq!(value["kind"], "Deployment");
        assert_eq!(value["spec"]["replicas"], 3);
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let err = K8sObject::from_yaml("apiVersion: v1\nmetadata:\n  name: x\n").unwrap_err();
        assert!(err.to_string().contains("Invalid resource"));
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = K8sObject::from_yaml("apiVersion: v1\nkind: ConfigMap\nmetadata: {}\n")
            .unwrap_err();
        assert!(err.to_string().contains("metadata.name"));
    }

    #[test]
    fn test_controller_owned() {
        let obj = K8sObject::from_yaml(
            r#"
apiVersion: apps/v1
kind: ReplicaSet
metadata:
  name: webapp-5d8f
  ownerReferences:
    - apiVersion: apps/v1
      kind: Deployment
      name: webapp
      uid: "1234"
      controller: true
"#,
        )
        .unwrap();
        assert!(obj.is_controller_owned());
    }
}
