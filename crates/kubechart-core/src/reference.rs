//! Resource identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a Kubernetes resource: group, version, kind, namespace and name.
///
/// Cluster-scoped resources (and resources that did not declare one) carry an
/// empty namespace. The ordering is lexicographic over the tuple, which keeps
/// relationship sets stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Reference to a core (`v1`) resource
    pub fn core(kind: &str, namespace: &str, name: &str) -> Self {
        Self::new("", "v1", kind, namespace, name)
    }

    /// `apiVersion` string for this reference (`apps/v1`, `v1`, ...)
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Version-independent identity, used to resolve references that only
    /// name a group and kind (`roleRef`, `scaleTargetRef`, ...)
    pub fn identity(&self) -> (&str, &str, &str, &str) {
        (&self.group, &self.kind, &self.namespace, &self.name)
    }

    /// Short `Kind/name` form for messages
    pub fn short(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)?;
        if self.namespace.is_empty() {
            write!(f, " {}", self.name)
        } else {
            write!(f, " {}/{}", self.namespace, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version() {
        let deploy = ResourceRef::new("apps", "v1", "Deployment", "prod", "web");
        assert_eq!(deploy.api_version(), "apps/v1");

        let cm = ResourceRef::core("ConfigMap", "prod", "web-config");
        assert_eq!(cm.api_version(), "v1");
    }

    #[test]
    fn test_display() {
        let deploy = ResourceRef::new("apps", "v1", "Deployment", "prod", "web");
        assert_eq!(deploy.to_string(), "apps/v1/Deployment prod/web");

        let role = ResourceRef::new("rbac.authorization.k8s.io", "v1", "ClusterRole", "", "reader");
        assert_eq!(role.to_string(), "rbac.authorization.k8s.io/v1/ClusterRole reader");
    }

    #[test]
    fn test_ordering_is_total_over_tuple() {
        let a = ResourceRef::core("ConfigMap", "a", "x");
        let b = ResourceRef::core("ConfigMap", "b", "x");
        let c = ResourceRef::core("Secret", "a", "x");
        let mut refs = vec![c.clone(), b.clone(), a.clone()];
        refs.sort();
        assert_eq!(refs, vec![a, b, c]);
    }
}
