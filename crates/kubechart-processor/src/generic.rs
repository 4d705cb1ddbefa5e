//! Fallback rule for kinds without a dedicated rule (custom resources,
//! rarely used built-ins)

use kubechart_core::{K8sObject, ValuesPath};
use serde_json::{Map, Value as JsonValue, json};
use std::collections::BTreeSet;

use crate::error::Result;
use crate::naming::camel_case;
use crate::registry::{ResourceRule, RuleOutput};
use crate::templates;

/// Kinds that never carry a namespace
const CLUSTER_SCOPED: &[&str] = &[
    "APIService",
    "CertificateSigningRequest",
    "ClusterIssuer",
    "ClusterRole",
    "ClusterRoleBinding",
    "CSIDriver",
    "CustomResourceDefinition",
    "IngressClass",
    "MutatingWebhookConfiguration",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PriorityClass",
    "RuntimeClass",
    "StorageClass",
    "ValidatingAdmissionPolicy",
    "ValidatingWebhookConfiguration",
    "VolumeAttachment",
];

/// Top-level keys that are never copied
const RESERVED: &[&str] = &["spec", "status"];

pub fn is_cluster_scoped(kind: &str) -> bool {
    CLUSTER_SCOPED.contains(&kind)
}

/// Preserves `spec` and any other top-level content verbatim
pub struct GenericRule {
    /// Categories owned by typed rules, which a custom kind must not reuse
    reserved_categories: BTreeSet<String>,
}

impl GenericRule {
    pub fn new(reserved_categories: BTreeSet<String>) -> Self {
        Self {
            reserved_categories,
        }
    }

    fn category(&self, kind: &str) -> String {
        let category = camel_case(kind);
        if self.reserved_categories.contains(&category) {
            format!("{}Custom", category)
        } else {
            category
        }
    }
}

impl ResourceRule for GenericRule {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn apply(&self, object: &K8sObject) -> Result<RuleOutput> {
        let spec = object.field(&["spec"]).cloned();
        let enabled = spec
            .as_ref()
            .and_then(|s| s.get("enabled"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(true);

        let mut values = Map::new();
        values.insert("enabled".to_string(), json!(enabled));
        values.insert("apiVersion".to_string(), json!(object.api_version()));
        values.insert("kind".to_string(), json!(object.kind()));
        values.insert("name".to_string(), json!(object.name()));
        values.insert("labels".to_string(), json!(object.labels().cloned().unwrap_or_default()));
        if let Some(annotations) = object.annotations() {
            values.insert("annotations".to_string(), json!(annotations));
        }
        if let Some(spec) = spec {
            values.insert("spec".to_string(), spec);
        }

        let extra: Map<String, JsonValue> = object
            .content()
            .as_object()
            .map(|content| {
                content
                    .iter()
                    .filter(|(key, _)| !RESERVED.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();
        if !extra.is_empty() {
            values.insert("extraFields".to_string(), JsonValue::Object(extra));
        }

        let category = self.category(object.kind());
        Ok(RuleOutput {
            template_path: format!("{}.yaml", object.kind().to_ascii_lowercase()),
            values_path: ValuesPath::new(camel_case(object.kind())),
            template: templates::generic(&category, !is_cluster_scoped(object.kind())),
            values: JsonValue::Object(values),
            dependencies: BTreeSet::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(yaml: &str) -> RuleOutput {
        GenericRule::new(BTreeSet::from(["service".to_string()]))
            .apply(&K8sObject::from_yaml(yaml).unwrap())
            .unwrap()
    }

    #[test]
    fn test_custom_resource() {
        let out = apply(
            r#"
apiVersion: cert-manager.io/v1
kind: Certificate
metadata:
  name: webapp-tls
  namespace: prod
spec:
  secretName: webapp-tls
  dnsNames: [shop.example.com]
status:
  ready: true
"#,
        );
        assert_eq!(out.template_path, "certificate.yaml");
        assert_eq!(out.values_path.to_string(), "certificate");
        assert_eq!(out.template.category(), "certificate");
        assert_eq!(out.values["enabled"], true);
        assert_eq!(out.values["apiVersion"], "cert-manager.io/v1");
        assert_eq!(out.values["spec"]["secretName"], "webapp-tls");
        assert!(out.values.get("extraFields").is_none());
        assert!(out.template.render("x").contains("namespace: {{ $ns }}"));
    }

    #[test]
    fn test_enabled_from_spec() {
        let out = apply(
            "apiVersion: example.com/v1\nkind: Widget\nmetadata: {name: w}\nspec:\n  enabled: false\n",
        );
        assert_eq!(out.values["enabled"], false);

        let out = apply(
            "apiVersion: example.com/v1\nkind: Widget\nmetadata: {name: w}\nspec:\n  enabled: \"no\"\n",
        );
        assert_eq!(out.values["enabled"], true);
    }

    #[test]
    fn test_extra_fields_and_cluster_scope() {
        let out = apply(
            r#"
apiVersion: storage.k8s.io/v1
kind: StorageClass
metadata: {name: fast}
provisioner: ebs.csi.aws.com
parameters: {type: gp3}
"#,
        );
        assert_eq!(out.values["extraFields"]["provisioner"], "ebs.csi.aws.com");
        assert_eq!(out.values_path.to_string(), "storageClass");
        assert!(!out.template.render("x").contains("namespace:"));
    }

    #[test]
    fn test_custom_kind_does_not_reuse_typed_category() {
        let out = apply("apiVersion: serving.knative.dev/v1\nkind: Service\nmetadata: {name: hello}\n");
        assert_eq!(out.template.category(), "serviceCustom");
        assert_eq!(out.values_path.to_string(), "service");
    }
}
