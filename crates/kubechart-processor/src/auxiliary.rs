//! Rules for kinds that support a workload
//!
//! Each kind is validated against its `k8s-openapi` model and its content
//! fields are copied verbatim into values.

use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler as HorizontalPodAutoscalerV1;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use k8s_openapi::api::core::v1::{
    ConfigMap, PersistentVolumeClaim, Secret, Service, ServiceAccount,
};
use k8s_openapi::api::networking::v1::{Ingress, NetworkPolicy};
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use kubechart_core::{K8sObject, ValuesPath};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue, json};
use std::collections::BTreeSet;

use crate::error::{ProcessError, Result};
use crate::registry::{ResourceRule, RuleOutput};
use crate::templates;

type Validator = fn(JsonValue) -> serde_json::Result<()>;

fn validate<K: DeserializeOwned>(value: JsonValue) -> serde_json::Result<()> {
    serde_json::from_value::<K>(value).map(|_| ())
}

/// Static description of one auxiliary kind
#[derive(Debug, Clone, Copy)]
pub struct AuxiliaryKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub category: &'static str,
    /// Parent key when values are nested by resource name
    pub nest_under: Option<&'static str>,
    pub fields: &'static [&'static str],
    pub namespaced: bool,
    validator: Validator,
}

impl AuxiliaryKind {
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

const SPEC: &[&str] = &["spec"];
const CONFIG_FIELDS: &[&str] = &["immutable", "data", "binaryData"];

pub const AUXILIARY_KINDS: &[AuxiliaryKind] = &[
    AuxiliaryKind {
        group: "",
        version: "v1",
        kind: "Service",
        category: "service",
        nest_under: None,
        fields: SPEC,
        namespaced: true,
        validator: validate::<Service>,
    },
    AuxiliaryKind {
        group: "",
        version: "v1",
        kind: "ConfigMap",
        category: "configMap",
        nest_under: Some("configMaps"),
        fields: CONFIG_FIELDS,
        namespaced: true,
        validator: validate::<ConfigMap>,
    },
    AuxiliaryKind {
        group: "",
        version: "v1",
        kind: "Secret",
        category: "secret",
        nest_under: Some("secrets"),
        fields: &["type", "immutable", "data", "stringData"],
        namespaced: true,
        validator: validate::<Secret>,
    },
    AuxiliaryKind {
        group: "",
        version: "v1",
        kind: "ServiceAccount",
        category: "serviceAccount",
        nest_under: None,
        fields: &["automountServiceAccountToken", "imagePullSecrets", "secrets"],
        namespaced: true,
        validator: validate::<ServiceAccount>,
    },
    AuxiliaryKind {
        group: "",
        version: "v1",
        kind: "PersistentVolumeClaim",
        category: "persistentVolumeClaim",
        nest_under: Some("persistentVolumeClaims"),
        fields: SPEC,
        namespaced: true,
        validator: validate::<PersistentVolumeClaim>,
    },
    AuxiliaryKind {
        group: "networking.k8s.io",
        version: "v1",
        kind: "Ingress",
        category: "ingress",
        nest_under: None,
        fields: SPEC,
        namespaced: true,
        validator: validate::<Ingress>,
    },
    AuxiliaryKind {
        group: "networking.k8s.io",
        version: "v1",
        kind: "NetworkPolicy",
        category: "networkPolicy",
        nest_under: None,
        fields: SPEC,
        namespaced: true,
        validator: validate::<NetworkPolicy>,
    },
    AuxiliaryKind {
        group: "autoscaling",
        version: "v2",
        kind: "HorizontalPodAutoscaler",
        category: "horizontalPodAutoscaler",
        nest_under: None,
        fields: SPEC,
        namespaced: true,
        validator: validate::<HorizontalPodAutoscaler>,
    },
    AuxiliaryKind {
        group: "autoscaling",
        version: "v1",
        kind: "HorizontalPodAutoscaler",
        category: "horizontalPodAutoscalerV1",
        nest_under: None,
        fields: SPEC,
        namespaced: true,
        validator: validate::<HorizontalPodAutoscalerV1>,
    },
    AuxiliaryKind {
        group: "policy",
        version: "v1",
        kind: "PodDisruptionBudget",
        category: "podDisruptionBudget",
        nest_under: None,
        fields: SPEC,
        namespaced: true,
        validator: validate::<PodDisruptionBudget>,
    },
    AuxiliaryKind {
        group: "rbac.authorization.k8s.io",
        version: "v1",
        kind: "Role",
        category: "role",
        nest_under: None,
        fields: &["rules"],
        namespaced: true,
        validator: validate::<Role>,
    },
    AuxiliaryKind {
        group: "rbac.authorization.k8s.io",
        version: "v1",
        kind: "ClusterRole",
        category: "clusterRole",
        nest_under: None,
        fields: &["rules", "aggregationRule"],
        namespaced: false,
        validator: validate::<ClusterRole>,
    },
    AuxiliaryKind {
        group: "rbac.authorization.k8s.io",
        version: "v1",
        kind: "RoleBinding",
        category: "roleBinding",
        nest_under: None,
        fields: &["roleRef", "subjects"],
        namespaced: true,
        validator: validate::<RoleBinding>,
    },
    AuxiliaryKind {
        group: "rbac.authorization.k8s.io",
        version: "v1",
        kind: "ClusterRoleBinding",
        category: "clusterRoleBinding",
        nest_under: None,
        fields: &["roleRef", "subjects"],
        namespaced: false,
        validator: validate::<ClusterRoleBinding>,
    },
];

/// ConfigMap re-dispatched because it carries the dashboard label
pub const DASHBOARD: AuxiliaryKind = AuxiliaryKind {
    group: "",
    version: "v1",
    kind: "ConfigMap",
    category: "dashboard",
    nest_under: Some("dashboards"),
    fields: CONFIG_FIELDS,
    namespaced: true,
    validator: validate::<ConfigMap>,
};

pub const DASHBOARD_LABEL: &str = "grafana_dashboard";

pub struct AuxiliaryRule {
    spec: AuxiliaryKind,
}

impl AuxiliaryRule {
    pub fn new(spec: AuxiliaryKind) -> Self {
        Self { spec }
    }
}

impl ResourceRule for AuxiliaryRule {
    fn name(&self) -> &'static str {
        self.spec.category
    }

    fn apply(&self, object: &K8sObject) -> Result<RuleOutput> {
        let full = object.to_value()?;
        (self.spec.validator)(full)
            .map_err(|e| ProcessError::malformed(object.reference(), e.to_string()))?;

        let mut values = Map::new();
        values.insert("name".to_string(), json!(object.name()));
        values.insert("labels".to_string(), json!(object.labels().cloned().unwrap_or_default()));
        if let Some(annotations) = object.annotations() {
            values.insert("annotations".to_string(), json!(annotations));
        }

        for field in self.spec.fields {
            if let Some(value) = object.field(&[*field]) {
                values.insert(field.to_string(), value.clone());
            }
        }

        if self.spec.kind == "Service"
            && let Some(JsonValue::Object(spec)) = values.get_mut("spec")
        {
            strip_cluster_ips(spec);
        }

        let values_path = match self.spec.nest_under {
            Some(parent) => ValuesPath::nested(parent, object.name()),
            None => ValuesPath::new(self.spec.category),
        };

        Ok(RuleOutput {
            template_path: format!("{}.yaml", self.spec.category.to_ascii_lowercase()),
            values_path,
            values: JsonValue::Object(values),
            template: templates::content(
                self.spec.category,
                &self.spec.api_version(),
                self.spec.kind,
                self.spec.fields,
                self.spec.namespaced,
            ),
            dependencies: BTreeSet::new(),
        })
    }
}

/// Drop addresses assigned by the cluster; a headless `None` is intent
fn strip_cluster_ips(spec: &mut Map<String, JsonValue>) {
    let headless = spec.get("clusterIP").and_then(JsonValue::as_str) == Some("None");
    if !headless {
        spec.remove("clusterIP");
        spec.remove("clusterIPs");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(name: &str) -> AuxiliaryKind {
        *AUXILIARY_KINDS.iter().find(|k| k.kind == name).unwrap()
    }

    fn apply(spec: AuxiliaryKind, yaml: &str) -> Result<RuleOutput> {
        AuxiliaryRule::new(spec).apply(&K8sObject::from_yaml(yaml).unwrap())
    }

    #[test]
    fn test_service_drops_cluster_ip() {
        let out = apply(
            kind("Service"),
            r#"
apiVersion: v1
kind: Service
metadata: {name: webapp}
spec:
  clusterIP: 10.0.0.12
  clusterIPs: [10.0.0.12]
  selector: {app: webapp}
  ports:
    - port: 80
      targetPort: 8080
"#,
        )
        .unwrap();
        assert_eq!(out.values_path.to_string(), "service");
        assert_eq!(out.values["spec"]["ports"][0]["port"], 80);
        assert!(out.values["spec"].get("clusterIP").is_none());
        assert!(out.values["spec"].get("clusterIPs").is_none());
    }

    #[test]
    fn test_headless_service_keeps_none() {
        let out = apply(
            kind("Service"),
            "apiVersion: v1\nkind: Service\nmetadata: {name: db}\nspec:\n  clusterIP: None\n",
        )
        .unwrap();
        assert_eq!(out.values["spec"]["clusterIP"], "None");
    }

    #[test]
    fn test_configmap_is_nested_by_name() {
        let out = apply(
            kind("ConfigMap"),
            "apiVersion: v1\nkind: ConfigMap\nmetadata: {name: shared}\ndata:\n  LOG_LEVEL: info\n",
        )
        .unwrap();
        assert_eq!(out.values_path, ValuesPath::nested("configMaps", "shared"));
        assert_eq!(out.values["data"]["LOG_LEVEL"], "info");
        assert_eq!(out.template_path, "configmap.yaml");
    }

    #[test]
    fn test_secret_fields() {
        let out = apply(
            kind("Secret"),
            "apiVersion: v1\nkind: Secret\nmetadata: {name: db}\ntype: Opaque\ndata:\n  password: cGFzcw==\n",
        )
        .unwrap();
        assert_eq!(out.values_path.to_string(), "secrets.db");
        assert_eq!(out.values["type"], "Opaque");
        assert_eq!(out.values["data"]["password"], "cGFzcw==");
    }

    #[test]
    fn test_cluster_role_has_no_namespace() {
        let out = apply(
            kind("ClusterRole"),
            r#"
apiVersion: rbac.authorization.k8s.io/v1
kind: ClusterRole
metadata: {name: reader}
rules:
  - apiGroups: [""]
    resources: [pods]
    verbs: [get, list]
"#,
        )
        .unwrap();
        let body = out.template.render("x");
        assert!(!body.contains("namespace:"));
        assert!(body.contains("rules: {{- toYaml $v.rules | nindent 2 }}"));
        assert_eq!(out.values["rules"][0]["verbs"][1], "list");
    }

    #[test]
    fn test_malformed_content() {
        let err = apply(
            kind("ConfigMap"),
            "apiVersion: v1\nkind: ConfigMap\nmetadata: {name: bad}\ndata: [1, 2]\n",
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Malformed { .. }));
    }

    #[test]
    fn test_every_kind_has_a_distinct_category() {
        let mut categories: Vec<&str> = AUXILIARY_KINDS.iter().map(|k| k.category).collect();
        categories.push(DASHBOARD.category);
        let count = categories.len();
        categories.sort();
        categories.dedup();
        assert_eq!(categories.len(), count);
    }
}
