//! Relationship detectors
//!
//! Each detector is a small declarative rule over the [`ResourceIndex`].
//! Detectors only emit edges to resources present in the batch and fail on
//! fields of the wrong shape.

use kubechart_core::{ProcessedResource, RelationType, Relationship};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::index::ResourceIndex;

/// Finds one family of relationships in a batch
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, index: &ResourceIndex<'_>) -> Result<Vec<Relationship>>;
}

/// Immutable, ordered set of detectors
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorRegistry {
    /// Registry with every built-in detector
    pub fn new() -> Self {
        Self::with_detectors(vec![
            Box::new(SelectorMatch {
                name: "selector-match",
                sources: SERVICE_SELECTORS,
                relation: RelationType::Selects,
            }),
            Box::new(BackendReference),
            Box::new(ScaleTarget {
                sources: SCALERS,
            }),
            Box::new(SelectorMatch {
                name: "disruption-budget",
                sources: BUDGET_SELECTORS,
                relation: RelationType::Protects,
            }),
            Box::new(RoleReference),
            Box::new(ConfigReference),
        ])
    }

    pub fn with_detectors(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    pub fn into_detectors(self) -> Vec<Box<dyn Detector>> {
        self.detectors
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run every detector; the union is deduplicated and sorted
    pub fn run(&self, index: &ResourceIndex<'_>) -> Result<BTreeSet<Relationship>> {
        let mut relationships = BTreeSet::new();
        for detector in &self.detectors {
            let found = detector.detect(index)?;
            debug!(detector = detector.name(), found = found.len(), "detector finished");
            relationships.extend(found);
        }
        Ok(relationships)
    }
}

// --- selector matching -------------------------------------------------------

/// Where a kind keeps its pod label selector
pub struct SelectorSource {
    pub groups: &'static [&'static str],
    pub kind: &'static str,
    /// Path of the label map
    pub path: &'static [&'static str],
    /// An empty label selector selects every pod of the namespace, as a
    /// NetworkPolicy `podSelector: {}` does
    pub empty_selects_all: bool,
}

impl SelectorSource {
    /// `matchExpressions` next to the label map, which are not evaluated
    fn has_expressions(&self, owner: &ProcessedResource) -> bool {
        let Some((_, parent)) = self.path.split_last() else {
            return false;
        };
        let mut path = parent.to_vec();
        path.push("matchExpressions");
        owner
            .object
            .field(&path)
            .and_then(JsonValue::as_array)
            .is_some_and(|e| !e.is_empty())
    }
}

const SERVICE_SELECTORS: &[SelectorSource] = &[
    SelectorSource {
        groups: &[""],
        kind: "Service",
        path: &["spec", "selector"],
        empty_selects_all: false,
    },
    SelectorSource {
        groups: &["networking.k8s.io"],
        kind: "NetworkPolicy",
        path: &["spec", "podSelector", "matchLabels"],
        empty_selects_all: true,
    },
];

const BUDGET_SELECTORS: &[SelectorSource] = &[SelectorSource {
    groups: &["policy"],
    kind: "PodDisruptionBudget",
    path: &["spec", "selector", "matchLabels"],
    empty_selects_all: false,
}];

/// Links a selector owner to every workload in its namespace whose pod
/// template labels contain the selector. An empty selector matches nothing
/// unless the source says it selects the whole namespace.
pub struct SelectorMatch {
    name: &'static str,
    sources: &'static [SelectorSource],
    relation: RelationType,
}

impl Detector for SelectorMatch {
    fn name(&self) -> &'static str {
        self.name
    }

    fn detect(&self, index: &ResourceIndex<'_>) -> Result<Vec<Relationship>> {
        let mut found = Vec::new();
        for source in self.sources {
            for owner in index.of_kind(source.groups, source.kind) {
                let selector = string_map(self.name, owner, owner.object.field(source.path))?;
                let select_all = selector.is_empty();
                if select_all {
                    if !source.empty_selects_all || source.has_expressions(owner) {
                        continue;
                    }
                    debug!(owner = %owner.reference, "empty selector, selecting the whole namespace");
                }
                for workload in index.workloads() {
                    if workload.namespace() != owner.namespace() {
                        continue;
                    }
                    let matches = select_all
                        || workload.pod_labels().is_some_and(|labels| {
                            selector.iter().all(|(k, v)| {
                                labels.get(k).and_then(JsonValue::as_str) == Some(v.as_str())
                            })
                        });
                    if matches {
                        found.push(Relationship::new(
                            owner.reference.clone(),
                            workload.reference.clone(),
                            self.relation,
                        ));
                    }
                }
            }
        }
        Ok(found)
    }
}

// --- traffic routing ---------------------------------------------------------

/// Ingress backends and Gateway API HTTPRoute backendRefs resolved to
/// Services by name
pub struct BackendReference;

impl BackendReference {
    const NAME: &'static str = "backend-reference";

    fn ingress_backends(ingress: &ProcessedResource) -> Result<Vec<String>> {
        let spec = ingress.object.field(&["spec"]);
        let mut backends = Vec::new();
        let mut push = |backend: Option<&JsonValue>| -> Result<()> {
            let Some(backend) = backend else {
                return Ok(());
            };
            let name = backend
                .pointer("/service/name")
                .or_else(|| backend.get("serviceName"));
            if let Some(name) = opt_str(Self::NAME, ingress, name)? {
                backends.push(name.to_string());
            }
            Ok(())
        };

        push(spec.and_then(|s| s.get("defaultBackend")))?;
        push(spec.and_then(|s| s.get("backend")))?;
        for rule in list(Self::NAME, ingress, spec.and_then(|s| s.get("rules")))? {
            for path in list(Self::NAME, ingress, rule.pointer("/http/paths"))? {
                push(path.get("backend"))?;
            }
        }
        Ok(backends)
    }
}

impl Detector for BackendReference {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn detect(&self, index: &ResourceIndex<'_>) -> Result<Vec<Relationship>> {
        let mut found = Vec::new();

        for ingress in index.of_kind(&["networking.k8s.io", "extensions"], "Ingress") {
            for backend in Self::ingress_backends(ingress)? {
                match index.find("", "Service", ingress.namespace(), &backend) {
                    Some(service) => found.push(Relationship::new(
                        ingress.reference.clone(),
                        service.reference.clone(),
                        RelationType::RoutesTo,
                    )),
                    None => debug!(ingress = %ingress.reference, backend = %backend, "backend not in batch"),
                }
            }
        }

        for route in index.of_kind(&["gateway.networking.k8s.io"], "HTTPRoute") {
            let rules = list(Self::NAME, route, route.object.field(&["spec", "rules"]))?;
            for rule in rules {
                for backend in list(Self::NAME, route, rule.get("backendRefs"))? {
                    let Some(name) = opt_str(Self::NAME, route, backend.get("name"))? else {
                        continue;
                    };
                    let kind = opt_str(Self::NAME, route, backend.get("kind"))?.unwrap_or("Service");
                    let group = opt_str(Self::NAME, route, backend.get("group"))?.unwrap_or("");
                    let namespace = opt_str(Self::NAME, route, backend.get("namespace"))?
                        .unwrap_or(route.namespace());
                    if let Some(target) = index.find(group, kind, namespace, name) {
                        found.push(Relationship::new(
                            route.reference.clone(),
                            target.reference.clone(),
                            RelationType::RoutesTo,
                        ));
                    }
                }
            }
        }
        Ok(found)
    }
}

// --- autoscaling -------------------------------------------------------------

/// Kind carrying a `spec.scaleTargetRef`
pub struct ScalerSource {
    pub group: &'static str,
    pub kind: &'static str,
    /// Target kind when `scaleTargetRef.kind` is omitted
    pub default_target: Option<&'static str>,
}

const SCALERS: &[ScalerSource] = &[
    ScalerSource {
        group: "autoscaling",
        kind: "HorizontalPodAutoscaler",
        default_target: None,
    },
    ScalerSource {
        group: "keda.sh",
        kind: "ScaledObject",
        default_target: Some("Deployment"),
    },
];

/// Autoscalers resolved to their target workload
pub struct ScaleTarget {
    sources: &'static [ScalerSource],
}

impl Detector for ScaleTarget {
    fn name(&self) -> &'static str {
        "scale-target"
    }

    fn detect(&self, index: &ResourceIndex<'_>) -> Result<Vec<Relationship>> {
        let mut found = Vec::new();
        for source in self.sources {
            for scaler in index.of_kind(&[source.group], source.kind) {
                let target = scaler.object.field(&["spec", "scaleTargetRef"]);
                let Some(name) = opt_str(self.name(), scaler, target.and_then(|t| t.get("name")))?
                else {
                    continue;
                };
                let kind = opt_str(self.name(), scaler, target.and_then(|t| t.get("kind")))?
                    .or(source.default_target);
                let Some(kind) = kind else {
                    return Err(detector_error(self.name(), scaler, "scaleTargetRef.kind is missing"));
                };

                let api_version =
                    opt_str(self.name(), scaler, target.and_then(|t| t.get("apiVersion")))?;
                let resolved = match api_version {
                    Some(api_version) => {
                        let group = api_version.rsplit_once('/').map(|(g, _)| g).unwrap_or("");
                        index.find(group, kind, scaler.namespace(), name)
                    }
                    None => index.find_kind(kind, scaler.namespace(), name),
                };
                match resolved {
                    Some(workload) => found.push(Relationship::new(
                        scaler.reference.clone(),
                        workload.reference.clone(),
                        RelationType::Scales,
                    )),
                    None => debug!(scaler = %scaler.reference, kind, name, "scale target not in batch"),
                }
            }
        }
        Ok(found)
    }
}

// --- RBAC --------------------------------------------------------------------

/// RoleBindings and ClusterRoleBindings resolved to the role they grant.
/// ClusterRole targets are cluster-scoped.
pub struct RoleReference;

impl Detector for RoleReference {
    fn name(&self) -> &'static str {
        "role-reference"
    }

    fn detect(&self, index: &ResourceIndex<'_>) -> Result<Vec<Relationship>> {
        let mut found = Vec::new();
        let rbac = ["rbac.authorization.k8s.io"];
        let bindings = index
            .of_kind(&rbac, "RoleBinding")
            .chain(index.of_kind(&rbac, "ClusterRoleBinding"));

        for binding in bindings {
            let role_ref = binding.object.field(&["roleRef"]);
            let kind = opt_str(self.name(), binding, role_ref.and_then(|r| r.get("kind")))?;
            let name = opt_str(self.name(), binding, role_ref.and_then(|r| r.get("name")))?;
            let (Some(kind), Some(name)) = (kind, name) else {
                return Err(detector_error(self.name(), binding, "roleRef needs kind and name"));
            };
            let namespace = match kind {
                "ClusterRole" => "",
                _ => binding.namespace(),
            };
            if let Some(role) = index.find(rbac[0], kind, namespace, name) {
                found.push(Relationship::new(
                    binding.reference.clone(),
                    role.reference.clone(),
                    RelationType::BindsRole,
                ));
            }
        }
        Ok(found)
    }
}

// --- configuration -----------------------------------------------------------

/// Workload -> ConfigMap/Secret edges from the dependencies recorded by the
/// processor, kept only when the target is part of the batch
pub struct ConfigReference;

impl Detector for ConfigReference {
    fn name(&self) -> &'static str {
        "config-reference"
    }

    fn detect(&self, index: &ResourceIndex<'_>) -> Result<Vec<Relationship>> {
        let mut found = Vec::new();
        for resource in index.resources() {
            for dependency in &resource.dependencies {
                let (group, kind, namespace, name) = dependency.identity();
                match index.find(group, kind, namespace, name) {
                    Some(target) => found.push(Relationship::new(
                        resource.reference.clone(),
                        target.reference.clone(),
                        RelationType::UsesConfig,
                    )),
                    None => warn!(
                        resource = %resource.reference,
                        missing = %dependency,
                        "referenced resource is not part of the input"
                    ),
                }
            }
        }
        Ok(found)
    }
}

// --- field helpers -----------------------------------------------------------

fn detector_error(detector: &'static str, resource: &ProcessedResource, message: &str) -> AnalysisError {
    AnalysisError::Detector {
        detector,
        resource: resource.reference.clone(),
        message: message.to_string(),
    }
}

/// Optional string field; any other type is an error
fn opt_str<'v>(
    detector: &'static str,
    resource: &ProcessedResource,
    value: Option<&'v JsonValue>,
) -> Result<Option<&'v str>> {
    match value {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(detector_error(
            detector,
            resource,
            &format!("expected a string, found {}", other),
        )),
    }
}

/// Optional list field; absent is empty, any other type is an error
fn list<'v>(
    detector: &'static str,
    resource: &ProcessedResource,
    value: Option<&'v JsonValue>,
) -> Result<&'v [JsonValue]> {
    match value {
        None | Some(JsonValue::Null) => Ok(&[]),
        Some(JsonValue::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(detector_error(
            detector,
            resource,
            &format!("expected a list, found {}", other),
        )),
    }
}

/// Optional string-to-string map
fn string_map(
    detector: &'static str,
    resource: &ProcessedResource,
    value: Option<&JsonValue>,
) -> Result<Vec<(String, String)>> {
    match value {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Object(map)) => map
            .iter()
            .map(|(k, v)| match v {
                JsonValue::String(s) => Ok((k.clone(), s.clone())),
                other => Err(detector_error(
                    detector,
                    resource,
                    &format!("selector value for '{}' must be a string, found {}", k, other),
                )),
            })
            .collect(),
        Some(other) => Err(detector_error(
            detector,
            resource,
            &format!("expected a label map, found {}", other),
        )),
    }
}
