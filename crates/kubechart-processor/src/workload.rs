//! Rules for pod-owning controllers
//!
//! The object is first deserialized into its `k8s-openapi` model, which
//! rejects malformed content. Values are then built from the typed model
//! re-serialized to JSON, so defaults and field spelling match the API.

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::PodTemplateSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kubechart_core::{K8sObject, ResourceRef, ValuesPath};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue, json};
use std::collections::BTreeSet;

use crate::error::{ProcessError, Result};
use crate::registry::{ResourceRule, RuleOutput};
use crate::templates;

/// Pod spec fields lifted to the top of a workload's values
const POD_FIELDS: &[&str] = &[
    "serviceAccountName",
    "imagePullSecrets",
    "nodeSelector",
    "tolerations",
    "affinity",
    "topologySpreadConstraints",
    "restartPolicy",
    "terminationGracePeriodSeconds",
    "priorityClassName",
    "hostNetwork",
    "dnsPolicy",
    "securityContext",
    "volumes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    Job,
    CronJob,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 5] = [
        WorkloadKind::Deployment,
        WorkloadKind::StatefulSet,
        WorkloadKind::DaemonSet,
        WorkloadKind::Job,
        WorkloadKind::CronJob,
    ];

    pub fn group(&self) -> &'static str {
        match self {
            WorkloadKind::Job | WorkloadKind::CronJob => "batch",
            _ => "apps",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::StatefulSet => "StatefulSet",
            WorkloadKind::DaemonSet => "DaemonSet",
            WorkloadKind::Job => "Job",
            WorkloadKind::CronJob => "CronJob",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "deployment",
            WorkloadKind::StatefulSet => "statefulSet",
            WorkloadKind::DaemonSet => "daemonSet",
            WorkloadKind::Job => "job",
            WorkloadKind::CronJob => "cronJob",
        }
    }

    /// Spec keys copied verbatim into values
    fn settings(&self) -> &'static [&'static str] {
        match self {
            WorkloadKind::Deployment => &[
                "replicas",
                "strategy",
                "minReadySeconds",
                "revisionHistoryLimit",
                "progressDeadlineSeconds",
                "paused",
            ],
            WorkloadKind::StatefulSet => &[
                "replicas",
                "serviceName",
                "podManagementPolicy",
                "updateStrategy",
                "minReadySeconds",
                "revisionHistoryLimit",
                "persistentVolumeClaimRetentionPolicy",
                "ordinals",
                "volumeClaimTemplates",
            ],
            WorkloadKind::DaemonSet => &["updateStrategy", "minReadySeconds", "revisionHistoryLimit"],
            WorkloadKind::Job => JOB_SETTINGS,
            WorkloadKind::CronJob => &[
                "schedule",
                "timeZone",
                "concurrencyPolicy",
                "suspend",
                "startingDeadlineSeconds",
                "successfulJobsHistoryLimit",
                "failedJobsHistoryLimit",
            ],
        }
    }
}

const JOB_SETTINGS: &[&str] = &[
    "backoffLimit",
    "backoffLimitPerIndex",
    "maxFailedIndexes",
    "completions",
    "completionMode",
    "parallelism",
    "activeDeadlineSeconds",
    "ttlSecondsAfterFinished",
    "podFailurePolicy",
    "podReplacementPolicy",
    "suspend",
];

pub struct WorkloadRule {
    kind: WorkloadKind,
}

impl WorkloadRule {
    pub fn new(kind: WorkloadKind) -> Self {
        Self { kind }
    }
}

/// Parts shared by every controller once the typed model is unpacked
struct Unpacked {
    spec: Map<String, JsonValue>,
    selector: Option<LabelSelector>,
    pod: PodTemplateSpec,
    job: Option<Map<String, JsonValue>>,
}

impl ResourceRule for WorkloadRule {
    fn name(&self) -> &'static str {
        self.kind.category()
    }

    fn apply(&self, object: &K8sObject) -> Result<RuleOutput> {
        let unpacked = match self.kind {
            WorkloadKind::Deployment => {
                let spec = typed::<Deployment>(object)?.spec;
                let spec = required(object, spec, "spec")?;
                Unpacked {
                    spec: to_map(object, &spec)?,
                    selector: Some(spec.selector),
                    pod: spec.template,
                    job: None,
                }
            }
            WorkloadKind::StatefulSet => {
                let spec = typed::<StatefulSet>(object)?.spec;
                let spec = required(object, spec, "spec")?;
                Unpacked {
                    spec: to_map(object, &spec)?,
                    selector: Some(spec.selector),
                    pod: spec.template,
                    job: None,
                }
            }
            WorkloadKind::DaemonSet => {
                let spec = typed::<DaemonSet>(object)?.spec;
                let spec = required(object, spec, "spec")?;
                Unpacked {
                    spec: to_map(object, &spec)?,
                    selector: Some(spec.selector),
                    pod: spec.template,
                    job: None,
                }
            }
            WorkloadKind::Job => {
                let spec = typed::<Job>(object)?.spec;
                let spec = required(object, spec, "spec")?;
                Unpacked {
                    spec: to_map(object, &spec)?,
                    selector: spec.selector,
                    pod: spec.template,
                    job: None,
                }
            }
            WorkloadKind::CronJob => {
                let spec = typed::<CronJob>(object)?.spec;
                let spec = required(object, spec, "spec")?;
                let job_spec = required(object, spec.job_template.spec.clone(), "spec.jobTemplate.spec")?;
                let job_map = to_map(object, &job_spec)?;
                let job = JOB_SETTINGS
                    .iter()
                    .filter_map(|key| job_map.get(*key).map(|v| (key.to_string(), v.clone())))
                    .collect();
                Unpacked {
                    spec: to_map(object, &spec)?,
                    selector: None,
                    pod: job_spec.template,
                    job: Some(job),
                }
            }
        };

        let values = self.values(object, unpacked)?;
        let dependencies = scan_dependencies(object, &values);

        Ok(RuleOutput {
            template_path: format!("{}.yaml", self.kind.category().to_ascii_lowercase()),
            values_path: ValuesPath::new(self.kind.category()),
            template: templates::workload(
                self.kind.category(),
                &object.api_version(),
                self.kind.kind(),
                self.kind.settings(),
                matches!(self.kind, WorkloadKind::Job),
            ),
            values,
            dependencies,
        })
    }
}

impl WorkloadRule {
    fn values(&self, object: &K8sObject, unpacked: Unpacked) -> Result<JsonValue> {
        let mut values = Map::new();
        values.insert("name".to_string(), json!(object.name()));
        values.insert("labels".to_string(), json!(object.labels().cloned().unwrap_or_default()));
        if let Some(annotations) = object.annotations() {
            values.insert("annotations".to_string(), json!(annotations));
        }

        for key in self.kind.settings() {
            if let Some(value) = unpacked.spec.get(*key) {
                values.insert(key.to_string(), value.clone());
            }
        }
        if let Some(job) = unpacked.job
            && !job.is_empty()
        {
            values.insert("job".to_string(), JsonValue::Object(job));
        }

        if self.kind != WorkloadKind::CronJob {
            let selector = unpacked.selector.unwrap_or_default();
            values.insert(
                "selectorLabels".to_string(),
                json!(selector.match_labels.unwrap_or_default()),
            );
            if let Some(expressions) = selector.match_expressions.filter(|e| !e.is_empty()) {
                values.insert("selectorExpressions".to_string(), to_json(object, &expressions)?);
            }
        }

        let pod_meta = unpacked.pod.metadata.unwrap_or_default();
        values.insert("podLabels".to_string(), json!(pod_meta.labels.unwrap_or_default()));
        if let Some(annotations) = pod_meta.annotations {
            values.insert("podAnnotations".to_string(), json!(annotations));
        }

        let pod_spec = required(object, unpacked.pod.spec, "pod template spec")?;
        let mut pod = to_map(object, &pod_spec)?;

        // deprecated alias still found in older manifests
        if !pod.contains_key("serviceAccountName")
            && let Some(account) = pod.get("serviceAccount").cloned()
        {
            pod.insert("serviceAccountName".to_string(), account);
        }

        for key in POD_FIELDS {
            if let Some(value) = pod.get(*key) {
                values.insert(key.to_string(), value.clone());
            }
        }

        for key in ["initContainers", "containers"] {
            if let Some(JsonValue::Array(containers)) = pod.remove(key) {
                let containers: Vec<JsonValue> = containers.into_iter().map(split_image).collect();
                values.insert(key.to_string(), JsonValue::Array(containers));
            }
        }

        Ok(JsonValue::Object(values))
    }
}

/// Replace a container's `image` string with `{repository, tag, digest}`;
/// a container without one gets an empty `image` map to fill in
fn split_image(mut container: JsonValue) -> JsonValue {
    if let Some(fields) = container.as_object_mut() {
        let image = match fields.get("image") {
            Some(JsonValue::String(image)) => image_parts(image),
            Some(other) => other.clone(),
            None => JsonValue::Object(Map::new()),
        };
        fields.insert("image".to_string(), image);
    }
    container
}

/// `registry:5000/team/app:1.2@sha256:ab` ->
/// `{repository: registry:5000/team/app, tag: "1.2", digest: sha256:ab}`
pub fn image_parts(image: &str) -> JsonValue {
    let (reference, digest) = match image.split_once('@') {
        Some((reference, digest)) => (reference, Some(digest)),
        None => (image, None),
    };

    // a ':' before the last '/' belongs to the registry port
    let name_start = reference.rfind('/').map(|i| i + 1).unwrap_or(0);
    let (repository, tag) = match reference[name_start..].rfind(':') {
        Some(i) => (&reference[..name_start + i], Some(&reference[name_start + i + 1..])),
        None => (reference, None),
    };

    let mut parts = Map::new();
    parts.insert("repository".to_string(), json!(repository));
    match (tag, digest) {
        (Some(tag), _) => {
            parts.insert("tag".to_string(), json!(tag));
        }
        (None, None) => {
            parts.insert("tag".to_string(), json!("latest"));
        }
        (None, Some(_)) => {}
    }
    if let Some(digest) = digest {
        parts.insert("digest".to_string(), json!(digest));
    }
    JsonValue::Object(parts)
}

/// ConfigMaps and Secrets referenced from the pod spec values.
///
/// References inherit the workload's namespace.
fn scan_dependencies(object: &K8sObject, values: &JsonValue) -> BTreeSet<ResourceRef> {
    let namespace = object.namespace().unwrap_or_default();
    let mut deps = BTreeSet::new();
    let mut add = |kind: &str, name: Option<&JsonValue>| {
        if let Some(name) = name.and_then(JsonValue::as_str).filter(|n| !n.is_empty()) {
            deps.insert(ResourceRef::core(kind, namespace, name));
        }
    };

    let containers = ["initContainers", "containers"]
        .iter()
        .filter_map(|key| values.get(*key).and_then(JsonValue::as_array))
        .flatten();
    for container in containers {
        for env in array(container.get("env")) {
            let Some(from) = env.get("valueFrom") else {
                continue;
            };
            add("ConfigMap", from.pointer("/configMapKeyRef/name"));
            add("Secret", from.pointer("/secretKeyRef/name"));
        }
        for source in array(container.get("envFrom")) {
            add("ConfigMap", source.pointer("/configMapRef/name"));
            add("Secret", source.pointer("/secretRef/name"));
        }
    }

    for volume in array(values.get("volumes")) {
        add("ConfigMap", volume.pointer("/configMap/name"));
        add("Secret", volume.pointer("/secret/secretName"));
        for source in array(volume.pointer("/projected/sources")) {
            add("ConfigMap", source.pointer("/configMap/name"));
            add("Secret", source.pointer("/secret/name"));
        }
    }

    for secret in array(values.get("imagePullSecrets")) {
        add("Secret", secret.get("name"));
    }

    deps
}

fn array(value: Option<&JsonValue>) -> &[JsonValue] {
    value
        .and_then(JsonValue::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn typed<K: DeserializeOwned>(object: &K8sObject) -> Result<K> {
    let value = object.to_value()?;
    serde_json::from_value(value)
        .map_err(|e| ProcessError::malformed(object.reference(), e.to_string()))
}

fn required<T>(object: &K8sObject, value: Option<T>, what: &str) -> Result<T> {
    value.ok_or_else(|| ProcessError::malformed(object.reference(), format!("missing {}", what)))
}

fn to_json<T: Serialize>(object: &K8sObject, value: &T) -> Result<JsonValue> {
    serde_json::to_value(value)
        .map_err(|e| ProcessError::malformed(object.reference(), e.to_string()))
}

fn to_map<T: Serialize>(object: &K8sObject, value: &T) -> Result<Map<String, JsonValue>> {
    match to_json(object, value)? {
        JsonValue::Object(map) => Ok(map),
        _ => Err(ProcessError::malformed(object.reference(), "expected an object")),
    }
}
