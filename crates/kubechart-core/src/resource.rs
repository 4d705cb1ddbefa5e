//! Chart-ready form of a single resource

use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::object::K8sObject;
use crate::reference::ResourceRef;
use crate::template::ResourceTemplate;
use crate::values::ValuesPath;

/// Output of the processor for one input object.
///
/// Immutable once built; the original object is shared, not copied.
#[derive(Debug, Clone)]
pub struct ProcessedResource {
    pub object: Arc<K8sObject>,
    pub reference: ResourceRef,
    /// Grouping key, never empty
    pub service_name: String,
    /// Template file name (`deployment.yaml`, `configmap-shared.yaml`, ...)
    pub template_path: String,
    /// Where `values` lands under the owning group
    pub values_path: ValuesPath,
    pub values: JsonValue,
    pub template: ResourceTemplate,
    /// Resources this one references by name (ConfigMaps, Secrets, ...)
    pub dependencies: BTreeSet<ResourceRef>,
}

impl ProcessedResource {
    pub fn kind(&self) -> &str {
        &self.reference.kind
    }

    pub fn name(&self) -> &str {
        &self.reference.name
    }

    pub fn namespace(&self) -> &str {
        &self.reference.namespace
    }

    pub fn category(&self) -> &str {
        self.template.category()
    }

    /// Pod-template labels of a workload, if this resource has a pod template
    pub fn pod_labels(&self) -> Option<&serde_json::Map<String, JsonValue>> {
        let template = match self.kind() {
            "CronJob" => self
                .object
                .field(&["spec", "jobTemplate", "spec", "template"]),
            _ => self.object.field(&["spec", "template"]),
        }?;
        template.get("metadata")?.get("labels")?.as_object()
    }

    /// Whether this resource runs pods
    pub fn is_workload(&self) -> bool {
        matches!(
            (self.reference.group.as_str(), self.kind()),
            ("apps", "Deployment")
                | ("apps", "StatefulSet")
                | ("apps", "DaemonSet")
                | ("batch", "Job")
                | ("batch", "CronJob")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn processed(yaml: &str) -> ProcessedResource {
        let object = K8sObject::from_yaml(yaml).unwrap();
        let reference = object.reference();
        ProcessedResource {
            object: Arc::new(object),
            reference,
            service_name: "web".to_string(),
            template_path: "x.yaml".to_string(),
            values_path: ValuesPath::new("x"),
            values: json!({}),
            template: ResourceTemplate::new("x"),
            dependencies: BTreeSet::new(),
        }
    }

    #[test]
    fn test_pod_labels_deployment() {
        let res = processed(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata: {name: web}
spec:
  template:
    metadata:
      labels: {app: web, tier: frontend}
"#,
        );
        assert!(res.is_workload());
        let labels = res.pod_labels().unwrap();
        assert_eq!(labels["app"], "web");
        assert_eq!(labels["tier"], "frontend");
    }

    #[test]
    fn test_pod_labels_cronjob() {
        let res = processed(
            r#"
apiVersion: batch/v1
kind: CronJob
metadata: {name: backup}
spec:
  jobTemplate:
    spec:
      template:
        metadata:
          labels: {app: backup}
"#,
        );
        assert_eq!(res.pod_labels().unwrap()["app"], "backup");
    }

    #[test]
    fn test_service_has_no_pod_labels() {
        let res = processed("apiVersion: v1\nkind: Service\nmetadata: {name: web}\nspec: {}\n");
        assert!(!res.is_workload());
        assert!(res.pod_labels().is_none());
    }
}
