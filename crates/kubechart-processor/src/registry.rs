//! GVK-keyed rule table
//!
//! The registry is built once and only read afterwards; it is `Send + Sync`
//! and can be shared by reference between concurrent pipeline runs.

use kubechart_core::{
    GroupVersionKind, HELPER_NAMES, K8sObject, ProcessedResource, ResourceRef, ResourceTemplate,
    SharedBlock, ValuesPath,
};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::auxiliary::{AUXILIARY_KINDS, AuxiliaryRule, DASHBOARD, DASHBOARD_LABEL};
use crate::error::Result;
use crate::generic::GenericRule;
use crate::naming::service_name;
use crate::workload::{WorkloadKind, WorkloadRule};

/// What a rule produces for one object; the registry adds identity and
/// service name
#[derive(Debug, Clone)]
pub struct RuleOutput {
    pub template_path: String,
    pub values_path: ValuesPath,
    pub values: JsonValue,
    pub template: ResourceTemplate,
    pub dependencies: BTreeSet<ResourceRef>,
}

/// Turns one recognised object into its chart-ready form
pub trait ResourceRule: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn apply(&self, object: &K8sObject) -> Result<RuleOutput>;
}

type GvkKey = (String, String, String);

fn key(group: &str, version: &str, kind: &str) -> GvkKey {
    (group.to_string(), version.to_string(), kind.to_string())
}

/// Objects that never become chart content: cluster bookkeeping and
/// controller-generated children
const SKIPPED: &[(&str, &str, &str)] = &[
    ("", "v1", "Namespace"),
    ("", "v1", "Event"),
    ("events.k8s.io", "v1", "Event"),
    ("", "v1", "Endpoints"),
    ("discovery.k8s.io", "v1", "EndpointSlice"),
    ("apps", "v1", "ControllerRevision"),
];

/// Label that moves an object to a different rule than its GVK would pick
struct LabelOverride {
    gvk: GvkKey,
    label: &'static str,
    rule: Box<dyn ResourceRule>,
}

pub struct ProcessorRegistry {
    rules: BTreeMap<GvkKey, Box<dyn ResourceRule>>,
    overrides: Vec<LabelOverride>,
    skipped: BTreeSet<GvkKey>,
    fallback: GenericRule,
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessorRegistry {
    /// Registry with every built-in rule
    pub fn new() -> Self {
        let mut rules: BTreeMap<GvkKey, Box<dyn ResourceRule>> = BTreeMap::new();
        let mut categories = BTreeSet::new();

        for kind in WorkloadKind::ALL {
            categories.insert(kind.category().to_string());
            rules.insert(
                key(kind.group(), "v1", kind.kind()),
                Box::new(WorkloadRule::new(kind)),
            );
        }
        for spec in AUXILIARY_KINDS {
            categories.insert(spec.category.to_string());
            rules.insert(
                key(spec.group, spec.version, spec.kind),
                Box::new(AuxiliaryRule::new(*spec)),
            );
        }
        categories.insert(DASHBOARD.category.to_string());
        // categories share the `define` namespace and `_<name>.tpl` files with these
        categories.extend(SharedBlock::ALL.iter().map(|b| b.name().to_string()));
        categories.extend(HELPER_NAMES.iter().map(|n| n.to_string()));
        categories.extend(["blocks".to_string(), "helpers".to_string()]);

        let overrides = vec![LabelOverride {
            gvk: key(DASHBOARD.group, DASHBOARD.version, DASHBOARD.kind),
            label: DASHBOARD_LABEL,
            rule: Box::new(AuxiliaryRule::new(DASHBOARD)),
        }];

        let skipped = SKIPPED.iter().map(|(g, v, k)| key(g, v, k)).collect();

        Self {
            rules,
            overrides,
            skipped,
            fallback: GenericRule::new(categories),
        }
    }

    /// Rule that handles `object`, after label overrides
    pub fn rule_for(&self, object: &K8sObject) -> &dyn ResourceRule {
        let gvk = gvk_key(object.gvk());
        if let Some(o) = self
            .overrides
            .iter()
            .find(|o| o.gvk == gvk && object.label(o.label).is_some())
        {
            return o.rule.as_ref();
        }
        match self.rules.get(&gvk) {
            Some(rule) => rule.as_ref(),
            None => &self.fallback,
        }
    }

    /// Whether the object is dropped without processing
    pub fn is_skipped(&self, object: &K8sObject) -> bool {
        self.skipped.contains(&gvk_key(object.gvk())) || object.is_controller_owned()
    }

    /// Process one object; `Ok(None)` when it is intentionally skipped
    pub fn process(&self, object: &K8sObject) -> Result<Option<ProcessedResource>> {
        self.process_shared(Arc::new(object.clone()))
    }

    /// Like [`process`](Self::process) for an already shared object
    pub fn process_shared(&self, object: Arc<K8sObject>) -> Result<Option<ProcessedResource>> {
        let reference = object.reference();
        if self.is_skipped(&object) {
            debug!(resource = %reference, "skipped");
            return Ok(None);
        }

        let rule = self.rule_for(&object);
        let output = rule.apply(&object)?;
        let service_name = service_name(&object);
        debug!(
            resource = %reference,
            rule = rule.name(),
            service = %service_name,
            "processed"
        );

        Ok(Some(ProcessedResource {
            object,
            reference,
            service_name,
            template_path: output.template_path,
            values_path: output.values_path,
            values: output.values,
            template: output.template,
            dependencies: output.dependencies,
        }))
    }

    /// Process a batch in input order, stopping at the first error
    pub fn process_all(&self, objects: &[K8sObject]) -> Result<Vec<ProcessedResource>> {
        let mut processed = Vec::with_capacity(objects.len());
        for object in objects {
            if let Some(resource) = self.process(object)? {
                processed.push(resource);
            }
        }
        info!(
            input = objects.len(),
            processed = processed.len(),
            skipped = objects.len() - processed.len(),
            "processing complete"
        );
        Ok(processed)
    }

    /// GVKs with a dedicated rule, as `group/version/Kind`
    pub fn known_kinds(&self) -> Vec<String> {
        self.rules
            .keys()
            .map(|(g, v, k)| {
                if g.is_empty() {
                    format!("{}/{}", v, k)
                } else {
                    format!("{}/{}/{}", g, v, k)
                }
            })
            .collect()
    }
}

fn gvk_key(gvk: &GroupVersionKind) -> GvkKey {
    key(&gvk.group, &gvk.version, &gvk.kind)
}
