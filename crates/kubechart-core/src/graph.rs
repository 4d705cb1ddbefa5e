//! Service groups and relationship edges

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::reference::ResourceRef;
use crate::resource::ProcessedResource;

/// Resources sharing one service name
#[derive(Debug, Clone)]
pub struct ResourceGroup {
    pub name: String,
    pub resources: Vec<ProcessedResource>,
}

impl ResourceGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
        }
    }

    pub fn contains(&self, reference: &ResourceRef) -> bool {
        self.resources.iter().any(|r| &r.reference == reference)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// How `from` depends on `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
    /// Service or NetworkPolicy selecting a workload's pods
    Selects,
    /// Ingress or route sending traffic to a Service
    RoutesTo,
    /// Autoscaler targeting a workload
    Scales,
    /// PodDisruptionBudget covering a workload
    Protects,
    /// Binding granting a Role or ClusterRole
    BindsRole,
    /// Workload consuming a ConfigMap or Secret
    UsesConfig,
}

impl RelationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Selects => "selects",
            RelationType::RoutesTo => "routes-to",
            RelationType::Scales => "scales",
            RelationType::Protects => "protects",
            RelationType::BindsRole => "binds-role",
            RelationType::UsesConfig => "uses-config",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directed edge: `from` depends on or references `to`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub from: ResourceRef,
    pub to: ResourceRef,
    pub kind: RelationType,
}

impl Relationship {
    pub fn new(from: ResourceRef, to: ResourceRef, kind: RelationType) -> Self {
        Self { from, to, kind }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from.short(), self.kind, self.to.short())
    }
}

/// Result of analysis: groups in first-seen order plus a sorted edge set.
///
/// Built once by the analyzer and read by every chart generator.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    pub groups: Vec<ResourceGroup>,
    pub relationships: BTreeSet<Relationship>,
}

impl ResourceGraph {
    pub fn new(groups: Vec<ResourceGroup>, relationships: BTreeSet<Relationship>) -> Self {
        Self {
            groups,
            relationships,
        }
    }

    pub fn group(&self, name: &str) -> Option<&ResourceGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Group holding the given resource
    pub fn group_of(&self, reference: &ResourceRef) -> Option<&ResourceGroup> {
        self.groups.iter().find(|g| g.contains(reference))
    }

    pub fn relationships_from<'a>(
        &'a self,
        reference: &'a ResourceRef,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships
            .iter()
            .filter(move |r| &r.from == reference)
    }

    pub fn relationships_to<'a>(
        &'a self,
        reference: &'a ResourceRef,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.iter().filter(move |r| &r.to == reference)
    }

    /// Edges whose endpoints live in different groups
    pub fn cross_group_edges(&self) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| {
                let from = self.group_of(&r.from).map(|g| g.name.as_str());
                let to = self.group_of(&r.to).map(|g| g.name.as_str());
                from.is_some() && to.is_some() && from != to
            })
            .collect()
    }

    pub fn resource_count(&self) -> usize {
        self.groups.iter().map(ResourceGroup::len).sum()
    }

    pub fn resources(&self) -> impl Iterator<Item = &ProcessedResource> {
        self.groups.iter().flat_map(|g| g.resources.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
