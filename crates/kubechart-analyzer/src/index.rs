//! Lookup index over a processed batch

use kubechart_core::ProcessedResource;
use std::collections::BTreeMap;

type Identity = (String, String, String, String);

/// Resources keyed by `(group, kind, namespace, name)`.
///
/// Version is left out so references that only name a kind (`roleRef`,
/// `scaleTargetRef`, Ingress backends) resolve against any served version.
pub struct ResourceIndex<'a> {
    resources: &'a [ProcessedResource],
    by_identity: BTreeMap<Identity, usize>,
}

impl<'a> ResourceIndex<'a> {
    pub fn new(resources: &'a [ProcessedResource]) -> Self {
        let mut by_identity = BTreeMap::new();
        for (i, resource) in resources.iter().enumerate() {
            let (group, kind, namespace, name) = resource.reference.identity();
            by_identity
                .entry((
                    group.to_string(),
                    kind.to_string(),
                    namespace.to_string(),
                    name.to_string(),
                ))
                .or_insert(i);
        }
        Self {
            resources,
            by_identity,
        }
    }

    pub fn resources(&self) -> &'a [ProcessedResource] {
        self.resources
    }

    pub fn find(
        &self,
        group: &str,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Option<&'a ProcessedResource> {
        let key = (
            group.to_string(),
            kind.to_string(),
            namespace.to_string(),
            name.to_string(),
        );
        self.by_identity.get(&key).map(|&i| &self.resources[i])
    }

    /// First resource of `kind` with this namespace and name, any group
    pub fn find_kind(&self, kind: &str, namespace: &str, name: &str) -> Option<&'a ProcessedResource> {
        self.resources.iter().find(|r| {
            r.reference.kind == kind && r.reference.namespace == namespace && r.reference.name == name
        })
    }

    /// Resources of `kind` whose group is one of `groups`
    pub fn of_kind<'b>(
        &'b self,
        groups: &'b [&'b str],
        kind: &'b str,
    ) -> impl Iterator<Item = &'a ProcessedResource> + 'b {
        self.resources
            .iter()
            .filter(move |r| r.reference.kind == kind && groups.contains(&r.reference.group.as_str()))
    }

    pub fn workloads(&self) -> impl Iterator<Item = &'a ProcessedResource> + '_ {
        self.resources.iter().filter(|r| r.is_workload())
    }
}
