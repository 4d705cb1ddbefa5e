//! Placement of resources inside a chart
//!
//! Decides each resource's template file name and values path, resolving
//! collisions, and checks the graph is consistent enough to render.

use kubechart_core::{
    ProcessedResource, ResourceGraph, ResourceGroup, ResourceTemplate, SharedBlock, ValuesPath,
};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{GenerateError, Result};

/// A resource with its final file name and values location
#[derive(Debug, Clone)]
pub struct Placed<'a> {
    pub resource: &'a ProcessedResource,
    pub group: &'a str,
    /// File name under `templates/`
    pub file: String,
    /// Path relative to the group's values root
    pub values_path: ValuesPath,
}

impl Placed<'_> {
    pub fn category(&self) -> &str {
        self.resource.category()
    }
}

/// Where a group's values live inside the chart's values tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuesRoot {
    /// `services.<group>.<path>`
    Services,
    /// `<group>.<path>`, the umbrella parent's view of a subchart
    Group,
    /// `<path>` at the top level
    Flat,
}

impl ValuesRoot {
    pub fn full_path(&self, group: &str, path: &ValuesPath) -> ValuesPath {
        match self {
            ValuesRoot::Services => path.prefixed(&["services", group]),
            ValuesRoot::Group => path.prefixed(&[group]),
            ValuesRoot::Flat => path.clone(),
        }
    }
}

/// Place every resource of `group`.
///
/// `prefix_files` prepends `<group>-` to file names, for charts holding
/// more than one group. Two resources wanting the same file or values path
/// are told apart by resource name, then by namespace, then by a `-2`,
/// `-3`, ... counter, so both are unique within the group.
pub fn place_group<'a>(group: &'a ResourceGroup, prefix_files: bool) -> Result<Vec<Placed<'a>>> {
    if group.is_empty() {
        return Err(GenerateError::inconsistent(format!(
            "group '{}' has no resources",
            group.name
        )));
    }

    let files = disambiguate(
        &group.resources,
        |r| r.template_path.clone(),
        |base: &String, suffix: &str| {
            let (stem, ext) = base.rsplit_once('.').unwrap_or((base.as_str(), "yaml"));
            format!("{}-{}.{}", stem, suffix, ext)
        },
    );
    let paths = disambiguate(
        &group.resources,
        |r| r.values_path.clone(),
        |base: &ValuesPath, suffix: &str| base.with_suffix(suffix),
    );

    Ok(group
        .resources
        .iter()
        .zip(files.into_iter().zip(paths))
        .map(|(resource, (file, values_path))| Placed {
            resource,
            group: &group.name,
            file: if prefix_files {
                format!("{}-{}", group.name, file)
            } else {
                file
            },
            values_path,
        })
        .collect())
}

/// Keys that collide get the resource name appended; if that still
/// collides, the namespace too, and finally a counter
fn disambiguate<K, F, S>(resources: &[ProcessedResource], key: F, suffixed: S) -> Vec<K>
where
    K: Ord + Clone,
    F: Fn(&ProcessedResource) -> K,
    S: Fn(&K, &str) -> K,
{
    let base: Vec<K> = resources.iter().map(&key).collect();
    let mut counts: BTreeMap<&K, usize> = BTreeMap::new();
    for k in &base {
        *counts.entry(k).or_default() += 1;
    }

    let named: Vec<K> = base
        .iter()
        .zip(resources)
        .map(|(k, r)| {
            if counts[k] > 1 {
                suffixed(k, &file_safe(r.name()))
            } else {
                k.clone()
            }
        })
        .collect();

    let mut counts: BTreeMap<&K, usize> = BTreeMap::new();
    for k in &named {
        *counts.entry(k).or_default() += 1;
    }
    let namespaced: Vec<K> = named
        .iter()
        .zip(resources)
        .map(|(k, r)| {
            if counts[k] > 1 && !r.namespace().is_empty() {
                suffixed(k, &file_safe(r.namespace()))
            } else {
                k.clone()
            }
        })
        .collect();

    // same name and namespace, different kinds: number the later ones
    let mut taken: BTreeSet<K> = namespaced.iter().cloned().collect();
    let mut assigned: BTreeSet<K> = BTreeSet::new();
    namespaced
        .into_iter()
        .map(|k| {
            if assigned.insert(k.clone()) {
                return k;
            }
            let mut n = 2;
            loop {
                let candidate = suffixed(&k, &n.to_string());
                if taken.insert(candidate.clone()) {
                    assigned.insert(candidate.clone());
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

/// Lowercase `[a-z0-9-]` form of a resource name for file names
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() { c } else { '-' }
        })
        .collect()
}

/// Check that every category has exactly one body across the graph and
/// return the bodies keyed by category
pub fn category_bodies(graph: &ResourceGraph) -> Result<BTreeMap<String, ResourceTemplate>> {
    let mut bodies: BTreeMap<String, ResourceTemplate> = BTreeMap::new();
    for resource in graph.resources() {
        match bodies.get(resource.category()) {
            Some(existing) if existing != &resource.template => {
                return Err(GenerateError::inconsistent(format!(
                    "resources of category '{}' have different template bodies ({})",
                    resource.category(),
                    resource.reference
                )));
            }
            Some(_) => {}
            None => {
                bodies.insert(resource.category().to_string(), resource.template.clone());
            }
        }
    }
    Ok(bodies)
}

/// Shared blocks needed by a set of placed resources
pub fn blocks_for<'a, 'b: 'a>(placed: impl IntoIterator<Item = &'a Placed<'b>>) -> BTreeSet<SharedBlock> {
    placed
        .into_iter()
        .flat_map(|p| p.resource.template.blocks())
        .collect()
}

/// Add `file` to `templates`, appending `-2`, `-3`, ... on a clash
pub fn insert_unique(templates: &mut BTreeMap<String, String>, file: String, content: String) -> String {
    if !templates.contains_key(&file) {
        templates.insert(file.clone(), content);
        return file;
    }
    let (stem, ext) = file.rsplit_once('.').unwrap_or((file.as_str(), "yaml"));
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}.{}", stem, n, ext);
        if !templates.contains_key(&candidate) {
            templates.insert(candidate.clone(), content);
            return candidate;
        }
        n += 1;
    }
}
