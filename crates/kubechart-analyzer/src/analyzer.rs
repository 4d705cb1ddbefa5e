//! Grouping and graph construction

use indexmap::IndexMap;
use kubechart_core::{ProcessedResource, ResourceGraph, ResourceGroup};
use std::collections::BTreeSet;
use tracing::info;

use crate::detectors::DetectorRegistry;
use crate::error::{AnalysisError, Result};
use crate::index::ResourceIndex;

/// Analyze a batch with the built-in detectors
pub fn analyze(resources: &[ProcessedResource]) -> Result<ResourceGraph> {
    Analyzer::new().analyze(resources)
}

/// Holds a detector registry and turns batches into graphs
#[derive(Default)]
pub struct Analyzer {
    detectors: DetectorRegistry,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            detectors: DetectorRegistry::new(),
        }
    }

    pub fn with_detectors(detectors: DetectorRegistry) -> Self {
        Self { detectors }
    }

    pub fn detectors(&self) -> &DetectorRegistry {
        &self.detectors
    }

    pub fn analyze(&self, resources: &[ProcessedResource]) -> Result<ResourceGraph> {
        let mut seen = BTreeSet::new();
        for resource in resources {
            if !seen.insert(&resource.reference) {
                return Err(AnalysisError::Duplicate {
                    resource: resource.reference.clone(),
                });
            }
        }

        let groups = group_by_service(resources);
        let index = ResourceIndex::new(resources);
        let relationships = self.detectors.run(&index)?;

        info!(
            resources = resources.len(),
            groups = groups.len(),
            relationships = relationships.len(),
            "analysis complete"
        );
        Ok(ResourceGraph::new(groups, relationships))
    }
}

/// Partition by service name, groups in first-seen order
pub fn group_by_service(resources: &[ProcessedResource]) -> Vec<ResourceGroup> {
    let mut groups: IndexMap<&str, ResourceGroup> = IndexMap::new();
    for resource in resources {
        groups
            .entry(resource.service_name.as_str())
            .or_insert_with(|| ResourceGroup::new(resource.service_name.clone()))
            .resources
            .push(resource.clone());
    }
    groups.into_values().collect()
}
