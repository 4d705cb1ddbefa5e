//! One chart holding every service

use kubechart_core::{GeneratedChart, GenerateOptions, OutputMode, ResourceGraph};
use std::path::PathBuf;

use crate::error::Result;
use crate::layout::{self, ValuesRoot};
use crate::registry::ChartGenerator;
use crate::render;

/// Values under `services.<group>`, one template per resource
pub struct UniversalGenerator;

impl ChartGenerator for UniversalGenerator {
    fn mode(&self) -> OutputMode {
        OutputMode::Universal
    }

    fn generate(&self, graph: &ResourceGraph, options: &GenerateOptions) -> Result<Vec<GeneratedChart>> {
        layout::category_bodies(graph)?;

        let multi_group = graph.groups.len() > 1;
        let mut placed = Vec::new();
        for group in &graph.groups {
            placed.extend(layout::place_group(group, multi_group)?);
        }

        let description = format!(
            "Helm chart for {} ({} services)",
            options.chart_name,
            graph.groups.len()
        );
        Ok(vec![render::application_chart(
            &options.chart_name,
            PathBuf::from(&options.chart_name),
            description,
            &placed,
            ValuesRoot::Services,
            options,
        )])
    }
}
