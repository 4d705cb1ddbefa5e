//! One independent chart per service

use kubechart_core::{GeneratedChart, GenerateOptions, OutputMode, ResourceGraph};
use std::path::PathBuf;
use tracing::debug;

use crate::error::Result;
use crate::layout::{self, ValuesRoot};
use crate::registry::ChartGenerator;
use crate::render;

/// Each group becomes a chart named after it, with flattened values
pub struct SeparateGenerator;

impl ChartGenerator for SeparateGenerator {
    fn mode(&self) -> OutputMode {
        OutputMode::Separate
    }

    fn generate(&self, graph: &ResourceGraph, options: &GenerateOptions) -> Result<Vec<GeneratedChart>> {
        layout::category_bodies(graph)?;

        let mut charts = Vec::with_capacity(graph.groups.len());
        for group in &graph.groups {
            let placed = layout::place_group(group, false)?;
            debug!(group = %group.name, resources = placed.len(), "separate chart");
            charts.push(render::application_chart(
                &group.name,
                PathBuf::from(&group.name),
                format!("Helm chart for the {} service of {}", group.name, options.chart_name),
                &placed,
                ValuesRoot::Flat,
                options,
            ));
        }
        Ok(charts)
    }
}
