//! Parent chart with one toggleable subchart per service

use kubechart_core::{ChartDependency, GeneratedChart, GenerateOptions, OutputMode, ResourceGraph};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::error::{GenerateError, Result};
use crate::helpers;
use crate::layout::{self, ValuesRoot};
use crate::registry::ChartGenerator;
use crate::render;

/// Subcharts live under `<chart>/charts/<group>` and render only while
/// `<group>.enabled` is true in the parent
pub struct UmbrellaGenerator;

impl ChartGenerator for UmbrellaGenerator {
    fn mode(&self) -> OutputMode {
        OutputMode::Umbrella
    }

    fn generate(&self, graph: &ResourceGraph, options: &GenerateOptions) -> Result<Vec<GeneratedChart>> {
        layout::category_bodies(graph)?;

        let parent_name = options.chart_name.as_str();
        let mut parent_values = helpers::global_values(options);
        let mut parent_metadata = helpers::application_metadata(
            parent_name,
            format!(
                "Umbrella chart for {} ({} subcharts)",
                parent_name,
                graph.groups.len()
            ),
            options,
        );

        let mut subcharts = Vec::with_capacity(graph.groups.len());
        let mut all_placed = Vec::new();
        for group in &graph.groups {
            if group.name == helpers::GLOBAL_KEY {
                return Err(GenerateError::inconsistent(format!(
                    "group '{}' would replace the parent's global values",
                    group.name
                )));
            }
            let placed = layout::place_group(group, false)?;

            parent_values.insert(&group.name, json!({ "enabled": true }));
            parent_values.merge(&render::resource_values(&placed, ValuesRoot::Group));
            parent_metadata.dependencies.push(
                ChartDependency::new(&group.name, &options.chart_version)
                    .with_repository(format!("file://charts/{}", group.name))
                    .with_condition(format!("{}.enabled", group.name)),
            );

            let mut chart = render::application_chart(
                &group.name,
                PathBuf::from(parent_name).join("charts").join(&group.name),
                format!("{} service of the {} umbrella chart", group.name, parent_name),
                &placed,
                ValuesRoot::Flat,
                options,
            );
            chart.values.insert("enabled", json!(true));
            for content in chart.templates.values_mut() {
                *content = render::guarded(content);
            }
            subcharts.push(chart);
            all_placed.extend(placed);
        }

        let parent = GeneratedChart {
            name: parent_name.to_string(),
            location: PathBuf::from(parent_name),
            metadata: parent_metadata,
            values: parent_values,
            helpers: helpers::helpers(parent_name, &BTreeSet::new()),
            notes: Some(helpers::notes(
                parent_name,
                &render::services(&all_placed),
                render::upgrade_key(&all_placed, ValuesRoot::Group).as_ref(),
            )),
            templates: BTreeMap::new(),
            external_files: BTreeMap::new(),
        };

        let mut charts = Vec::with_capacity(subcharts.len() + 1);
        charts.push(parent);
        charts.extend(subcharts);
        Ok(charts)
    }
}
