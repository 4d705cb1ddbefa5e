//! Shared library chart plus thin wrapper charts
//!
//! The library chart `<name>-library` defines `library.<category>` once for
//! every category in the graph, along with the shared blocks those bodies
//! include. Each group gets a wrapper chart whose templates are nothing but
//! `include` calls into the library, passing the wrapper's own values.

use kubechart_core::{
    ChartDependency, ChartMetadata, ChartType, GeneratedChart, GenerateOptions, OutputMode,
    ResourceGraph, ResourceTemplate, SharedBlock,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::error::Result;
use crate::helpers;
use crate::layout::{self, ValuesRoot};
use crate::registry::ChartGenerator;
use crate::render::{self, LIBRARY_PREFIX};

pub struct LibraryGenerator;

impl ChartGenerator for LibraryGenerator {
    fn mode(&self) -> OutputMode {
        OutputMode::Library
    }

    fn generate(&self, graph: &ResourceGraph, options: &GenerateOptions) -> Result<Vec<GeneratedChart>> {
        let bodies = layout::category_bodies(graph)?;
        let library_name = format!("{}-library", options.chart_name);

        let mut charts = vec![library_chart(&library_name, &bodies, options)];
        for group in &graph.groups {
            let placed = layout::place_group(group, false)?;

            let mut templates = BTreeMap::new();
            for p in &placed {
                let path = ValuesRoot::Services.full_path(p.group, &p.values_path);
                layout::insert_unique(
                    &mut templates,
                    p.file.clone(),
                    render::library_include(p.category(), &path.index_expr(".Values")),
                );
            }

            let mut values = helpers::global_values(options);
            values.merge(&render::resource_values(&placed, ValuesRoot::Services));

            let mut metadata = helpers::application_metadata(
                &group.name,
                format!(
                    "Helm chart for the {} service of {}, built on {}",
                    group.name, options.chart_name, library_name
                ),
                options,
            );
            metadata.dependencies.push(
                ChartDependency::new(&library_name, &options.chart_version)
                    .with_repository(format!("file://../{}", library_name)),
            );

            charts.push(GeneratedChart {
                name: group.name.clone(),
                location: PathBuf::from(&group.name),
                metadata,
                values,
                helpers: helpers::helpers(&group.name, &BTreeSet::new()),
                notes: Some(helpers::notes(
                    &group.name,
                    &[group.name.as_str()],
                    render::upgrade_key(&placed, ValuesRoot::Services).as_ref(),
                )),
                templates,
                external_files: BTreeMap::new(),
            });
        }
        Ok(charts)
    }
}

fn library_chart(
    name: &str,
    bodies: &BTreeMap<String, ResourceTemplate>,
    options: &GenerateOptions,
) -> GeneratedChart {
    let mut templates = BTreeMap::new();
    let mut blocks: BTreeSet<SharedBlock> = BTreeSet::new();
    for (category, body) in bodies {
        templates.insert(format!("_{}.tpl", category), render::library_define(body));
        blocks.extend(body.blocks());
    }
    if !blocks.is_empty() {
        templates.insert(
            "_blocks.tpl".to_string(),
            helpers::block_definitions(LIBRARY_PREFIX, &blocks),
        );
    }

    GeneratedChart {
        name: name.to_string(),
        location: PathBuf::from(name),
        metadata: ChartMetadata::new(
            name,
            format!("Shared resource templates for {}", options.chart_name),
            ChartType::Library,
            options.chart_version.clone(),
            Some(options.app_version.clone()),
        ),
        values: helpers::global_values(options),
        helpers: helpers::helpers(LIBRARY_PREFIX, &BTreeSet::new()),
        notes: None,
        templates,
        external_files: BTreeMap::new(),
    }
}
