//! Scaffold post-processing
//!
//! Prepares generated charts for migration onto an external library chart:
//! declares the dependency, marks every template, and ships a values
//! schema inferred from the generated defaults.

use kubechart_core::{ChartDependency, GeneratedChart, ScaffoldOptions};
use serde_json::{Map, Value as JsonValue, json};

use crate::error::Result;

pub const SCAFFOLD_FILE: &str = "SCAFFOLD.md";
pub const SCHEMA_FILE: &str = "values.schema.json";

/// Apply scaffolding to one chart in place
pub fn apply(chart: &mut GeneratedChart, options: &ScaffoldOptions) -> Result<()> {
    chart.metadata.dependencies.push(
        ChartDependency::new(&options.library_name, &options.library_version)
            .with_repository(&options.library_repository),
    );

    let marker = format!(
        "{{{{/* Scaffolded for library chart \"{}\" ({}) */}}}}\n",
        options.library_name, options.library_repository
    );
    for content in chart.templates.values_mut() {
        content.insert_str(0, &marker);
    }

    let schema = values_schema(chart.values.inner());
    chart.external_files.insert(
        SCHEMA_FILE.to_string(),
        format!("{}\n", serde_json::to_string_pretty(&schema)?),
    );
    chart
        .external_files
        .insert(SCAFFOLD_FILE.to_string(), readme(chart, options));
    Ok(())
}

/// Draft-07 schema describing the shape of `values`
pub fn values_schema(values: &JsonValue) -> JsonValue {
    let mut schema = Map::new();
    schema.insert(
        "$schema".into(),
        JsonValue::String("http://json-schema.org/draft-07/schema#".into()),
    );
    if let JsonValue::Object(inferred) = infer(values) {
        schema.extend(inferred);
    }
    JsonValue::Object(schema)
}

fn infer(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let properties: Map<String, JsonValue> =
                map.iter().map(|(k, v)| (k.clone(), infer(v))).collect();
            json!({ "type": "object", "properties": properties })
        }
        JsonValue::Array(items) => {
            let mut schema = Map::new();
            schema.insert("type".into(), json!("array"));
            // items only when every element has the same shape
            let mut shapes = items.iter().map(infer);
            if let Some(first) = shapes.next()
                && shapes.all(|s| s == first)
            {
                schema.insert("items".into(), first);
            }
            JsonValue::Object(schema)
        }
        JsonValue::String(_) => json!({ "type": "string" }),
        JsonValue::Bool(_) => json!({ "type": "boolean" }),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => json!({ "type": "integer" }),
        JsonValue::Number(_) => json!({ "type": "number" }),
        JsonValue::Null => json!({}),
    }
}

fn readme(chart: &GeneratedChart, options: &ScaffoldOptions) -> String {
    let mut out = format!(
        "# {}\n\n\
         This chart was scaffolded for the library chart `{}` ({}, version `{}`).\n\n\
         Every template still renders on its own. Move shared definitions into the\n\
         library one template at a time and replace the body with an `include`.\n\n\
         ## Templates\n\n",
        chart.name, options.library_name, options.library_repository, options.library_version
    );
    if chart.templates.is_empty() {
        out.push_str("None.\n");
    }
    for path in chart.templates.keys() {
        out.push_str(&format!("- `templates/{}`\n", path));
    }
    out.push_str(&format!(
        "\n`{}` describes the generated defaults; tighten it as the chart evolves.\n",
        SCHEMA_FILE
    ));
    out
}
