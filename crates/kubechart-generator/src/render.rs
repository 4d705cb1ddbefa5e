//! Template text around resource bodies and chart assembly shared by the
//! strategies

use kubechart_core::{GeneratedChart, GenerateOptions, ResourceTemplate, Values, ValuesPath};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::helpers;
use crate::layout::{self, Placed, ValuesRoot};

/// Helper prefix used inside the library chart
pub const LIBRARY_PREFIX: &str = "library";

/// Binds `$root`, `$v`, `$ns` and `$labels` for the body that follows
pub fn preamble(prefix: &str, root: &str, values_expr: &str) -> String {
    format!(
        r#"{{{{- $root := {root} }}}}
{{{{- $v := {values_expr} }}}}
{{{{- $ns := $root.Values.global.namespace | default $root.Release.Namespace }}}}
{{{{- $labels := merge (dict) (default (dict) $v.labels) (include "{prefix}.labels" $root | fromYaml) }}}}
"#
    )
}

/// Template file with the body inlined, reading values at `root`
pub fn inline_template(placed: &Placed<'_>, prefix: &str, root: ValuesRoot) -> String {
    let path = root.full_path(placed.group, &placed.values_path);
    let mut out = preamble(prefix, ".", &path.index_expr(".Values"));
    out.push_str(&placed.resource.template.render(prefix));
    out
}

/// `library.<category>` definition, taking `(dict "root" $ "values" ...)`
pub fn library_define(template: &ResourceTemplate) -> String {
    let mut out = format!(
        "{{{{- define \"{}.{}\" -}}}}\n",
        LIBRARY_PREFIX,
        template.category()
    );
    out.push_str(&preamble(LIBRARY_PREFIX, ".root", ".values"));
    out.push_str(&template.render(LIBRARY_PREFIX));
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("{{- end }}\n");
    out
}

/// Wrapper template delegating to the library definition
pub fn library_include(category: &str, values_expr: &str) -> String {
    format!(
        "{{{{- include \"{}.{}\" (dict \"root\" $ \"values\" {}) }}}}\n",
        LIBRARY_PREFIX, category, values_expr
    )
}

/// Render `content` only while the chart's `enabled` value is true
pub fn guarded(content: &str) -> String {
    let mut out = String::from("{{- if .Values.enabled }}\n");
    out.push_str(content);
    if !content.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("{{- end }}\n");
    out
}

/// Values of the placed resources, laid out under `root`
pub fn resource_values(placed: &[Placed<'_>], root: ValuesRoot) -> Values {
    let mut values = Values::new();
    for p in placed {
        values.set(
            &root.full_path(p.group, &p.values_path),
            p.resource.values.clone(),
        );
    }
    values
}

/// Replica count of the first scalable workload, for the NOTES example
pub fn upgrade_key(placed: &[Placed<'_>], root: ValuesRoot) -> Option<ValuesPath> {
    placed
        .iter()
        .find(|p| p.resource.is_workload() && p.resource.values.get("replicas").is_some())
        .map(|p| {
            let path = root.full_path(p.group, &p.values_path);
            ValuesPath::from_segments(
                path.segments()
                    .iter()
                    .map(String::as_str)
                    .chain(["replicas"]),
            )
        })
}

/// Group names of `placed`, first-seen order
pub fn services<'a>(placed: &[Placed<'a>]) -> Vec<&'a str> {
    let mut names: Vec<&str> = Vec::new();
    for p in placed {
        if !names.contains(&p.group) {
            names.push(p.group);
        }
    }
    names
}

/// Application chart with every placed resource inlined.
///
/// The chart name doubles as the helper prefix.
pub fn application_chart(
    name: &str,
    location: PathBuf,
    description: String,
    placed: &[Placed<'_>],
    root: ValuesRoot,
    options: &GenerateOptions,
) -> GeneratedChart {
    let mut templates = BTreeMap::new();
    for p in placed {
        layout::insert_unique(&mut templates, p.file.clone(), inline_template(p, name, root));
    }

    let mut values = helpers::global_values(options);
    values.merge(&resource_values(placed, root));

    GeneratedChart {
        name: name.to_string(),
        location,
        metadata: helpers::application_metadata(name, description, options),
        values,
        helpers: helpers::helpers(name, &layout::blocks_for(placed)),
        notes: Some(helpers::notes(
            name,
            &services(placed),
            upgrade_key(placed, root).as_ref(),
        )),
        templates,
        external_files: BTreeMap::new(),
    }
}
