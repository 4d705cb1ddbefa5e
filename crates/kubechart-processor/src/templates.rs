//! Template bodies per category
//!
//! Every body reads its data from `$v`, so the text only depends on the
//! category. See `kubechart_core::template` for the available bindings.

use kubechart_core::{ResourceTemplate, SharedBlock};

const POD_SPEC_ARG: &str = r#"(dict "v" $v "root" $root)"#;

/// `metadata:` section shared by every body
pub fn metadata(namespaced: bool) -> String {
    let namespace = if namespaced {
        "  namespace: {{ $ns }}\n"
    } else {
        ""
    };
    format!(
        r#"metadata:
  name: {{{{ $v.name }}}}
{namespace}  labels:
    {{{{- toYaml $labels | nindent 4 }}}}
  {{{{- with $v.annotations }}}}
  annotations:
    {{{{- toYaml . | nindent 4 }}}}
  {{{{- end }}}}
"#
    )
}

/// Optional field copied from `$v.<key>` at the given indentation.
///
/// Works for scalars and structures alike: `key:` is followed by the
/// YAML of the value on the next, deeper line.
pub fn optional_field(key: &str, indent: usize) -> String {
    let pad = " ".repeat(indent);
    format!(
        "{pad}{{{{- if hasKey $v \"{key}\" }}}}\n{pad}{key}: {{{{- toYaml $v.{key} | nindent {inner} }}}}\n{pad}{{{{- end }}}}\n",
        inner = indent + 2
    )
}

fn pod_template_metadata(indent: usize) -> String {
    let pad = " ".repeat(indent);
    format!(
        r#"{pad}metadata:
{pad}  labels:
{pad}    {{{{- toYaml $v.podLabels | nindent {labels} }}}}
{pad}  {{{{- with $v.podAnnotations }}}}
{pad}  annotations:
{pad}    {{{{- toYaml . | nindent {labels} }}}}
{pad}  {{{{- end }}}}
{pad}spec:
"#,
        labels = indent + 4
    )
}

fn selector(indent: usize, optional: bool) -> String {
    let pad = " ".repeat(indent);
    let body = format!(
        r#"{pad}selector:
{pad}  matchLabels:
{pad}    {{{{- toYaml $v.selectorLabels | nindent {inner} }}}}
{pad}  {{{{- with $v.selectorExpressions }}}}
{pad}  matchExpressions:
{pad}    {{{{- toYaml . | nindent {inner} }}}}
{pad}  {{{{- end }}}}
"#,
        inner = indent + 4
    );
    if optional {
        format!("{pad}{{{{- if $v.selectorLabels }}}}\n{body}{pad}{{{{- end }}}}\n")
    } else {
        body
    }
}

/// Body for a pod-owning controller.
///
/// `settings` are the spec keys copied verbatim; for CronJob the job
/// settings are nested one level down under `$v.job`.
pub fn workload(
    category: &str,
    api_version: &str,
    kind: &str,
    settings: &[&str],
    optional_selector: bool,
) -> ResourceTemplate {
    let mut head = format!("apiVersion: {api_version}\nkind: {kind}\n");
    head.push_str(&metadata(true));
    head.push_str("spec:\n");
    for key in settings {
        head.push_str(&optional_field(key, 2));
    }

    if kind == "CronJob" {
        head.push_str(
            r#"  jobTemplate:
    spec:
      {{- with $v.job }}
      {{- toYaml . | nindent 6 }}
      {{- end }}
      template:
"#,
        );
        head.push_str(&pod_template_metadata(8));
        return ResourceTemplate::new(category)
            .text(head)
            .block(SharedBlock::PodSpec, POD_SPEC_ARG, 10);
    }

    head.push_str(&selector(2, optional_selector));
    head.push_str("  template:\n");
    head.push_str(&pod_template_metadata(4));
    ResourceTemplate::new(category)
        .text(head)
        .block(SharedBlock::PodSpec, POD_SPEC_ARG, 6)
}

/// Body for a kind whose content fields are copied verbatim
pub fn content(
    category: &str,
    api_version: &str,
    kind: &str,
    fields: &[&str],
    namespaced: bool,
) -> ResourceTemplate {
    let mut text = format!("apiVersion: {api_version}\nkind: {kind}\n");
    text.push_str(&metadata(namespaced));
    for field in fields {
        text.push_str(&optional_field(field, 0));
    }
    ResourceTemplate::new(category).text(text)
}

/// Body for unmodelled kinds, guarded by `$v.enabled`
pub fn generic(category: &str, namespaced: bool) -> ResourceTemplate {
    let mut text = String::from(
        "{{- if $v.enabled }}\napiVersion: {{ $v.apiVersion }}\nkind: {{ $v.kind }}\n",
    );
    text.push_str(&metadata(namespaced));
    text.push_str(
        r#"{{- with $v.spec }}
spec:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with $v.extraFields }}
{{ toYaml . }}
{{- end }}
{{- end }}
"#,
    );
    ResourceTemplate::new(category).text(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_namespace_line() {
        assert!(metadata(true).contains("  namespace: {{ $ns }}\n"));
        assert!(!metadata(false).contains("namespace"));
        assert!(metadata(false).contains("  name: {{ $v.name }}\n"));
    }

    #[test]
    fn test_optional_field() {
        assert_eq!(
            optional_field("replicas", 2),
            "  {{- if hasKey $v \"replicas\" }}\n  replicas: {{- toYaml $v.replicas | nindent 4 }}\n  {{- end }}\n"
        );
    }

    #[test]
    fn test_workload_body() {
        let body = workload("deployment", "apps/v1", "Deployment", &["replicas"], false)
            .render("web");
        assert!(body.starts_with("apiVersion: apps/v1\nkind: Deployment\n"));
        assert!(body.contains("    matchLabels:\n"));
        assert!(body.contains("toYaml $v.podLabels | nindent 8"));
        assert!(body.contains(r#"include "web.podSpec""#));
        assert!(body.ends_with("| trim | nindent 6 }}\n"));
    }

    #[test]
    fn test_cronjob_body_nests_pod_spec() {
        let body = workload("cronJob", "batch/v1", "CronJob", &["schedule"], true).render("x");
        assert!(body.contains("  jobTemplate:\n    spec:\n"));
        assert!(body.contains("toYaml $v.podLabels | nindent 12"));
        assert!(body.contains("| trim | nindent 10 }}"));
        assert!(!body.contains("selectorLabels"));
    }

    #[test]
    fn test_generic_body_is_guarded() {
        let body = generic("certificate", true).render("x");
        assert!(body.starts_with("{{- if $v.enabled }}\n"));
        assert!(body.trim_end().ends_with("{{- end }}"));
    }
}
