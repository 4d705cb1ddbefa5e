//! Chart-level boilerplate: `_helpers.tpl`, `NOTES.txt`, Chart.yaml and the
//! `global` values section

use kubechart_core::{ChartMetadata, ChartType, GenerateOptions, SharedBlock, Values, ValuesPath};
use serde_json::json;
use std::collections::BTreeSet;

/// Standard helper definitions under `prefix`, followed by the shared
/// blocks this chart's bodies include
pub fn helpers(prefix: &str, blocks: &BTreeSet<SharedBlock>) -> String {
    let mut out = STANDARD_HELPERS.replace("__PREFIX__", prefix);
    if !blocks.is_empty() {
        out.push('\n');
        out.push_str(&block_definitions(prefix, blocks));
    }
    out
}

/// `define` blocks for every block in `blocks`, separated by blank lines
pub fn block_definitions(prefix: &str, blocks: &BTreeSet<SharedBlock>) -> String {
    blocks
        .iter()
        .map(|b| b.definition(prefix))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Values key Helm shares between a parent chart and its subcharts
pub const GLOBAL_KEY: &str = "global";

/// `values.yaml` skeleton every chart starts from
pub fn global_values(options: &GenerateOptions) -> Values {
    let mut values = Values::new();
    values.insert(
        GLOBAL_KEY,
        json!({
            "namespace": options.namespace.clone().unwrap_or_default(),
            "imagePullSecrets": [],
        }),
    );
    values
}

/// Chart.yaml for an application chart
pub fn application_metadata(name: &str, description: String, options: &GenerateOptions) -> ChartMetadata {
    ChartMetadata::new(
        name,
        description,
        ChartType::Application,
        options.chart_version.clone(),
        Some(options.app_version.clone()),
    )
}

/// Post-install notes listing the chart's services.
///
/// `upgrade_key` is a values path worth showing in the `--set` example,
/// typically the first workload's replica count.
pub fn notes(chart: &str, services: &[&str], upgrade_key: Option<&ValuesPath>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Thank you for installing {chart}.\n\n\
         Release: {{{{ .Release.Name }}}}\n\
         Namespace: {{{{ .Values.global.namespace | default .Release.Namespace }}}}\n\n\
         Services:\n"
    ));
    for service in services {
        out.push_str(&format!("  - {}\n", service));
    }
    out.push_str(
        "\nTo inspect the deployed resources:\n\n  \
         kubectl get all --namespace {{ .Values.global.namespace | default .Release.Namespace }} \
         -l app.kubernetes.io/instance={{ .Release.Name }}\n",
    );
    out.push_str("\nTo change the configuration:\n\n");
    match upgrade_key {
        Some(key) => out.push_str(&format!(
            "  helm upgrade {{{{ .Release.Name }}}} {chart} --set {key}=2\n"
        )),
        None => out.push_str(&format!(
            "  helm upgrade {{{{ .Release.Name }}}} {chart} --set global.namespace=<namespace>\n"
        )),
    }
    out.push_str(&format!(
        "  helm upgrade {{{{ .Release.Name }}}} {chart} -f custom-values.yaml\n"
    ));
    out
}

const STANDARD_HELPERS: &str = r#"{{/*
Expand the name of the chart.
*/}}
{{- define "__PREFIX__.name" -}}
{{- default .Chart.Name .Values.nameOverride | trunc 63 | trimSuffix "-" }}
{{- end }}

{{/*
Create a default fully qualified app name, truncated to 63 characters
because some Kubernetes name fields are limited to this.
*/}}
{{- define "__PREFIX__.fullname" -}}
{{- if .Values.fullnameOverride }}
{{- .Values.fullnameOverride | trunc 63 | trimSuffix "-" }}
{{- else }}
{{- $name := default .Chart.Name .Values.nameOverride }}
{{- if contains $name .Release.Name }}
{{- .Release.Name | trunc 63 | trimSuffix "-" }}
{{- else }}
{{- printf "%s-%s" .Release.Name $name | trunc 63 | trimSuffix "-" }}
{{- end }}
{{- end }}
{{- end }}

{{/*
Chart name and version as used by the chart label.
*/}}
{{- define "__PREFIX__.chart" -}}
{{- printf "%s-%s" .Chart.Name .Chart.Version | replace "+" "_" | trunc 63 | trimSuffix "-" }}
{{- end }}

{{/*
Common labels
*/}}
{{- define "__PREFIX__.labels" -}}
helm.sh/chart: {{ include "__PREFIX__.chart" . }}
{{ include "__PREFIX__.selectorLabels" . }}
app.kubernetes.io/version: {{ .Chart.AppVersion | default .Chart.Version | quote }}
app.kubernetes.io/managed-by: Helm
{{- end }}

{{/*
Selector labels
*/}}
{{- define "__PREFIX__.selectorLabels" -}}
app.kubernetes.io/name: {{ include "__PREFIX__.name" . }}
app.kubernetes.io/instance: {{ .Release.Name }}
{{- end }}

{{/*
Name of the service account to use
*/}}
{{- define "__PREFIX__.serviceAccountName" -}}
{{- with .Values.serviceAccount }}{{ default (include "__PREFIX__.fullname" $) .name }}{{ else }}{{ include "__PREFIX__.fullname" . }}{{ end }}
{{- end }}

{{/*
Image pull secrets shared by every pod in the release
*/}}
{{- define "__PREFIX__.imagePullSecrets" -}}
{{- with .Values.global.imagePullSecrets }}
imagePullSecrets:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- end }}
"#;
