//! Segment-based template model
//!
//! A resource template is a list of segments: literal Go-template text and
//! references to shared blocks. Bodies never embed resource-specific data;
//! every value is read from the `$v` binding, so two resources of the same
//! category always produce the same body. That property is what lets the
//! library layout define `library.<category>` once and lets every other
//! layout share one set of block definitions.
//!
//! Bodies may use these bindings, which the chart generator supplies:
//!
//! | Binding   | Meaning                                               |
//! |-----------|-------------------------------------------------------|
//! | `$root`   | top-level template context (`.Values`, `.Release`, …) |
//! | `$v`      | the resource's own values fragment                    |
//! | `$labels` | source labels merged with the chart's standard labels |
//! | `$ns`     | target namespace (`global.namespace` or the release's) |

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Named sub-templates factored out of resource bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SharedBlock {
    PodSpec,
    Container,
    Env,
    Probes,
    Resources,
    VolumeMounts,
    Volumes,
}

impl SharedBlock {
    pub const ALL: [SharedBlock; 7] = [
        SharedBlock::PodSpec,
        SharedBlock::Container,
        SharedBlock::Env,
        SharedBlock::Probes,
        SharedBlock::Resources,
        SharedBlock::VolumeMounts,
        SharedBlock::Volumes,
    ];

    /// Name of the block inside a chart, without the helper prefix
    pub fn name(&self) -> &'static str {
        match self {
            SharedBlock::PodSpec => "podSpec",
            SharedBlock::Container => "container",
            SharedBlock::Env => "env",
            SharedBlock::Probes => "probes",
            SharedBlock::Resources => "resources",
            SharedBlock::VolumeMounts => "volumeMounts",
            SharedBlock::Volumes => "volumes",
        }
    }

    /// Blocks this block includes
    pub fn requires(&self) -> &'static [SharedBlock] {
        match self {
            SharedBlock::PodSpec => &[SharedBlock::Container, SharedBlock::Volumes],
            SharedBlock::Container => &[
                SharedBlock::Env,
                SharedBlock::Resources,
                SharedBlock::VolumeMounts,
                SharedBlock::Probes,
            ],
            _ => &[],
        }
    }

    /// `define` text for this block, with includes resolved against `prefix`
    pub fn definition(&self, prefix: &str) -> String {
        let source = match self {
            SharedBlock::PodSpec => POD_SPEC_BLOCK,
            SharedBlock::Container => CONTAINER_BLOCK,
            SharedBlock::Env => ENV_BLOCK,
            SharedBlock::Probes => PROBES_BLOCK,
            SharedBlock::Resources => RESOURCES_BLOCK,
            SharedBlock::VolumeMounts => VOLUME_MOUNTS_BLOCK,
            SharedBlock::Volumes => VOLUMES_BLOCK,
        };
        source.replace(PREFIX_MARKER, prefix)
    }
}

impl fmt::Display for SharedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One piece of a template body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Segment {
    /// Literal template text, emitted as-is
    Text(String),
    /// `include` of a shared block, re-indented to `indent` columns
    Block {
        block: SharedBlock,
        arg: String,
        indent: usize,
    },
}

impl Segment {
    fn render(&self, prefix: &str, out: &mut String) {
        match self {
            Segment::Text(text) => out.push_str(text),
            Segment::Block { block, arg, indent } => {
                out.push_str(&format!(
                    "{}{{{{- include \"{}.{}\" {} | trim | nindent {} }}}}\n",
                    " ".repeat(*indent),
                    prefix,
                    block.name(),
                    arg,
                    indent
                ));
            }
        }
    }
}

/// Template body for one resource category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTemplate {
    category: String,
    segments: Vec<Segment>,
}

impl ResourceTemplate {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            segments: Vec::new(),
        }
    }

    /// Append literal text
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Text(text.into()));
        self
    }

    /// Append an include of a shared block
    pub fn block(mut self, block: SharedBlock, arg: impl Into<String>, indent: usize) -> Self {
        self.segments.push(Segment::Block {
            block,
            arg: arg.into(),
            indent,
        });
        self
    }

    /// Template category (`deployment`, `service`, `configMap`, ...)
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Render the body with block includes resolved against `prefix`
    pub fn render(&self, prefix: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            segment.render(prefix, &mut out);
        }
        out
    }

    /// Every shared block this body needs, including transitive includes
    pub fn blocks(&self) -> BTreeSet<SharedBlock> {
        let mut found = BTreeSet::new();
        let mut pending: Vec<SharedBlock> = self
            .segments
            .iter()
            .filter_map(|s| match s {
                Segment::Block { block, .. } => Some(*block),
                Segment::Text(_) => None,
            })
            .collect();

        while let Some(block) = pending.pop() {
            if found.insert(block) {
                pending.extend_from_slice(block.requires());
            }
        }
        found
    }
}

/// Named templates every chart's `_helpers.tpl` defines besides shared blocks
pub const HELPER_NAMES: [&str; 7] = [
    "name",
    "fullname",
    "chart",
    "labels",
    "selectorLabels",
    "serviceAccountName",
    "imagePullSecrets",
];

const PREFIX_MARKER: &str = "__PREFIX__";

const POD_SPEC_BLOCK: &str = r#"{{- define "__PREFIX__.podSpec" -}}
{{- $v := .v }}
{{- $root := .root }}
{{- with $v.serviceAccountName }}
serviceAccountName: {{ . }}
{{- end }}
{{- if $v.imagePullSecrets }}
imagePullSecrets:
  {{- toYaml $v.imagePullSecrets | nindent 2 }}
{{- else }}
{{- include "__PREFIX__.imagePullSecrets" $root }}
{{- end }}
{{- with $v.initContainers }}
initContainers:
  {{- range . }}
  - {{- include "__PREFIX__.container" . | trim | nindent 4 }}
  {{- end }}
{{- end }}
containers:
  {{- range $v.containers }}
  - {{- include "__PREFIX__.container" . | trim | nindent 4 }}
  {{- end }}
{{- include "__PREFIX__.volumes" $v }}
{{- with $v.restartPolicy }}
restartPolicy: {{ . }}
{{- end }}
{{- if hasKey $v "terminationGracePeriodSeconds" }}
terminationGracePeriodSeconds: {{ $v.terminationGracePeriodSeconds }}
{{- end }}
{{- with $v.priorityClassName }}
priorityClassName: {{ . }}
{{- end }}
{{- with $v.hostNetwork }}
hostNetwork: {{ . }}
{{- end }}
{{- with $v.dnsPolicy }}
dnsPolicy: {{ . }}
{{- end }}
{{- with $v.securityContext }}
securityContext:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with $v.nodeSelector }}
nodeSelector:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with $v.affinity }}
affinity:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with $v.tolerations }}
tolerations:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with $v.topologySpreadConstraints }}
topologySpreadConstraints:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- end }}
"#;

const CONTAINER_BLOCK: &str = r#"{{- define "__PREFIX__.container" -}}
name: {{ .name }}
{{- with .image }}
image: "{{ .repository }}{{ with .digest }}@{{ . }}{{ else }}:{{ .tag | default "latest" }}{{ end }}"
{{- end }}
{{- with .imagePullPolicy }}
imagePullPolicy: {{ . }}
{{- end }}
{{- with .command }}
command:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with .args }}
args:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with .workingDir }}
workingDir: {{ . }}
{{- end }}
{{- with .ports }}
ports:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- include "__PREFIX__.env" . }}
{{- include "__PREFIX__.resources" . }}
{{- include "__PREFIX__.volumeMounts" . }}
{{- include "__PREFIX__.probes" . }}
{{- with .lifecycle }}
lifecycle:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with .securityContext }}
securityContext:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- end }}
"#;

const ENV_BLOCK: &str = r#"{{- define "__PREFIX__.env" -}}
{{- with .env }}
env:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with .envFrom }}
envFrom:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- end }}
"#;

const PROBES_BLOCK: &str = r#"{{- define "__PREFIX__.probes" -}}
{{- with .livenessProbe }}
livenessProbe:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with .readinessProbe }}
readinessProbe:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- with .startupProbe }}
startupProbe:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- end }}
"#;

const RESOURCES_BLOCK: &str = r#"{{- define "__PREFIX__.resources" -}}
{{- with .resources }}
resources:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- end }}
"#;

const VOLUME_MOUNTS_BLOCK: &str = r#"{{- define "__PREFIX__.volumeMounts" -}}
{{- with .volumeMounts }}
volumeMounts:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- end }}
"#;

const VOLUMES_BLOCK: &str = r#"{{- define "__PREFIX__.volumes" -}}
{{- with .volumes }}
volumes:
  {{- toYaml . | nindent 2 }}
{{- end }}
{{- end }}
"#;
