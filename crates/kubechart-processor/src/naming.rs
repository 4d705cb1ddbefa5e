//! Service name inference
//!
//! Resources that belong to one logical service rarely share a single
//! name: `webapp`, `webapp-config`, `webapp-svc` and a Deployment labelled
//! `app.kubernetes.io/name: webapp` should all end up in the `webapp` group.
//!
//! Policy:
//! 1. candidate is the `app.kubernetes.io/name` label, else the `app`
//!    label, else `metadata.name`
//! 2. lowercase; anything outside `[a-z0-9-]` becomes `-`; runs of `-`
//!    collapse; leading and trailing `-` are trimmed
//! 3. one trailing role suffix from [`ROLE_SUFFIXES`] is stripped when
//!    something remains
//! 4. an empty result falls back to the lowercase kind
//! 5. a name from [`RESERVED_NAMES`] gets an `-app` suffix

use kubechart_core::K8sObject;

pub const NAME_LABEL: &str = "app.kubernetes.io/name";
pub const LEGACY_NAME_LABEL: &str = "app";

/// Suffixes naming the role of a resource rather than the service.
///
/// Longer entries come before their prefixes (`-configmap` before
/// `-config`) so the most specific suffix wins.
pub const ROLE_SUFFIXES: &[&str] = &[
    "-configmap",
    "-config",
    "-cm",
    "-secrets",
    "-secret",
    "-env",
    "-service",
    "-svc",
    "-headless",
    "-ingress",
    "-hpa",
    "-pdb",
    "-serviceaccount",
    "-sa",
    "-rolebinding",
    "-role",
    "-networkpolicy",
    "-netpol",
    "-pvc",
    "-tls",
    "-credentials",
    "-creds",
    "-settings",
];

/// Names Helm gives a meaning of its own at the top of a values tree;
/// `global` is shared with every subchart.
pub const RESERVED_NAMES: &[&str] = &["global"];

/// Grouping key for an object
pub fn service_name(object: &K8sObject) -> String {
    let candidate = object
        .label(NAME_LABEL)
        .or_else(|| object.label(LEGACY_NAME_LABEL))
        .unwrap_or_else(|| object.name());

    let name = strip_role_suffix(&normalize(candidate));
    if name.is_empty() {
        object.kind().to_ascii_lowercase()
    } else if RESERVED_NAMES.contains(&name.as_str()) {
        format!("{}-app", name)
    } else {
        name
    }
}

/// Lowercase DNS-label-like form of `raw`
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('-').to_string()
}

fn strip_role_suffix(name: &str) -> String {
    for suffix in ROLE_SUFFIXES {
        if let Some(stem) = name.strip_suffix(suffix)
            && !stem.is_empty()
        {
            return stem.to_string();
        }
    }
    name.to_string()
}

/// `HorizontalPodAutoscaler` -> `horizontalPodAutoscaler`,
/// `HTTPRoute` -> `httpRoute`
pub fn camel_case(kind: &str) -> String {
    let chars: Vec<char> = kind.chars().collect();
    let upper_run = chars.iter().take_while(|c| c.is_ascii_uppercase()).count();

    // keep the last capital of an acronym when it starts the next word
    let lower_count = match upper_run {
        0 => 0,
        n if n == chars.len() => n,
        1 => 1,
        n => n - 1,
    };

    chars
        .iter()
        .enumerate()
        .map(|(i, c)| {
            if i < lower_count {
                c.to_ascii_lowercase()
            } else {
                *c
            }
        })
        .collect()
}
