//! Manifest extraction
//!
//! Inputs are files, directories (searched recursively for `.yaml`, `.yml`
//! and `.json`) or `-` for stdin. Each input file is parsed on its own
//! blocking task; objects and errors are collected over two channels and
//! re-sorted by input position so the result never depends on scheduling.

use kubechart_core::K8sObject;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{CliError, Result};

const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// One input after directory expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    pub fn display(&self) -> String {
        match self {
            Source::Stdin => "<stdin>".to_string(),
            Source::File(path) => path.display().to_string(),
        }
    }

    fn read(&self) -> std::io::Result<String> {
        match self {
            Source::Stdin => {
                let mut content = String::new();
                std::io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
            Source::File(path) => std::fs::read_to_string(path),
        }
    }

    fn path(&self) -> Option<PathBuf> {
        match self {
            Source::Stdin => None,
            Source::File(path) => Some(path.clone()),
        }
    }
}

/// A file or document that could not be read
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{source_name}{}: {message}", document_hint(.document))]
pub struct ExtractError {
    pub source_name: String,
    /// Zero-based document index in a multi-document stream
    pub document: Option<usize>,
    pub message: String,
}

fn document_hint(document: &Option<usize>) -> String {
    match document {
        Some(i) => format!(" (document {})", i + 1),
        None => String::new(),
    }
}

/// Resource filters; empty lists accept everything
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub kinds: Vec<String>,
    pub namespaces: Vec<String>,
}

impl Filters {
    /// Kinds compare case-insensitively. Objects without a namespace pass
    /// the namespace filter.
    pub fn accepts(&self, object: &K8sObject) -> bool {
        let kind_ok = self.kinds.is_empty()
            || self
                .kinds
                .iter()
                .any(|k| k.eq_ignore_ascii_case(object.kind()));
        let namespace_ok = match object.namespace() {
            Some(ns) if !ns.is_empty() && !self.namespaces.is_empty() => {
                self.namespaces.iter().any(|n| n == ns)
            }
            _ => true,
        };
        kind_ok && namespace_ok
    }
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub objects: Vec<K8sObject>,
    pub errors: Vec<ExtractError>,
    pub sources: usize,
    pub filtered: usize,
}

/// Expand inputs into sources, directories in sorted path order
pub fn expand_inputs(inputs: &[PathBuf]) -> (Vec<Source>, Vec<ExtractError>) {
    let mut sources = Vec::new();
    let mut errors = Vec::new();
    for input in inputs {
        if input.as_os_str() == "-" {
            sources.push(Source::Stdin);
        } else if input.is_dir() {
            let mut files: Vec<PathBuf> = WalkDir::new(input)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        errors.push(ExtractError {
                            source_name: input.display().to_string(),
                            document: None,
                            message: e.to_string(),
                        });
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file() && has_manifest_extension(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            files.sort();
            sources.extend(files.into_iter().map(Source::File));
        } else if input.is_file() {
            sources.push(Source::File(input.clone()));
        } else {
            errors.push(ExtractError {
                source_name: input.display().to_string(),
                document: None,
                message: "no such file or directory".to_string(),
            });
        }
    }
    (sources, errors)
}

fn has_manifest_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

type Position = (usize, usize, usize);

/// Read every source concurrently and join the results in input order
pub async fn extract(inputs: &[PathBuf], filters: &Filters) -> Result<Extraction> {
    let (sources, mut errors) = expand_inputs(inputs);
    let source_count = sources.len();

    let (object_tx, mut object_rx) = mpsc::unbounded_channel::<(Position, K8sObject)>();
    let (error_tx, mut error_rx) = mpsc::unbounded_channel::<(usize, ExtractError)>();

    let mut handles = Vec::with_capacity(sources.len());
    for (index, source) in sources.into_iter().enumerate() {
        let object_tx = object_tx.clone();
        let error_tx = error_tx.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            read_source(index, &source, &object_tx, &error_tx);
        }));
    }
    drop(object_tx);
    drop(error_tx);

    for handle in handles {
        handle
            .await
            .map_err(|e| CliError::internal(format!("extraction task failed: {}", e)))?;
    }

    let mut objects = Vec::new();
    while let Some(item) = object_rx.recv().await {
        objects.push(item);
    }
    let mut indexed_errors = Vec::new();
    while let Some(item) = error_rx.recv().await {
        indexed_errors.push(item);
    }

    objects.sort_by_key(|(position, _)| *position);
    indexed_errors.sort_by_key(|(index, e)| (*index, e.document));
    errors.extend(indexed_errors.into_iter().map(|(_, e)| e));

    let total = objects.len();
    let objects: Vec<K8sObject> = objects
        .into_iter()
        .map(|(_, object)| object)
        .filter(|object| filters.accepts(object))
        .collect();

    debug!(
        sources = source_count,
        objects = objects.len(),
        errors = errors.len(),
        "extraction complete"
    );
    Ok(Extraction {
        filtered: total - objects.len(),
        objects,
        errors,
        sources: source_count,
    })
}

fn read_source(
    index: usize,
    source: &Source,
    objects: &mpsc::UnboundedSender<(Position, K8sObject)>,
    errors: &mpsc::UnboundedSender<(usize, ExtractError)>,
) {
    let report = |document: Option<usize>, message: String| {
        // receiver outlives every task
        let _ = errors.send((
            index,
            ExtractError {
                source_name: source.display(),
                document,
                message,
            },
        ));
    };

    let content = match source.read() {
        Ok(content) => content,
        Err(e) => return report(None, e.to_string()),
    };

    for (document, result) in parse_documents(&content).into_iter().enumerate() {
        let value = match result {
            Ok(Some(value)) => value,
            Ok(None) => continue,
            Err(message) => {
                report(Some(document), message);
                continue;
            }
        };
        match to_objects(value, source.path()) {
            Ok(found) => {
                for (item, object) in found.into_iter().enumerate() {
                    let _ = objects.send(((index, document, item), object));
                }
            }
            Err(message) => report(Some(document), message),
        }
    }
}

/// Split a YAML (or JSON) stream into documents; empty documents are `None`
pub fn parse_documents(content: &str) -> Vec<std::result::Result<Option<JsonValue>, String>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(content) {
        let parsed = match JsonValue::deserialize(document) {
            Ok(JsonValue::Null) => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(e.to_string()),
        };
        let fatal = parsed.is_err();
        documents.push(parsed);
        // the stream cannot resynchronize after a syntax error
        if fatal {
            break;
        }
    }
    documents
}

/// One object, or the items of a `kind: List`
pub fn to_objects(value: JsonValue, source: Option<PathBuf>) -> std::result::Result<Vec<K8sObject>, String> {
    let is_list = value.get("kind").and_then(JsonValue::as_str) == Some("List")
        && value.get("items").is_some();
    if !is_list {
        return K8sObject::from_value(value, source)
            .map(|object| vec![object])
            .map_err(|e| e.to_string());
    }

    let Some(JsonValue::Array(items)) = value.get("items") else {
        return Err("List items must be a sequence".to_string());
    };
    items
        .iter()
        .map(|item| K8sObject::from_value(item.clone(), source.clone()).map_err(|e| e.to_string()))
        .collect()
}
