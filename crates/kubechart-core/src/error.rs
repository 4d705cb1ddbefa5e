//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid resource{}: {message}", source_hint(.source_path))]
    InvalidObject {
        message: String,
        source_path: Option<String>,
    },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Unknown output mode '{value}'{}", suggestion_hint(.suggestion))]
    UnknownMode {
        value: String,
        suggestion: Option<String>,
    },

    #[error("Invalid chart version '{value}': {source}")]
    InvalidVersion {
        value: String,
        #[source]
        source: semver::Error,
    },

    #[error("Invalid option: {message}")]
    InvalidOption { message: String },
}

fn source_hint(path: &Option<String>) -> String {
    match path {
        Some(p) => format!(" in {}", p),
        None => String::new(),
    }
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
