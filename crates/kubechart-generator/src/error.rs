//! Generator error types

use kubechart_core::{CoreError, OutputMode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Unknown output mode '{mode}'{}", suggestion_hint(.suggestion))]
    UnknownMode {
        mode: String,
        suggestion: Option<String>,
    },

    #[error("Inconsistent resource graph: {message}")]
    Inconsistent { message: String },

    #[error(transparent)]
    InvalidOption(#[from] CoreError),

    #[error("Failed to serialize values schema: {0}")]
    Schema(#[from] serde_json::Error),
}

impl GenerateError {
    pub fn unregistered(mode: OutputMode) -> Self {
        Self::UnknownMode {
            mode: mode.to_string(),
            suggestion: None,
        }
    }

    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent {
            message: message.into(),
        }
    }
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{}'?)", s),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;
