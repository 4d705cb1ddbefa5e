//! CLI error types with exit code handling
//!
//! Every pipeline stage error is folded into `CliError`, which knows the
//! exit code to report.

use kubechart_analyzer::AnalysisError;
use kubechart_core::CoreError;
use kubechart_generator::GenerateError;
use kubechart_processor::ProcessError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Nothing usable in the inputs
    #[error("Input error: {message}")]
    #[diagnostic(code(kubechart::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A resource could not be turned into chart content
    #[error("{message}")]
    #[diagnostic(
        code(kubechart::cli::process),
        help("fix or exclude the resource (see --kind and --namespace)")
    )]
    Process { message: String },

    #[error("Analysis failed: {message}")]
    #[diagnostic(code(kubechart::cli::analysis))]
    Analysis { message: String },

    #[error("Generation failed: {message}")]
    #[diagnostic(code(kubechart::cli::generate))]
    Generate {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid option value
    #[error("{message}")]
    #[diagnostic(code(kubechart::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Output directory already exists: {}", path.display())]
    #[diagnostic(
        code(kubechart::cli::output_exists),
        help("use --force to overwrite it")
    )]
    OutputExists { path: PathBuf },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(kubechart::cli::io))]
    Io { message: String },

    #[error("Interrupted before {stage}")]
    #[diagnostic(code(kubechart::cli::interrupted))]
    Interrupted { stage: &'static str },

    #[error("Timed out after {seconds}s, before {stage}")]
    #[diagnostic(
        code(kubechart::cli::timeout),
        help("raise --timeout or convert fewer inputs at once")
    )]
    Timeout { stage: &'static str, seconds: u64 },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(kubechart::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input { .. } | CliError::Process { .. } => exit_codes::INPUT_ERROR,
            CliError::Analysis { .. } => exit_codes::ANALYSIS_ERROR,
            CliError::Generate { .. } => exit_codes::GENERATE_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::OutputExists { .. } | CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Interrupted { .. } => exit_codes::INTERRUPTED,
            CliError::Timeout { .. } => exit_codes::TIMEOUT,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<ProcessError> for CliError {
    fn from(err: ProcessError) -> Self {
        CliError::Process {
            message: err.to_string(),
        }
    }
}

impl From<AnalysisError> for CliError {
    fn from(err: AnalysisError) -> Self {
        CliError::Analysis {
            message: err.to_string(),
        }
    }
}

impl From<GenerateError> for CliError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::UnknownMode { .. } => CliError::Usage {
                message: err.to_string(),
                help: Some("valid modes: universal, separate, library, umbrella".to_string()),
            },
            GenerateError::InvalidOption(_) => CliError::Usage {
                message: err.to_string(),
                help: None,
            },
            GenerateError::Inconsistent { .. } => CliError::Generate {
                message: err.to_string(),
                help: Some("try --mode universal, which tolerates differing resource bodies".to_string()),
            },
            GenerateError::Schema(_) => CliError::Generate {
                message: err.to_string(),
                help: None,
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::Internal {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::input("x").exit_code(), exit_codes::INPUT_ERROR);
        assert_eq!(
            CliError::OutputExists { path: "out".into() }.exit_code(),
            exit_codes::IO_ERROR
        );
        assert_eq!(
            CliError::Interrupted { stage: "analysis" }.exit_code(),
            exit_codes::INTERRUPTED
        );
    }

    #[test]
    fn test_unknown_mode_is_usage_error() {
        let err: CliError = kubechart_generator::parse_mode("umbrela").unwrap_err().into();
        assert_eq!(err.exit_code(), exit_codes::USAGE_ERROR);
        assert!(err.to_string().contains("did you mean 'umbrella'"));
    }
}
