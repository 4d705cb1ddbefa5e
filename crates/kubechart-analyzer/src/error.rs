//! Analyzer error types

use kubechart_core::ResourceRef;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Detector '{detector}' failed on {resource}: {message}")]
    Detector {
        detector: &'static str,
        resource: ResourceRef,
        message: String,
    },

    #[error("Resource {resource} appears more than once in the input")]
    Duplicate { resource: ResourceRef },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
