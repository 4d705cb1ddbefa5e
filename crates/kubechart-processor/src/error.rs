//! Processor error types

use kubechart_core::{CoreError, ResourceRef};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Cannot process {resource}: {message}")]
    Malformed {
        resource: ResourceRef,
        message: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ProcessError {
    pub fn malformed(resource: ResourceRef, message: impl Into<String>) -> Self {
        Self::Malformed {
            resource,
            message: message.into(),
        }
    }

    /// Resource the error is about, when known
    pub fn resource(&self) -> Option<&ResourceRef> {
        match self {
            Self::Malformed { resource, .. } => Some(resource),
            Self::Core(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessError>;
