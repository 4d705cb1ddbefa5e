//! kubechart Core - shared model for the manifest to chart pipeline
//!
//! This crate provides the types passed between the pipeline stages:
//! - `K8sObject`: a generic Kubernetes resource plus its GVK identity
//! - `ResourceRef`: immutable identity tuple used as a map/set key
//! - `ProcessedResource`: the chart-ready form of one resource
//! - `ResourceGraph`: service groups and relationship edges
//! - `GeneratedChart`: an in-memory Helm chart ready to be written
//! - `Values`: values tree with deep merge support
//! - `ResourceTemplate`: the segment-based template model shared by every chart layout

pub mod chart;
pub mod error;
pub mod graph;
pub mod object;
pub mod options;
pub mod reference;
pub mod resource;
pub mod template;
pub mod values;

pub use chart::{ChartDependency, ChartLock, ChartMetadata, ChartType, GeneratedChart};
pub use error::{CoreError, Result};
pub use graph::{RelationType, Relationship, ResourceGraph, ResourceGroup};
pub use object::K8sObject;
pub use options::{GenerateOptions, OutputMode, ScaffoldOptions};
pub use reference::ResourceRef;
pub use resource::ProcessedResource;
pub use template::{HELPER_NAMES, ResourceTemplate, Segment, SharedBlock};
pub use values::{Values, ValuesPath};

pub use kube::core::GroupVersionKind;
