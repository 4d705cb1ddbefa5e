//! kubechart Analyzer - logical services and their relationships
//!
//! Resources are partitioned into groups by service name (first-seen
//! order), then a fixed set of detectors finds the edges between them:
//! selectors, Ingress/route backends, autoscaler targets, disruption
//! budgets, RBAC bindings and ConfigMap/Secret references.

pub mod analyzer;
pub mod detectors;
pub mod error;
pub mod index;

pub use analyzer::{Analyzer, analyze, group_by_service};
pub use detectors::{Detector, DetectorRegistry};
pub use error::{AnalysisError, Result};
pub use index::ResourceIndex;
