//! kubechart Processor - per-kind rules
//!
//! Turns each extracted `K8sObject` into a `ProcessedResource`: values,
//! a category template body, a service name and static dependencies.
//!
//! Dispatch is by exact Group/Version/Kind:
//! - workload rules (Deployment, StatefulSet, DaemonSet, Job, CronJob)
//! - auxiliary rules (Service, ConfigMap, Secret, RBAC, autoscaling, ...)
//! - a generic fallback for everything else, custom resources included

pub mod auxiliary;
pub mod error;
pub mod generic;
pub mod naming;
pub mod registry;
pub mod templates;
pub mod workload;

pub use error::{ProcessError, Result};
pub use naming::{camel_case, service_name};
pub use registry::{ProcessorRegistry, ResourceRule, RuleOutput};
