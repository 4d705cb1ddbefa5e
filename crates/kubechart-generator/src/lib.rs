//! kubechart Generator - turns a resource graph into Helm charts
//!
//! Four layouts are available, one `ChartGenerator` each:
//! - `universal`: a single chart, values under `services.<group>`
//! - `separate`: one standalone chart per group
//! - `library`: a library chart defining every resource body once, plus a
//!   thin wrapper chart per group
//! - `umbrella`: a parent chart with one conditional subchart per group
//!
//! ```ignore
//! use kubechart_core::{GenerateOptions, OutputMode};
//!
//! let options = GenerateOptions::new("shop").with_mode(OutputMode::Umbrella);
//! let charts = kubechart_generator::generate(&graph, &options)?;
//! ```

pub mod error;
pub mod helpers;
pub mod layout;
pub mod library;
pub mod registry;
pub mod render;
pub mod scaffold;
pub mod separate;
pub mod umbrella;
pub mod universal;

pub use error::{GenerateError, Result};
pub use library::LibraryGenerator;
pub use registry::{ChartGenerator, GeneratorRegistry, generate, parse_mode};
pub use separate::SeparateGenerator;
pub use umbrella::UmbrellaGenerator;
pub use universal::UniversalGenerator;
