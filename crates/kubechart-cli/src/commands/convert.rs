//! Convert command - turn Kubernetes manifests into Helm charts
//!
//! Settings resolve flag first, then config file, then built-in default.

use clap::Args;
use kubechart_core::{GenerateOptions, ScaffoldOptions};
use kubechart_generator::parse_mode;
use std::path::PathBuf;
use tracing::debug;

use crate::config::ConvertConfig;
use crate::display;
use crate::error::{CliError, Result};
use crate::extractor::Filters;
use crate::pipeline::{self, Cancellation};
use crate::writer;

const DEFAULT_CHART_NAME: &str = "chart";

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Manifest files or directories, `-` for stdin
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory the chart directories are written into [default: .]
    #[arg(short, long, env = "KUBECHART_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Chart name [default: chart]
    #[arg(short, long, env = "KUBECHART_NAME")]
    pub name: Option<String>,

    /// Chart version, SemVer [default: 0.1.0]
    #[arg(long, env = "KUBECHART_CHART_VERSION")]
    pub chart_version: Option<String>,

    /// Application version [default: latest]
    #[arg(long, env = "KUBECHART_APP_VERSION")]
    pub app_version: Option<String>,

    /// Namespace written to `global.namespace`
    #[arg(long, env = "KUBECHART_TARGET_NAMESPACE")]
    pub target_namespace: Option<String>,

    /// Chart layout: universal, separate, library or umbrella [default: universal]
    #[arg(short, long, env = "KUBECHART_MODE")]
    pub mode: Option<String>,

    /// Only convert resources of these kinds
    #[arg(long = "kind", env = "KUBECHART_KINDS", value_delimiter = ',')]
    pub kinds: Vec<String>,

    /// Only convert resources from these namespaces
    #[arg(long = "namespace", env = "KUBECHART_NAMESPACES", value_delimiter = ',')]
    pub namespaces: Vec<String>,

    /// Replace existing chart directories
    #[arg(long, env = "KUBECHART_FORCE")]
    pub force: bool,

    /// Show what would be written without touching the disk
    #[arg(long)]
    pub dry_run: bool,

    /// Give up at the next stage boundary after this many seconds
    #[arg(long, env = "KUBECHART_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Settings file [default: ~/.config/kubechart/config.yaml if present]
    #[arg(long, env = "KUBECHART_CONFIG")]
    pub config: Option<PathBuf>,

    /// Declare an external library chart in every generated chart
    #[arg(long, env = "KUBECHART_SCAFFOLD_LIBRARY", requires = "scaffold_repository")]
    pub scaffold_library: Option<String>,

    /// Repository of the scaffold library chart
    #[arg(long, env = "KUBECHART_SCAFFOLD_REPOSITORY", requires = "scaffold_library")]
    pub scaffold_repository: Option<String>,

    /// Version constraint of the scaffold library chart [default: *]
    #[arg(long, env = "KUBECHART_SCAFFOLD_VERSION", requires = "scaffold_library")]
    pub scaffold_version: Option<String>,
}

/// Fully resolved settings for one run
#[derive(Debug)]
struct Settings {
    options: GenerateOptions,
    output: PathBuf,
    timeout: Option<u64>,
}

impl ConvertArgs {
    fn resolve(&self, config: ConvertConfig) -> Result<Settings> {
        let name = self
            .name
            .clone()
            .or(config.chart_name)
            .unwrap_or_else(|| DEFAULT_CHART_NAME.to_string());
        let mut options = GenerateOptions::new(name);

        if let Some(version) = self.chart_version.clone().or(config.chart_version) {
            options.chart_version = version;
        }
        if let Some(version) = self.app_version.clone().or(config.app_version) {
            options.app_version = version;
        }
        options.namespace = self.target_namespace.clone().or(config.namespace);
        if let Some(mode) = self.mode.as_deref().or(config.mode.as_deref()) {
            options.mode = parse_mode(mode)?;
        }
        options.scaffold = match (&self.scaffold_library, &self.scaffold_repository) {
            (Some(library), Some(repository)) => {
                let mut scaffold = ScaffoldOptions::new(library, repository);
                if let Some(version) = &self.scaffold_version {
                    scaffold.library_version = version.clone();
                }
                Some(scaffold)
            }
            _ => config.scaffold,
        };

        Ok(Settings {
            options,
            output: self
                .output
                .clone()
                .or(config.output)
                .unwrap_or_else(|| PathBuf::from(".")),
            timeout: self.timeout.or(config.timeout),
        })
    }

    fn filters(&self) -> Filters {
        Filters {
            kinds: self.kinds.clone(),
            namespaces: self.namespaces.clone(),
        }
    }
}

pub fn run(args: ConvertArgs, quiet: bool) -> Result<()> {
    let config = ConvertConfig::load(args.config.as_deref())?;
    let settings = args.resolve(config)?;
    settings.options.validate().map_err(|e| CliError::usage(e.to_string()))?;
    debug!(?settings, "resolved settings");

    if !quiet {
        display::print_header(&args.inputs, &settings.output, settings.options.mode.as_str());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::internal(format!("failed to start runtime: {}", e)))?;

    let filters = args.filters();
    let result = runtime.block_on(async {
        let cancel = Cancellation::new(settings.timeout);
        cancel.watch_ctrl_c();
        pipeline::run(&args.inputs, &filters, &settings.options, &cancel).await
    })?;

    let written = writer::write_charts(&result.charts, &settings.output, args.force, args.dry_run)?;

    if !quiet {
        display::print_extract_errors(&result);
        display::print_graph(&result);
        display::print_files(&written, &settings.output);
        display::print_summary(&result, written.len());
        display::print_next_steps(&result.charts, &settings.output, args.dry_run);
    }
    Ok(())
}
