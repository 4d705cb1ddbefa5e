//! Extract -> process -> analyze -> generate
//!
//! Stages run one after another. Cancellation (Ctrl-C or the `--timeout`
//! deadline) is only observed between stages, so a stage that started
//! always finishes.

use kubechart_analyzer::analyze;
use kubechart_core::{GeneratedChart, GenerateOptions, ResourceGraph};
use kubechart_generator::generate;
use kubechart_processor::ProcessorRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::{CliError, Result};
use crate::extractor::{self, ExtractError, Filters};

/// Stage-boundary cancellation check
#[derive(Debug, Clone)]
pub struct Cancellation {
    interrupted: Arc<AtomicBool>,
    deadline: Option<(Instant, u64)>,
}

impl Cancellation {
    pub fn new(timeout_secs: Option<u64>) -> Self {
        Self {
            interrupted: Arc::new(AtomicBool::new(false)),
            deadline: timeout_secs.map(|s| (Instant::now() + Duration::from_secs(s), s)),
        }
    }

    /// Flip the interrupted flag on Ctrl-C. Needs a running tokio runtime.
    pub fn watch_ctrl_c(&self) {
        let flag = Arc::clone(&self.interrupted);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping at the next stage boundary");
                flag.store(true, Ordering::SeqCst);
            }
        });
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// Error if the run should stop before `stage`
    pub fn check(&self, stage: &'static str) -> Result<()> {
        if self.interrupted.load(Ordering::SeqCst) {
            return Err(CliError::Interrupted { stage });
        }
        if let Some((deadline, seconds)) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(CliError::Timeout { stage, seconds });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub graph: ResourceGraph,
    pub charts: Vec<GeneratedChart>,
    pub extract_errors: Vec<ExtractError>,
    pub sources: usize,
    pub filtered: usize,
    pub skipped: usize,
}

pub async fn run(
    inputs: &[PathBuf],
    filters: &Filters,
    options: &GenerateOptions,
    cancel: &Cancellation,
) -> Result<PipelineOutput> {
    let extraction = extractor::extract(inputs, filters).await?;
    for error in &extraction.errors {
        warn!(%error, "skipping unreadable input");
    }
    cancel.check("processing")?;

    if extraction.objects.is_empty() {
        let help = if extraction.filtered > 0 {
            "every resource was excluded by --kind / --namespace"
        } else {
            "pass YAML or JSON manifests, directories containing them, or - for stdin"
        };
        return Err(CliError::input_with_help(
            format!(
                "no Kubernetes resources found in {} input file(s) ({} unreadable)",
                extraction.sources,
                extraction.errors.len()
            ),
            help,
        ));
    }

    let registry = ProcessorRegistry::new();
    let resources = registry.process_all(&extraction.objects)?;
    let skipped = extraction.objects.len() - resources.len();
    cancel.check("analysis")?;

    let graph = analyze(&resources)?;
    cancel.check("generation")?;

    let charts = generate(&graph, options)?;
    info!(
        resources = resources.len(),
        groups = graph.groups.len(),
        charts = charts.len(),
        "conversion complete"
    );

    Ok(PipelineOutput {
        graph,
        charts,
        extract_errors: extraction.errors,
        sources: extraction.sources,
        filtered: extraction.filtered,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_stops_at_next_stage() {
        let cancel = Cancellation::new(None);
        assert!(cancel.check("analysis").is_ok());
        cancel.interrupt();
        assert!(matches!(
            cancel.check("analysis"),
            Err(CliError::Interrupted { stage: "analysis" })
        ));
    }

    #[test]
    fn test_zero_timeout_expires() {
        let cancel = Cancellation::new(Some(0));
        assert!(matches!(
            cancel.check("processing"),
            Err(CliError::Timeout { seconds: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_run_over_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("app.yaml"),
            r#"
apiVersion: apps/v1
kind: Deployment
metadata: {name: web}
spec:
  selector: {matchLabels: {app: web}}
  template:
    metadata: {labels: {app: web}}
    spec: {containers: [{name: web, image: nginx}]}
---
apiVersion: v1
kind: Service
metadata: {name: web}
spec: {selector: {app: web}}
---
apiVersion: v1
kind: Namespace
metadata: {name: shop}
"#,
        )
        .unwrap();

        let output = run(
            &[dir.path().to_path_buf()],
            &Filters::default(),
            &GenerateOptions::new("shop"),
            &Cancellation::new(None),
        )
        .await
        .unwrap();

        assert_eq!(output.skipped, 1);
        assert_eq!(output.graph.groups.len(), 1);
        assert_eq!(output.graph.relationships.len(), 1);
        assert_eq!(output.charts.len(), 1);
    }

    #[tokio::test]
    async fn test_run_without_resources() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &[dir.path().to_path_buf()],
            &Filters::default(),
            &GenerateOptions::new("shop"),
            &Cancellation::new(None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::Input { .. }));
    }
}
