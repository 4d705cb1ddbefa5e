//! Console output for the convert command

use console::style;
use kubechart_core::GeneratedChart;
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineOutput;

pub fn print_header(inputs: &[PathBuf], output: &Path, mode: &str) {
    println!();
    println!(
        "  {} {} {}",
        style("kubechart convert").bold().cyan(),
        style("─").dim(),
        style(format!("manifests → Helm ({} layout)", mode)).dim()
    );
    println!();
    for input in inputs {
        println!("  {} {}", style("Source:").dim(), style(input.display()).cyan());
    }
    println!("  {} {}", style("Target:").dim(), style(output.display()).green());
    println!();
}

pub fn print_graph(result: &PipelineOutput) {
    println!("  {}", style("Services").bold());
    println!("  {}", style("────────").dim());
    for group in &result.graph.groups {
        let kinds: Vec<String> = group
            .resources
            .iter()
            .map(|r| r.reference.short())
            .collect();
        println!(
            "  {} {} {}",
            style("●").cyan(),
            style(&group.name).bold(),
            style(kinds.join(", ")).dim()
        );
    }
    println!();

    if !result.graph.relationships.is_empty() {
        println!("  {}", style("Relationships").bold());
        println!("  {}", style("─────────────").dim());
        for edge in &result.graph.relationships {
            println!("  {} {}", style("→").blue(), edge);
        }
        println!();
    }
}

pub fn print_extract_errors(result: &PipelineOutput) {
    if result.extract_errors.is_empty() {
        return;
    }
    println!("  {}", style("Unreadable Inputs").bold().yellow());
    println!("  {}", style("─────────────────").dim());
    for error in &result.extract_errors {
        println!("  {} {}", style("⚠").yellow(), error);
    }
    println!();
}

pub fn print_files(files: &[PathBuf], output: &Path) {
    println!("  {}", style("Generated Files").bold());
    println!("  {}", style("───────────────").dim());
    for file in files {
        let rel_path = file.strip_prefix(output).unwrap_or(file);
        println!("  {} {}", style("✓").green().bold(), rel_path.display());
    }
    println!();
}

pub fn print_summary(result: &PipelineOutput, files: usize) {
    println!("  {}", style("Summary").bold());
    println!("  {}", style("───────").dim());
    let rows = [
        (result.graph.resource_count(), "resources"),
        (result.graph.groups.len(), "services"),
        (result.graph.relationships.len(), "relationships"),
        (result.charts.len(), "charts"),
        (files, "files"),
    ];
    for (count, label) in rows {
        println!(
            "  {} {}",
            style(format!("{:>3}", count)).green().bold(),
            style(label).dim()
        );
    }
    if result.skipped > 0 {
        println!(
            "  {} {} {}",
            style(format!("{:>3}", result.skipped)).yellow().bold(),
            style("skipped").dim(),
            style("(cluster-managed or controller-owned)").dim()
        );
    }
    if result.filtered > 0 {
        println!(
            "  {} {}",
            style(format!("{:>3}", result.filtered)).yellow().bold(),
            style("filtered out").dim()
        );
    }
    println!();
}

pub fn print_next_steps(charts: &[GeneratedChart], output: &Path, dry_run: bool) {
    if dry_run {
        println!(
            "  {} {}",
            style("ℹ").cyan(),
            style("Dry run mode - no files were written").dim()
        );
        println!();
        return;
    }

    println!("  {}", style("Next Steps").bold());
    println!("  {}", style("──────────").dim());

    let top_level: Vec<&GeneratedChart> = charts
        .iter()
        .filter(|c| c.location.components().count() == 1)
        .collect();
    let mut step = 1;
    for chart in &top_level {
        let dir = output.join(&chart.location);
        if !chart.dependencies().is_empty() {
            println!(
                "  {} {}",
                style(format!("{}.", step)).dim(),
                style(format!("helm dependency update {}", dir.display())).cyan()
            );
            step += 1;
        }
    }
    if let Some(chart) = top_level.iter().find(|c| !c.is_library()) {
        let dir = output.join(&chart.location);
        println!(
            "  {} {}",
            style(format!("{}.", step)).dim(),
            style(format!("helm lint {}", dir.display())).cyan()
        );
        println!(
            "  {} {}",
            style(format!("{}.", step + 1)).dim(),
            style(format!("helm install {} {}", chart.name, dir.display())).cyan()
        );
    }
    println!();
}
