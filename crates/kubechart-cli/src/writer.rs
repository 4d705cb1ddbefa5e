//! Writes generated charts to disk

use chrono::Utc;
use kubechart_core::{ChartLock, GeneratedChart};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CliError, Result};

/// Write every chart under `output`, returning the written paths.
///
/// Existing chart directories are an error unless `force` is set, in which
/// case they are replaced. With `dry_run` nothing touches the disk.
pub fn write_charts(
    charts: &[GeneratedChart],
    output: &Path,
    force: bool,
    dry_run: bool,
) -> Result<Vec<PathBuf>> {
    for chart in charts {
        let dir = output.join(&chart.location);
        if dir.exists() && !force {
            return Err(CliError::OutputExists { path: dir });
        }
    }

    let mut written = Vec::new();
    for chart in charts {
        let dir = output.join(&chart.location);
        if !dry_run && force && dir.exists() {
            fs::remove_dir_all(&dir)?;
        }

        let mut files = chart.files()?;
        if let Some(lock) = ChartLock::for_chart(&chart.metadata, Utc::now())? {
            files.insert("Chart.lock".to_string(), lock.to_yaml()?);
        }

        for (relative, content) in files {
            let path = dir.join(&relative);
            if !dry_run {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, content)?;
            }
            written.push(path);
        }
        debug!(chart = %chart.name, dir = %dir.display(), "chart written");
    }
    Ok(written)
}
