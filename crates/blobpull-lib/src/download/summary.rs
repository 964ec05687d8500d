use super::types::{DownloadResult, Outcome};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedEntry {
    /// `(container) 'blob/path'`, or the raw path when no container was resolved.
    pub label: String,
    pub detail: String,
}

/// Totals for a finished run, plus the entries worth listing individually.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: Vec<FailedEntry>,
    pub renamed: Vec<(String, PathBuf)>,
}

impl RunSummary {
    pub fn from_results(results: &[DownloadResult]) -> Self {
        let mut summary = RunSummary {
            total: results.len(),
            ..Default::default()
        };

        for result in results {
            match &result.outcome {
                Outcome::Success => {
                    summary.downloaded += 1;
                    if let Some(local_path) = result.local_path.as_ref().filter(|_| result.renamed) {
                        summary
                            .renamed
                            .push((result.source_raw_path.clone(), local_path.clone()));
                    }
                }
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed { detail } => {
                    let label = match &result.target {
                        Some(target) => format!("({}) '{}'", target.container, target.blob_path),
                        None => format!("'{}'", result.source_raw_path),
                    };
                    summary.failed.push(FailedEntry {
                        label,
                        detail: detail.clone(),
                    });
                }
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn log(&self, dry_run: bool) {
        let verb = if dry_run { "Would download" } else { "Downloaded" };
        info!(
            downloaded = self.downloaded,
            skipped = self.skipped,
            failed = self.failed.len(),
            "{} {} file paths",
            verb,
            self.downloaded
        );

        if !self.failed.is_empty() {
            error!("Failed to download one or more paths - (container) path");
            for entry in &self.failed {
                error!("- {}: {}", entry.label, entry.detail);
            }
        }

        if !self.renamed.is_empty() {
            info!("Renamed one or more files because the name already exists");
            for (source, local_path) in &self.renamed {
                info!("- {} -> {}", source, local_path.display());
            }
        }
    }
}
