use crate::paths::ResolvedTarget;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Skipped,
    Failed { detail: String },
}

#[derive(Clone, Debug)]
pub struct DownloadResult {
    pub source_raw_path: String,
    /// `None` when the container could not be resolved.
    pub target: Option<ResolvedTarget>,
    pub local_path: Option<PathBuf>,
    /// The local file name differs from the blob's name because of a collision.
    pub renamed: bool,
    pub outcome: Outcome,
}

impl DownloadResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

#[derive(Clone, Debug)]
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub rename_on_collision: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            dry_run: false,
            rename_on_collision: true,
        }
    }
}
