use super::params::DownloadParams;
use crate::download::{DownloadOptions, Downloader, Filesystem, LocalFilesystem, RunSummary};
use crate::error::BlobPullError;
use crate::paths::{ResolutionError, ResolvedTarget, prepare_targets};
use crate::storage::{BlobStore, OpendalBlobStore};
use itertools::Itertools;

pub async fn run_download(params: DownloadParams) -> Result<RunSummary, BlobPullError> {
    let DownloadParams {
        paths,
        container,
        transform,
        connection_string,
        options,
    } = params;

    let targets = prepare_targets(&paths, transform.as_ref(), container.as_deref());

    // A dry run never talks to storage, so it needs no credentials.
    let store = match connection_string {
        Some(connection_string) if !options.dry_run => {
            let containers = targets
                .iter()
                .filter_map(|t| t.as_ref().ok())
                .map(|t| t.container.as_str())
                .unique();
            OpendalBlobStore::azure(&connection_string, containers)?
        }
        _ => OpendalBlobStore::default(),
    };

    execute_download(targets, &options, &store, &LocalFilesystem).await
}

/// Downloads already resolved targets with the given storage and filesystem,
/// logs the summary and fails if any target failed.
pub async fn execute_download<S, F>(
    targets: Vec<Result<ResolvedTarget, ResolutionError>>,
    options: &DownloadOptions,
    store: &S,
    fs: &F,
) -> Result<RunSummary, BlobPullError>
where
    S: BlobStore + ?Sized,
    F: Filesystem + ?Sized,
{
    let results = Downloader::new(store, fs, options).run(targets).await?;

    let summary = RunSummary::from_results(&results);
    summary.log(options.dry_run);

    if summary.has_failures() {
        return Err(BlobPullError::TargetsFailed {
            failed: summary.failed.len(),
            total: summary.total,
        });
    }

    tracing::debug!("Download completed successfully");
    Ok(summary)
}
