use super::filesystem::{Filesystem, StagedFile};
use super::output_path::{Placement, local_file_name, place_output};
use super::types::{DownloadOptions, DownloadResult, Outcome};
use crate::error::BlobPullError;
use crate::paths::{ResolutionError, ResolvedTarget};
use crate::storage::{BlobStore, FetchError};
use futures::StreamExt;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};

enum Failure {
    /// Would repeat for every remaining target.
    Abort(FetchError),
    Target(String),
}

impl From<FetchError> for Failure {
    fn from(err: FetchError) -> Self {
        if err.is_fatal() {
            Failure::Abort(err)
        } else {
            Failure::Target(err.to_string())
        }
    }
}

fn write_failure(path: &Path, err: std::io::Error) -> Failure {
    Failure::Target(format!("failed to write {}: {}", path.display(), err))
}

/// Downloads targets one at a time into the output directory.
///
/// Output names handed out during the run are remembered, so a dry run makes
/// the same rename and skip decisions a real run would.
pub struct Downloader<'a, S: BlobStore + ?Sized, F: Filesystem + ?Sized> {
    store: &'a S,
    fs: &'a F,
    options: &'a DownloadOptions,
    claimed: HashSet<PathBuf>,
}

impl<'a, S: BlobStore + ?Sized, F: Filesystem + ?Sized> Downloader<'a, S, F> {
    pub fn new(store: &'a S, fs: &'a F, options: &'a DownloadOptions) -> Self {
        Self {
            store,
            fs,
            options,
            claimed: HashSet::new(),
        }
    }

    /// Processes every entry in order. Per-target failures are recorded in the
    /// results; only storage failures that would repeat for every remaining
    /// target abort the run.
    pub async fn run(
        &mut self,
        targets: Vec<Result<ResolvedTarget, ResolutionError>>,
    ) -> Result<Vec<DownloadResult>, BlobPullError> {
        info!(
            count = targets.len(),
            output = %self.options.output_dir.display(),
            dry_run = self.options.dry_run,
            "Downloading {} file paths from Azure Storage...",
            targets.len()
        );

        if !self.options.dry_run {
            let output_dir = &self.options.output_dir;
            self.fs
                .create_dir_all(output_dir)
                .map_err(|e| BlobPullError::OutputDirectoryCreation {
                    path: output_dir.clone(),
                    reason: e.to_string(),
                })?;
        }

        let mut results = Vec::with_capacity(targets.len());
        for entry in targets {
            let result = match entry {
                Ok(target) => self.download_target(target).await?,
                Err(err) => {
                    error!(source = %err.path(), "{}", err);
                    DownloadResult {
                        source_raw_path: err.path().to_string(),
                        target: None,
                        local_path: None,
                        renamed: false,
                        outcome: Outcome::Failed {
                            detail: err.to_string(),
                        },
                    }
                }
            };
            results.push(result);
        }
        Ok(results)
    }

    async fn download_target(
        &mut self,
        target: ResolvedTarget,
    ) -> Result<DownloadResult, BlobPullError> {
        let mut result = DownloadResult {
            source_raw_path: target.source_raw_path.clone(),
            target: None,
            local_path: None,
            renamed: false,
            outcome: Outcome::Success,
        };

        let Some(file_name) = local_file_name(&target.blob_path) else {
            let detail = format!("'{}' has no file name to save as", target.blob_path);
            error!(container = %target.container, blob = %target.blob_path, "{}", detail);
            result.outcome = Outcome::Failed { detail };
            result.target = Some(target);
            return Ok(result);
        };

        let placement = place_output(
            &self.options.output_dir,
            file_name,
            self.options.rename_on_collision,
            |path| self.is_taken(path),
        );
        let output_path = match placement {
            Placement::Free(path) => path,
            Placement::Renamed(path) => {
                result.renamed = true;
                path
            }
            Placement::Taken(path) => {
                info!(
                    container = %target.container,
                    blob = %target.blob_path,
                    output = %path.display(),
                    "Output file already exists, skipping"
                );
                result.local_path = Some(path);
                result.outcome = Outcome::Skipped;
                result.target = Some(target);
                return Ok(result);
            }
        };
        self.claimed.insert(output_path.clone());
        result.local_path = Some(output_path.clone());

        if self.options.dry_run {
            info!(
                container = %target.container,
                blob = %target.blob_path,
                output = %output_path.display(),
                "Would download"
            );
            result.target = Some(target);
            return Ok(result);
        }

        result.outcome = match self.fetch_and_write(&target, &output_path).await {
            Ok(()) => {
                info!(
                    container = %target.container,
                    blob = %target.blob_path,
                    output = %output_path.display(),
                    "Downloaded"
                );
                Outcome::Success
            }
            Err(Failure::Target(detail)) => {
                error!(container = %target.container, blob = %target.blob_path, "{}", detail);
                Outcome::Failed { detail }
            }
            Err(Failure::Abort(err)) => {
                error!(container = %target.container, blob = %target.blob_path, "{}", err);
                return Err(err.into());
            }
        };
        result.target = Some(target);
        Ok(result)
    }

    /// Streams the blob into a staging file next to `output_path` and moves it
    /// into place once the last chunk is written.
    async fn fetch_and_write(
        &self,
        target: &ResolvedTarget,
        output_path: &Path,
    ) -> Result<(), Failure> {
        let mut chunks = self
            .store
            .open_blob(&target.container, &target.blob_path)
            .await?;
        let mut staged = self
            .fs
            .stage(output_path)
            .map_err(|e| write_failure(output_path, e))?;

        while let Some(chunk) = chunks.next().await {
            for bytes in chunk? {
                staged
                    .write_all(&bytes)
                    .map_err(|e| write_failure(output_path, e))?;
            }
        }

        staged.commit().map_err(|e| write_failure(output_path, e))
    }

    fn is_taken(&self, path: &Path) -> bool {
        self.claimed.contains(path) || self.fs.exists(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::LocalFilesystem;
    use crate::storage::{BlobChunks, classify_error};
    use async_trait::async_trait;
    use futures::stream;
    use opendal::Buffer;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeStore {
        blobs: HashMap<(String, String), Vec<u8>>,
        /// Errors raised after the blob's first chunk has been handed out.
        failures: HashMap<(String, String), FetchError>,
        reject_credentials: bool,
        calls: AtomicUsize,
    }

    impl FakeStore {
        fn with_blob(mut self, container: &str, blob_path: &str, contents: &[u8]) -> Self {
            self.blobs.insert(
                (container.to_string(), blob_path.to_string()),
                contents.to_vec(),
            );
            self
        }

        fn with_failure(mut self, container: &str, blob_path: &str, err: FetchError) -> Self {
            self.failures
                .insert((container.to_string(), blob_path.to_string()), err);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BlobStore for FakeStore {
        async fn open_blob(&self, container: &str, blob_path: &str) -> Result<BlobChunks, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject_credentials {
                return Err(FetchError::Auth {
                    reason: "Server failed to authenticate the request".to_string(),
                });
            }
            let key = (container.to_string(), blob_path.to_string());
            if let Some(err) = self.failures.get(&key) {
                let chunks = vec![Ok(Buffer::from(b"partial".to_vec())), Err(err.clone())];
                return Ok(stream::iter(chunks).boxed());
            }
            let contents = self.blobs.get(&key).cloned().ok_or_else(|| FetchError::NotFound {
                container: container.to_string(),
                blob_path: blob_path.to_string(),
            })?;
            let (head, tail) = contents.split_at(contents.len() / 2);
            let chunks = vec![Ok(Buffer::from(head.to_vec())), Ok(Buffer::from(tail.to_vec()))];
            Ok(stream::iter(chunks).boxed())
        }
    }

    fn target(container: &str, blob_path: &str) -> Result<ResolvedTarget, ResolutionError> {
        Ok(ResolvedTarget {
            container: container.to_string(),
            blob_path: blob_path.to_string(),
            source_raw_path: format!("{container}/{blob_path}"),
        })
    }

    fn options(output_dir: &Path) -> DownloadOptions {
        DownloadOptions {
            output_dir: output_dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_downloads_blob_into_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default().with_blob("container1", "folder/file.pdf", b"%PDF");
        let options = options(dir.path());

        let results = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("container1", "folder/file.pdf")])
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].outcome, Outcome::Success);
        assert_eq!(results[0].local_path, Some(dir.path().join("file.pdf")));
        assert_eq!(std::fs::read(dir.path().join("file.pdf")).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_same_name_twice_is_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default()
            .with_blob("a", "docs/report.pdf", b"first")
            .with_blob("b", "docs/report.pdf", b"second");
        let options = options(dir.path());

        let results = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("a", "docs/report.pdf"), target("b", "docs/report.pdf")])
            .await
            .unwrap();

        assert!(results.iter().all(|r| r.outcome == Outcome::Success));
        assert!(!results[0].renamed);
        assert!(results[1].renamed);
        assert_eq!(std::fs::read(dir.path().join("report.pdf")).unwrap(), b"first");
        assert_eq!(std::fs::read(dir.path().join("report_1.pdf")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_no_rename_skips_and_leaves_original_untouched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.pdf"), b"original").unwrap();
        let store = FakeStore::default().with_blob("a", "docs/report.pdf", b"remote");
        let options = DownloadOptions {
            rename_on_collision: false,
            ..options(dir.path())
        };

        let results = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("a", "docs/report.pdf")])
            .await
            .unwrap();

        assert_eq!(results[0].outcome, Outcome::Skipped);
        assert_eq!(store.calls(), 0);
        assert_eq!(std::fs::read(dir.path().join("report.pdf")).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing_but_reports_the_same_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("out");
        let store = FakeStore::default();
        let options = DownloadOptions {
            dry_run: true,
            ..options(&output_dir)
        };

        let results = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("a", "x/file.txt"), target("b", "y/file.txt")])
            .await
            .unwrap();

        assert_eq!(store.calls(), 0);
        assert!(!output_dir.exists());
        assert!(results.iter().all(|r| r.outcome == Outcome::Success));
        assert_eq!(results[1].local_path, Some(output_dir.join("file_1.txt")));
        assert!(results[1].renamed);
    }

    #[tokio::test]
    async fn test_dry_run_without_rename_skips_claimed_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        let options = DownloadOptions {
            dry_run: true,
            rename_on_collision: false,
            ..options(dir.path())
        };

        let results = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("a", "x/file.txt"), target("b", "y/file.txt")])
            .await
            .unwrap();

        assert_eq!(results[0].outcome, Outcome::Success);
        assert_eq!(results[1].outcome, Outcome::Skipped);
    }

    #[tokio::test]
    async fn test_missing_blob_fails_target_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default().with_blob("a", "present.txt", b"here");
        let options = options(dir.path());

        let results = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("a", "missing.txt"), target("a", "present.txt")])
            .await
            .unwrap();

        assert!(results[0].is_failed());
        assert!(!dir.path().join("missing.txt").exists());
        assert_eq!(results[1].outcome, Outcome::Success);
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_rejected_credentials_abort_after_first_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore {
            reject_credentials: true,
            ..Default::default()
        };
        let options = options(dir.path());

        let result = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("a", "1.txt"), target("a", "2.txt"), target("a", "3.txt")])
            .await;

        assert!(matches!(
            result,
            Err(BlobPullError::Storage(FetchError::Auth { .. }))
        ));
        assert_eq!(store.calls(), 1);
        assert!(!dir.path().join("1.txt").exists());
    }

    #[tokio::test]
    async fn test_resolution_errors_fail_only_their_target() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default().with_blob("a", "ok.txt", b"ok");
        let options = options(dir.path());

        let results = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![
                Err(ResolutionError::NoSeparator {
                    path: "no-separator".to_string(),
                }),
                target("a", "ok.txt"),
            ])
            .await
            .unwrap();

        assert!(results[0].is_failed());
        assert_eq!(results[0].source_raw_path, "no-separator");
        assert!(results[0].target.is_none());
        assert_eq!(results[1].outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_blob_path_without_file_name_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default();
        let options = options(dir.path());

        let results = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("a", "folder/..")])
            .await
            .unwrap();

        assert!(results[0].is_failed());
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_server_error_fails_one_blob_and_the_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let busy = opendal::Error::new(opendal::ErrorKind::Unexpected, "ServerBusy").set_temporary();
        let store = FakeStore::default()
            .with_failure("a", "busy.txt", classify_error(busy, "a", "busy.txt"))
            .with_blob("a", "fine.txt", b"fine");
        let options = options(dir.path());

        let results = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("a", "busy.txt"), target("a", "fine.txt")])
            .await
            .unwrap();

        assert!(results[0].is_failed());
        assert_eq!(results[1].outcome, Outcome::Success);
        assert_eq!(std::fs::read(dir.path().join("fine.txt")).unwrap(), b"fine");
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_interrupted_stream_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default().with_failure(
            "a",
            "big.bin",
            FetchError::Other {
                container: "a".to_string(),
                blob_path: "big.bin".to_string(),
                reason: "unexpected end of body".to_string(),
            },
        );
        let options = options(dir.path());

        let results = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("a", "big.bin")])
            .await
            .unwrap();

        assert!(results[0].is_failed());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_lost_connection_mid_stream_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeStore::default()
            .with_failure(
                "a",
                "1.txt",
                FetchError::Connection {
                    reason: "connection reset".to_string(),
                },
            )
            .with_blob("a", "2.txt", b"two");
        let options = options(dir.path());

        let result = Downloader::new(&store, &LocalFilesystem, &options)
            .run(vec![target("a", "1.txt"), target("a", "2.txt")])
            .await;

        assert!(matches!(
            result,
            Err(BlobPullError::Storage(FetchError::Connection { .. }))
        ));
        assert_eq!(store.calls(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
