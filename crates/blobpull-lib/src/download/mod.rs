#[allow(clippy::module_inception)]
mod download;
mod filesystem;
mod output_path;
mod summary;
mod types;

pub use download::Downloader;
pub use filesystem::{Filesystem, LocalFilesystem, PartFile, StagedFile};
pub use output_path::{Placement, local_file_name, place_output};
pub use summary::{FailedEntry, RunSummary};
pub use types::{DownloadOptions, DownloadResult, Outcome};
