mod args;
mod download;
mod params;
mod resolved_command;

pub use args::{Args, CONNECTION_STRING_ENV, DownloadRequest, parse_args};
pub use download::{execute_download, run_download};
pub use params::DownloadParams;
pub use resolved_command::resolve_request;
