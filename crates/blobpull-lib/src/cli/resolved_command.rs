use super::args::{CONNECTION_STRING_ENV, DownloadRequest};
use super::params::DownloadParams;
use crate::config::{Config, load_config};
use crate::download::DownloadOptions;
use crate::error::BlobPullError;
use crate::paths::{PathSources, collect_paths, parse_delimiter};
use std::path::{Path, PathBuf};

/// Merges the request with the optional config file, reads the path list and
/// checks everything that must hold before any download starts.
pub fn resolve_request(request: DownloadRequest) -> Result<DownloadParams, BlobPullError> {
    let app_config = match &request.config_path {
        Some(config_path) => {
            tracing::info!("Loading configuration from {}", config_path);
            load_config(config_path)?
        }
        None => Config::default(),
    };

    let delimiter = request
        .delimiter
        .as_deref()
        .or(app_config.delimiter.as_deref())
        .unwrap_or(",");
    let delimiter = parse_delimiter(delimiter)?;

    let paths = collect_paths(&PathSources {
        positional: &request.paths,
        flagged: &request.flagged_paths,
        list_file: request.list_file.as_deref().map(Path::new),
        delimiter,
    })?;

    let container = request.container.or(app_config.container);
    if container.as_deref().is_some_and(str::is_empty) {
        return Err(BlobPullError::Usage {
            details: "Container name must not be empty.".to_string(),
        });
    }

    let connection_string = request.connection_string.filter(|key| !key.trim().is_empty());
    if connection_string.is_none() && !request.dry_run {
        return Err(BlobPullError::Usage {
            details: format!(
                "No connection key to access Azure Storage provided. Pass --key or set {CONNECTION_STRING_ENV}."
            ),
        });
    }

    let output_dir = request
        .output_dir
        .map(PathBuf::from)
        .or(app_config.output)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(DownloadParams {
        paths,
        container,
        transform: request.transform.then_some(app_config.transform),
        connection_string,
        options: DownloadOptions {
            output_dir,
            dry_run: request.dry_run,
            rename_on_collision: !request.no_rename,
        },
    })
}
