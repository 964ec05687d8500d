use super::normalizer::TransformRules;
use super::types::{ResolutionError, ResolvedTarget};
use std::collections::HashSet;

/// Splits `container/blob/path` at the first `/`.
pub fn split_container(path: &str) -> Result<(&str, &str), ResolutionError> {
    let (container, blob_path) = path
        .split_once('/')
        .ok_or_else(|| ResolutionError::NoSeparator {
            path: path.to_string(),
        })?;

    if container.is_empty() {
        return Err(ResolutionError::EmptyContainer {
            path: path.to_string(),
        });
    }
    if blob_path.is_empty() {
        return Err(ResolutionError::EmptyBlobPath {
            path: path.to_string(),
        });
    }
    Ok((container, blob_path))
}

/// Resolves `path` (already normalized if normalization is enabled) into a
/// target. With `container` set the whole path is the blob path.
pub fn resolve_target(
    source_raw_path: &str,
    path: &str,
    container: Option<&str>,
) -> Result<ResolvedTarget, ResolutionError> {
    let (container, blob_path) = match container {
        Some(container) => {
            if path.is_empty() {
                return Err(ResolutionError::EmptyBlobPath {
                    path: source_raw_path.to_string(),
                });
            }
            (container, path)
        }
        None => split_container(path).map_err(|err| with_source_path(err, source_raw_path))?,
    };

    Ok(ResolvedTarget {
        container: container.to_string(),
        blob_path: blob_path.to_string(),
        source_raw_path: source_raw_path.to_string(),
    })
}

/// Normalizes (when `rules` is set) and resolves every collected path, in
/// order. Targets that resolve to a `(container, blob_path)` pair seen earlier
/// are dropped.
pub fn prepare_targets(
    raw_paths: &[String],
    rules: Option<&TransformRules>,
    container: Option<&str>,
) -> Vec<Result<ResolvedTarget, ResolutionError>> {
    let mut seen = HashSet::new();
    let mut prepared = Vec::with_capacity(raw_paths.len());

    for raw in raw_paths {
        let path = match rules {
            Some(rules) => rules.normalize(raw),
            None => raw.clone(),
        };

        match resolve_target(raw, &path, container) {
            Ok(target) => {
                if seen.insert((target.container.clone(), target.blob_path.clone())) {
                    tracing::trace!(
                        source = %raw,
                        container = %target.container,
                        blob = %target.blob_path,
                        "Resolved"
                    );
                    prepared.push(Ok(target));
                } else {
                    tracing::debug!(
                        source = %raw,
                        container = %target.container,
                        blob = %target.blob_path,
                        "Duplicate target after normalization, skipping"
                    );
                }
            }
            Err(err) => prepared.push(Err(err)),
        }
    }

    prepared
}

fn with_source_path(err: ResolutionError, source: &str) -> ResolutionError {
    let path = source.to_string();
    match err {
        ResolutionError::NoSeparator { .. } => ResolutionError::NoSeparator { path },
        ResolutionError::EmptyContainer { .. } => ResolutionError::EmptyContainer { path },
        ResolutionError::EmptyBlobPath { .. } => ResolutionError::EmptyBlobPath { path },
    }
}
