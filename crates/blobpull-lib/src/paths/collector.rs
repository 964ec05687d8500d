use crate::error::BlobPullError;
use itertools::Itertools;
use std::path::Path;

/// Every place a raw blob path can come from on a single invocation.
#[derive(Clone, Debug, Default)]
pub struct PathSources<'a> {
    pub positional: &'a [String],
    pub flagged: &'a [String],
    pub list_file: Option<&'a Path>,
    pub delimiter: u8,
}

/// Merges all sources into one list without duplicates.
///
/// Order is positional arguments first, then `--path` values, then list file
/// lines in file order. The first occurrence of a path wins.
pub fn collect_paths(sources: &PathSources<'_>) -> Result<Vec<String>, BlobPullError> {
    let from_file = match sources.list_file {
        Some(path) => read_list_file(path, sources.delimiter)?,
        None => Vec::new(),
    };

    let paths: Vec<String> = sources
        .positional
        .iter()
        .chain(sources.flagged.iter())
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .chain(from_file)
        .unique()
        .collect();

    if paths.is_empty() {
        return Err(BlobPullError::Usage {
            details: "No paths to download. Pass paths as arguments, with --path or with --file."
                .to_string(),
        });
    }

    tracing::debug!(count = paths.len(), "Collected paths");
    Ok(paths)
}

/// Reads one path per line. Files with a `.csv` extension are parsed as
/// delimited records and only the first field of each record is used.
pub fn read_list_file(path: &Path, delimiter: u8) -> Result<Vec<String>, BlobPullError> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    tracing::info!(file = %path.display(), csv = is_csv, "Reading path list");
    let entries = if is_csv {
        read_csv_first_fields(path, delimiter)?
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| input_error(path, e))?
            .lines()
            .map(str::to_string)
            .collect()
    };

    Ok(entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect())
}

fn read_csv_first_fields(path: &Path, delimiter: u8) -> Result<Vec<String>, BlobPullError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| input_error(path, e))?;

    let mut fields = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| input_error(path, e))?;
        if let Some(first) = record.get(0) {
            fields.push(first.to_string());
        }
    }
    Ok(fields)
}

pub fn parse_delimiter(delimiter: &str) -> Result<u8, BlobPullError> {
    match delimiter.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(BlobPullError::Usage {
            details: format!("Delimiter must be a single ASCII character, got '{delimiter}'."),
        }),
    }
}

fn input_error(path: &Path, err: impl std::fmt::Display) -> BlobPullError {
    BlobPullError::Input {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
