use std::path::{Path, PathBuf};

/// The final segment of `blob_path`, if it can be used as a file name.
pub fn local_file_name(blob_path: &str) -> Option<&str> {
    match blob_path.rsplit('/').next() {
        Some("" | "." | "..") | None => None,
        Some(name) => Some(name),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// The blob's own name is free.
    Free(PathBuf),
    /// The blob's name was taken, this is the first free numbered variant.
    Renamed(PathBuf),
    /// The blob's name was taken and renaming is disabled.
    Taken(PathBuf),
}

/// Picks where `file_name` lands inside `output_dir`. Taken names get a
/// `_N` suffix before the extension: `file.pdf`, `file_1.pdf`, `file_2.pdf`...
pub fn place_output(
    output_dir: &Path,
    file_name: &str,
    rename_on_collision: bool,
    is_taken: impl Fn(&Path) -> bool,
) -> Placement {
    let candidate = output_dir.join(file_name);
    if !is_taken(&candidate) {
        return Placement::Free(candidate);
    }
    if !rename_on_collision {
        return Placement::Taken(candidate);
    }

    let (stem, extension) = split_extension(file_name);
    let mut counter = 1usize;
    loop {
        let candidate = output_dir.join(format!("{stem}_{counter}{extension}"));
        if !is_taken(&candidate) {
            return Placement::Renamed(candidate);
        }
        counter += 1;
    }
}

/// Splits at the last dot, keeping the dot with the extension. A leading dot
/// does not start an extension.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_local_file_name() {
        assert_eq!(local_file_name("folder/file.pdf"), Some("file.pdf"));
        assert_eq!(local_file_name("file.pdf"), Some("file.pdf"));
        assert_eq!(local_file_name("folder/"), None);
        assert_eq!(local_file_name("folder/.."), None);
        assert_eq!(local_file_name("."), None);
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("file.pdf"), ("file", ".pdf"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
    }

    #[test]
    fn test_free_name_is_used_as_is() {
        let placement = place_output(Path::new("out"), "file.pdf", true, |_| false);
        assert_eq!(placement, Placement::Free(PathBuf::from("out/file.pdf")));
    }

    #[test]
    fn test_taken_name_gets_first_free_counter() {
        let taken: HashSet<PathBuf> = ["out/file.pdf", "out/file_1.pdf"]
            .into_iter()
            .map(PathBuf::from)
            .collect();

        let placement = place_output(Path::new("out"), "file.pdf", true, |p| taken.contains(p));

        assert_eq!(placement, Placement::Renamed(PathBuf::from("out/file_2.pdf")));
    }

    #[test]
    fn test_taken_name_without_rename() {
        let placement = place_output(Path::new("out"), "file.pdf", false, |_| true);
        assert_eq!(placement, Placement::Taken(PathBuf::from("out/file.pdf")));
    }
}
