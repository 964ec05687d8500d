use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A file being written next to its final path. Dropping it without calling
/// [`StagedFile::commit`] discards everything written so far.
pub trait StagedFile: Write {
    /// Moves the contents to the final path. Never replaces an existing file.
    fn commit(self) -> io::Result<()>;
}

/// The local side effects of a download.
pub trait Filesystem {
    type Staged: StagedFile;

    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Opens a staging file for `path`, so that `path` either does not exist
    /// or holds the complete contents.
    fn stage(&self, path: &Path) -> io::Result<Self::Staged>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFilesystem;

/// A `.part` temporary file in the destination directory.
#[derive(Debug)]
pub struct PartFile {
    part: NamedTempFile,
    path: PathBuf,
}

impl Write for PartFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.part.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.part.flush()
    }
}

impl StagedFile for PartFile {
    fn commit(mut self) -> io::Result<()> {
        self.part.flush()?;
        self.part.as_file().sync_all()?;
        self.part.persist_noclobber(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Filesystem for LocalFilesystem {
    type Staged = PartFile;

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn stage(&self, path: &Path) -> io::Result<PartFile> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let part = tempfile::Builder::new()
            .prefix(".blobpull-")
            .suffix(".part")
            .tempfile_in(dir)?;
        Ok(PartFile {
            part,
            path: path.to_path_buf(),
        })
    }
}
