use log::debug;
use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// associating a extension with a enum
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum FileType {
    Npz,
    Json,
    H5,
    Unknown,
}
impl FileType {
    pub fn value(&self) -> &'static [&'static str] {
        match self {
            Self::Npz => &["npz"],
            Self::Json => &["json"],
            Self::H5 => &["h5", "hdf5"],
            Self::Unknown => &[""],
        }
    }
    pub fn find_match(ext: &str) -> Self {
        Self::iter()
            .find(|filetype| filetype.value().contains(&(ext.to_lowercase()).as_str()))
            .unwrap_or(FileType::Unknown)
    }
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(FileType::Unknown, Self::find_match)
    }
}

/// A file that only shows up at its destination once ``commit`` is called.
/// Everything is written to a temporary sibling of the destination which gets
/// removed if the ``AtomicFile`` is dropped without committing, so a failed
/// conversion never leaves a partial artifact behind.
pub struct AtomicFile {
    tmp: NamedTempFile,
    dest: PathBuf,
}
impl AtomicFile {
    /// # Errors
    /// Will return an error if the temporary file cannot be created next to
    /// ``dest``
    pub fn new(dest: &Path) -> io::Result<Self> {
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        debug!("staging {} in {}", dest.display(), tmp.path().display());
        Ok(Self {
            tmp,
            dest: dest.to_path_buf(),
        })
    }
    /// Path of the staging file, for writers that need to open the file
    /// themselves
    pub fn staging_path(&self) -> &Path {
        self.tmp.path()
    }
    pub fn destination(&self) -> &Path {
        &self.dest
    }
    pub fn as_file_mut(&mut self) -> &mut File {
        self.tmp.as_file_mut()
    }
    /// Moves the staging file over the destination
    /// # Errors
    /// Will return an error if the file cannot be synced or renamed
    pub fn commit(self) -> io::Result<()> {
        self.tmp.as_file().sync_all()?;
        self.tmp.persist(&self.dest).map_err(|e| e.error)?;
        Ok(())
    }
}
