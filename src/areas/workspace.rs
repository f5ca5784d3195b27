use crate::areas::repository::REPOSITORY_DIR;
use crate::artifacts::index::index_entry::EntryMetadata;
use crate::errors::{Error, IoContext, Result};
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// The working tree: every file under the repository root except the
/// repository directory itself.
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Expand a path into the files below it, relative to the root and sorted.
    ///
    /// `None` lists the whole workspace; a file lists just itself.
    pub fn list_files(&self, root_file_path: Option<&Path>) -> Result<Vec<PathBuf>> {
        let root_file_path = match root_file_path {
            Some(path) => self.path.join(self.relativize(path)?),
            None => self.path.to_path_buf(),
        };
        let root_file_path = root_file_path
            .canonicalize()
            .with_path(&root_file_path)?;

        let relative = self.strip_root(&root_file_path)?;
        if Self::is_ignored(&relative) {
            return Err(Error::InvalidInput(format!(
                "'{}' is inside the repository directory",
                relative.display()
            )));
        }

        if !root_file_path.is_dir() {
            return Ok(vec![relative]);
        }

        let mut files = WalkDir::new(&root_file_path)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != REPOSITORY_DIR)
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| self.strip_root(entry.path()))
            .collect::<Result<Vec<_>>>()?;
        files.sort();

        Ok(files)
    }

    /// Turn a user-supplied path into one relative to the workspace root.
    ///
    /// Absolute paths must point inside the root; `.` components are dropped.
    pub fn relativize(&self, path: &Path) -> Result<PathBuf> {
        let relative = if path.is_absolute() {
            // a missing file cannot be canonicalized, fall back to the path as given
            let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            self.strip_root(&canonical)?
        } else {
            path.to_path_buf()
        };

        Ok(relative
            .components()
            .filter(|component| !matches!(component, Component::CurDir))
            .collect())
    }

    pub fn stat_file(&self, file_path: &Path) -> Result<EntryMetadata> {
        let metadata = std::fs::metadata(self.path.join(file_path)).with_path(file_path)?;

        EntryMetadata::try_from(&metadata)
    }

    pub fn open_file(&self, file_path: &Path) -> Result<File> {
        File::open(self.path.join(file_path)).with_path(file_path)
    }

    fn strip_root(&self, path: &Path) -> Result<PathBuf> {
        path.strip_prefix(&self.path)
            .map(Path::to_path_buf)
            .map_err(|_| {
                Error::InvalidInput(format!(
                    "'{}' is outside the repository at '{}'",
                    path.display(),
                    self.path.display()
                ))
            })
    }

    fn is_ignored(path: &Path) -> bool {
        path.components()
            .any(|component| component.as_os_str() == REPOSITORY_DIR)
    }
}
