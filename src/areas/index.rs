//! Staging area
//!
//! The index tracks which files go into the next commit. It is persisted as
//! a plain-text ledger, one staged file per line (see
//! [`crate::artifacts::index`] for the line format), and rewritten in full
//! after every mutation.
//!
//! ## Data Structures
//!
//! - `entries`: Maps file paths to their index entries
//! - `children`: Maps directory paths to the staged files below them, so a
//!   directory can be unstaged or replaced by a file in one step

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::errors::{IoContext, Result};
use fake::rand;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Staging area
///
/// Holds the staged files in memory, keyed and ordered by path.
#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the ledger file (typically `.kit/index`)
    path: Box<Path>,
    /// Tracked files mapped by path
    entries: BTreeMap<Box<Path>, IndexEntry>,
    /// Directory hierarchy for parent-child lookups
    children: BTreeMap<Box<Path>, BTreeSet<Box<Path>>>,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Check if a path is tracked, either as a file or as a directory with
    /// tracked files below it.
    pub fn is_directly_tracked(&self, path: &Path) -> bool {
        self.entries.contains_key(path) || self.children.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
    }

    /// Load the ledger from disk, replacing whatever is in memory.
    ///
    /// A missing ledger is an empty index. Lines that do not parse are logged
    /// and skipped so one damaged entry does not hide the rest.
    pub fn load(&mut self) -> Result<()> {
        self.clear();

        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e).with_path(&self.path),
        };

        for (line_number, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line.with_path(&self.path)?;
            if line.is_empty() {
                continue;
            }

            match IndexEntry::deserialize(&line[..]) {
                Ok(entry) => {
                    for displaced in self.discard_conflicts(&entry) {
                        tracing::warn!(
                            index = %self.path.display(),
                            line = line_number + 1,
                            kept = %entry.name.display(),
                            dropped = %displaced.name.display(),
                            "index entry conflicts with an earlier one"
                        );
                    }
                    self.store_entry(entry);
                }
                Err(e) => tracing::warn!(
                    index = %self.path.display(),
                    line = line_number + 1,
                    error = %e,
                    "skipping malformed index entry"
                ),
            }
        }

        tracing::debug!(entries = self.entries.len(), "loaded index");

        Ok(())
    }

    /// Stage one workspace file and persist the index.
    ///
    /// `path` is relative to the workspace root.
    pub fn stage(
        &mut self,
        workspace: &Workspace,
        database: &Database,
        path: &Path,
    ) -> Result<IndexEntry> {
        let entry = self.add_file(workspace, database, path)?;
        self.save()?;

        Ok(entry)
    }

    /// Store a workspace file's content and record it, without persisting.
    pub fn add_file(
        &mut self,
        workspace: &Workspace,
        database: &Database,
        path: &Path,
    ) -> Result<IndexEntry> {
        IndexEntry::validate_name(path)?;

        let metadata = workspace.stat_file(path)?;
        let oid = database.put_reader(workspace.open_file(path)?)?;

        let entry = IndexEntry::new(path.to_path_buf(), oid, metadata);
        self.add(entry.clone());
        tracing::debug!(path = %path.display(), oid = %entry.oid, "staged file");

        Ok(entry)
    }

    /// Remove a file, or every file below a directory, and persist the index.
    ///
    /// Unstaging something that is not staged is not an error.
    pub fn unstage(&mut self, path: &Path) -> Result<()> {
        self.remove(path);
        self.save()
    }

    /// Insert or replace an entry.
    ///
    /// A staged file that shares a name with a staged directory (or with one
    /// of the new entry's parent directories) is dropped first.
    pub fn add(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry);
        self.store_entry(entry);
    }

    pub fn remove(&mut self, path: &Path) {
        self.remove_entry(path);
        self.remove_children(path);
    }

    /// Rewrite the whole ledger, sorted by path.
    ///
    /// The new content goes to a temp file next to the ledger and is renamed
    /// over it, so readers see either the old or the new index.
    pub fn save(&self) -> Result<()> {
        let mut content = Vec::new();
        for entry in self.entries() {
            content.extend_from_slice(&entry.serialize()?);
            content.push(b'\n');
        }

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).with_path(parent)?;

        let temp_path = parent.join(format!("index-{}.tmp", rand::random::<u32>()));
        let written = std::fs::File::create(&temp_path)
            .and_then(|mut file| file.write_all(&content))
            .with_path(&temp_path)
            .and_then(|_| std::fs::rename(&temp_path, &self.path).with_path(&self.path));
        if written.is_err() {
            let _ = std::fs::remove_file(&temp_path);
        }
        written?;

        tracing::debug!(entries = self.entries.len(), "saved index");

        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn into_entries(self) -> impl Iterator<Item = IndexEntry> {
        self.entries.into_values()
    }

    /// Drop entries that `entry` cannot coexist with and return them.
    fn discard_conflicts(&mut self, entry: &IndexEntry) -> Vec<IndexEntry> {
        let mut displaced = entry
            .parent_dirs()
            .into_iter()
            .filter_map(|parent| self.remove_entry(parent))
            .collect::<Vec<_>>();
        displaced.extend(self.remove_children(&entry.name));

        displaced
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        let entry_key = entry.name.clone().into_boxed_path();

        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_path_buf().into_boxed_path())
                .or_default()
                .insert(entry_key.clone());
        }

        self.entries.insert(entry_key, entry);
    }

    fn remove_children(&mut self, path: &Path) -> Vec<IndexEntry> {
        self.children
            .remove(path)
            .into_iter()
            .flatten()
            .filter_map(|child| self.remove_entry(&child))
            .collect()
    }

    fn remove_entry(&mut self, path: &Path) -> Option<IndexEntry> {
        let entry = self.entries.remove(path)?;

        for parent in entry.parent_dirs() {
            if let Some(children) = self.children.get_mut(parent) {
                children.remove(path);
                if children.is_empty() {
                    self.children.remove(parent);
                }
            }
        }

        Some(entry)
    }
}
