//! Index entry representation
//!
//! Each entry in the index represents a staged file with:
//! - File path relative to the repository root
//! - Content hash (object ID of the stored blob)
//! - File metadata (size, modification time, mode)

use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::{FIELD_COUNT, FIELD_SEPARATOR};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, Result};
use bytes::Bytes;
use derive_new::new;
use std::fs::Metadata;
use std::io::BufRead;
use std::path::{Component, Path, PathBuf};

/// Index entry representing a staged file
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// File path relative to repository root
    pub name: PathBuf,
    /// SHA-1 hash of file content
    pub oid: ObjectId,
    /// File metadata (size, mtime, mode)
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    /// Check that a path can be stored in the index and in tree objects.
    ///
    /// The path must be relative, made only of normal UTF-8 components, and
    /// free of line breaks and NUL bytes.
    pub fn validate_name(name: &Path) -> Result<()> {
        let invalid = |reason: &str| {
            Error::InvalidInput(format!("path '{}' {}", name.display(), reason))
        };

        if name.as_os_str().is_empty() {
            return Err(invalid("is empty"));
        }

        for component in name.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| invalid("is not valid UTF-8"))?;
                    if part.contains(['\n', '\r', '\0']) {
                        return Err(invalid("contains a line break or NUL byte"));
                    }
                }
                _ => return Err(invalid("must be relative to the repository root")),
            }
        }

        Ok(())
    }

    /// Path segments from the repository root down to the file name.
    pub fn components(&self) -> Result<Vec<&str>> {
        self.name
            .components()
            .map(|component| match component {
                Component::Normal(part) => part.to_str().ok_or_else(|| {
                    Error::InvalidInput(format!("path '{}' is not valid UTF-8", self.name.display()))
                }),
                _ => Err(Error::InvalidInput(format!(
                    "path '{}' must be relative to the repository root",
                    self.name.display()
                ))),
            })
            .collect()
    }

    pub fn basename(&self) -> Result<&str> {
        self.name
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidInput(format!("invalid file name {:?}", self.name)))
    }

    /// Every ancestor directory of the entry, outermost first.
    pub fn parent_dirs(&self) -> Vec<&Path> {
        let mut dirs = self
            .name
            .ancestors()
            .skip(1)
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect::<Vec<_>>();
        dirs.reverse();

        dirs
    }

    /// The path as stored in the ledger, always `/`-separated.
    pub fn key(&self) -> Result<String> {
        Ok(self.components()?.join("/"))
    }
}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// File metadata stored in index entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    /// File size in bytes
    pub size: u64,
    /// Modification time (milliseconds since Unix epoch)
    pub mtime: i64,
    /// File mode
    pub mode: EntryMode,
}

impl TryFrom<&Metadata> for EntryMetadata {
    type Error = Error;

    fn try_from(metadata: &Metadata) -> Result<Self> {
        if metadata.is_dir() {
            return Err(Error::InvalidInput(
                "directories cannot be staged as files".to_string(),
            ));
        }

        let mtime = metadata
            .modified()
            .map(|modified| chrono::DateTime::<chrono::Utc>::from(modified).timestamp_millis())
            .unwrap_or_default();

        Ok(Self {
            size: metadata.len(),
            mtime,
            mode: EntryMode::Regular,
        })
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> Result<Bytes> {
        let line = format!(
            "{}{sep}{}{sep}{}{sep}{}{sep}{}",
            self.key()?,
            self.oid,
            self.metadata.size,
            self.metadata.mtime,
            self.metadata.mode.as_str(),
            sep = FIELD_SEPARATOR,
        );

        Ok(Bytes::from(line))
    }
}

impl Unpackable for IndexEntry {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let malformed = |reason: String| Error::malformed("index", reason);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| malformed(format!("unreadable entry: {e}")))?;
        let line = line.trim_end_matches(['\n', '\r']);

        // the path may contain the separator, every other field may not
        let mut fields = line.rsplitn(FIELD_COUNT, FIELD_SEPARATOR).collect::<Vec<_>>();
        if fields.len() != FIELD_COUNT {
            return Err(malformed(format!(
                "expected {FIELD_COUNT} fields, found {} in '{line}'",
                fields.len()
            )));
        }
        fields.reverse();

        let name = PathBuf::from(fields[0]);
        Self::validate_name(&name).map_err(|e| malformed(e.to_string()))?;
        let oid = ObjectId::try_parse(fields[1].to_string()).map_err(|e| malformed(e.to_string()))?;
        let size = fields[2]
            .parse::<u64>()
            .map_err(|e| malformed(format!("invalid size '{}': {e}", fields[2])))?;
        let mtime = fields[3]
            .parse::<i64>()
            .map_err(|e| malformed(format!("invalid mtime '{}': {e}", fields[3])))?;
        let mode = EntryMode::from_octal_str(fields[4]).map_err(|e| malformed(e.to_string()))?;

        Ok(IndexEntry::new(name, oid, EntryMetadata { size, mtime, mode }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::hasher::Hasher;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn oid() -> ObjectId {
        Hasher::digest(b"test data")
    }

    #[fixture]
    fn entry_metadata() -> EntryMetadata {
        EntryMetadata {
            size: 9,
            mtime: 1_700_000_000_123,
            mode: EntryMode::Regular,
        }
    }

    #[rstest]
    fn test_entry_parent_dirs(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("a/b/c"), oid, entry_metadata);

        assert_eq!(entry.parent_dirs(), vec![Path::new("a"), Path::new("a/b")]);
        assert_eq!(entry.components().unwrap(), vec!["a", "b", "c"]);
    }

    #[rstest]
    fn test_entry_parent_dirs_root(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("a"), oid, entry_metadata);

        assert_eq!(entry.parent_dirs(), Vec::<&Path>::new());
    }

    #[rstest]
    fn test_entry_basename(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("a/b/c"), oid, entry_metadata);

        assert_eq!(entry.basename().unwrap(), "c");
    }

    #[rstest]
    fn test_ledger_line_format(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("dir/b.txt"), oid.clone(), entry_metadata);

        let line = entry.serialize().unwrap();
        assert_eq!(
            String::from_utf8(line.to_vec()).unwrap(),
            format!("dir/b.txt|{oid}|9|1700000000123|100644")
        );
    }

    #[rstest]
    fn test_path_may_contain_separator(oid: ObjectId, entry_metadata: EntryMetadata) {
        let entry = IndexEntry::new(PathBuf::from("odd|name.txt"), oid, entry_metadata);

        let line = entry.serialize().unwrap();
        let parsed = IndexEntry::deserialize(&line[..]).unwrap();
        assert_eq!(parsed, entry);
    }

    #[rstest]
    #[case("a.txt|abc|1|2|100644")]
    #[case("a.txt|da39a3ee5e6b4b0d3255bfef95601890afd80709|one|2|100644")]
    #[case("a.txt|da39a3ee5e6b4b0d3255bfef95601890afd80709|1|2|777")]
    #[case("a.txt|da39a3ee5e6b4b0d3255bfef95601890afd80709|1|2")]
    #[case("../escape|da39a3ee5e6b4b0d3255bfef95601890afd80709|1|2|100644")]
    #[case("")]
    fn test_malformed_lines_are_rejected(#[case] line: &str) {
        let err = IndexEntry::deserialize(line.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedObject { .. }));
    }

    #[rstest]
    #[case("/etc/passwd")]
    #[case("a/../b")]
    #[case("./a")]
    #[case("line\nbreak")]
    fn test_invalid_names(#[case] name: &str) {
        assert!(IndexEntry::validate_name(Path::new(name)).is_err());
    }
}
