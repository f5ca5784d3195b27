//! Tree object
//!
//! Trees represent directory snapshots. They contain entries for files (blobs)
//! and subdirectories (other trees), along with their names and modes.
//!
//! ## Format
//!
//! One line per entry, sorted by name:
//!
//! ```text
//! <octal mode> <kind> <oid>\t<name>\n
//! ```
//!
//! A tree with no entries serializes to zero bytes.
//!
//! ## Tree Building
//!
//! Staged paths are inserted segment by segment into a trie whose levels are
//! `BTreeMap`s, so a directory's entries come out in the same order whatever
//! order the index yields them in. Subtrees are stored before their parent,
//! since the parent embeds each child's ID.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::index::entry_mode::EntryMode;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::io::BufRead;

/// Node of a tree being built from the index
#[derive(Debug, Clone)]
enum TreeEntry {
    /// File entry (blob)
    File(IndexEntry),
    /// Directory entry (nested tree)
    Directory(Tree),
}

impl TreeEntry {
    fn object_type(&self) -> ObjectType {
        match self {
            TreeEntry::File(_) => ObjectType::Blob,
            TreeEntry::Directory(_) => ObjectType::Tree,
        }
    }

    fn mode(&self) -> EntryMode {
        match self {
            TreeEntry::File(entry) => entry.metadata.mode,
            TreeEntry::Directory(_) => EntryMode::Directory,
        }
    }
}

/// Tree object representing a directory snapshot
///
/// Trees maintain two sets of entries:
/// - `readable_entries`: For trees loaded from the database
/// - `writeable_entries`: For trees being built from the index
#[derive(Debug, Clone, Default)]
pub struct Tree {
    /// Entries loaded from database (read mode)
    readable_entries: BTreeMap<String, DatabaseEntry>,
    /// Entries being built (write mode)
    writeable_entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Build a tree from index entries
    ///
    /// Creates a hierarchical tree structure from a flat list of index entries.
    /// Files are organized into directories matching their path structure.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if a path is not a clean relative path, holds a
    /// line break or NUL byte, or if a name is used both as a file and as a
    /// directory.
    pub fn build<'e>(entries: impl IntoIterator<Item = &'e IndexEntry>) -> Result<Self> {
        let mut root = Self::default();

        for entry in entries {
            IndexEntry::validate_name(&entry.name)?;
            let segments = entry.components()?;
            let (_, parents) = segments
                .split_last()
                .ok_or_else(|| Error::InvalidInput("cannot build a tree from an empty path".into()))?;
            root.add_entry(parents, entry)?;
        }

        Ok(root)
    }

    /// Build the tree for a set of staged entries and store every level of it.
    ///
    /// Returns the root tree ID.
    pub fn build_from_index<'e>(
        entries: impl IntoIterator<Item = &'e IndexEntry>,
        database: &Database,
    ) -> Result<ObjectId> {
        Self::build(entries)?.store(database)
    }

    /// Store this tree and all of its subtrees, children first.
    ///
    /// Returns this tree's ID.
    pub fn store(&self, database: &Database) -> Result<ObjectId> {
        let content = self.write_entries(&mut |subtree| subtree.store(database))?;
        database.put(&content)
    }

    /// Insert `entry` below the directory chain `parents`, creating
    /// intermediate directories as needed.
    fn add_entry(&mut self, parents: &[&str], entry: &IndexEntry) -> Result<()> {
        let conflict = || {
            Error::InvalidInput(format!(
                "'{}' is staged both as a file and as a directory",
                entry.name.display()
            ))
        };

        match parents.split_first() {
            None => match self.writeable_entries.entry(entry.basename()?.to_string()) {
                Entry::Occupied(occupied) => match occupied.into_mut() {
                    TreeEntry::File(existing) => {
                        *existing = entry.clone();
                        Ok(())
                    }
                    TreeEntry::Directory(_) => Err(conflict()),
                },
                Entry::Vacant(vacant) => {
                    vacant.insert(TreeEntry::File(entry.clone()));
                    Ok(())
                }
            },
            Some((parent, rest)) => {
                let node = self
                    .writeable_entries
                    .entry(parent.to_string())
                    .or_insert_with(|| TreeEntry::Directory(Tree::default()));

                match node {
                    TreeEntry::Directory(tree) => tree.add_entry(rest, entry),
                    TreeEntry::File(_) => Err(conflict()),
                }
            }
        }
    }

    /// Serialize the entries being built, resolving each subtree's ID through
    /// `subtree_oid`.
    fn write_entries(
        &self,
        subtree_oid: &mut dyn FnMut(&Tree) -> Result<ObjectId>,
    ) -> Result<Bytes> {
        let mut content = String::new();

        for (name, tree_entry) in &self.writeable_entries {
            let oid = match tree_entry {
                TreeEntry::File(entry) => entry.oid.clone(),
                TreeEntry::Directory(tree) => subtree_oid(tree)?,
            };

            content.push_str(&entry_line(tree_entry.mode(), tree_entry.object_type(), &oid, name));
            content.push('\n');
        }

        Ok(Bytes::from(content))
    }

    /// Serialize entries read back from the database as they were stored.
    fn write_readable_entries(&self) -> Bytes {
        let mut content = String::new();

        for (name, entry) in &self.readable_entries {
            content.push_str(&entry_line(entry.mode, entry.object_type(), &entry.oid, name));
            content.push('\n');
        }

        Bytes::from(content)
    }

    pub fn is_empty(&self) -> bool {
        self.readable_entries.is_empty() && self.writeable_entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.readable_entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.readable_entries.into_iter()
    }

    pub fn entry(&self, name: &str) -> Option<&DatabaseEntry> {
        self.readable_entries.get(name)
    }
}

fn entry_line(mode: EntryMode, kind: ObjectType, oid: &ObjectId, name: &str) -> String {
    format!("{} {} {}\t{}", mode.as_str(), kind, oid, name)
}

impl Packable for Tree {
    fn serialize(&self) -> Result<Bytes> {
        // a tree loaded from the database has no entries being built
        if self.writeable_entries.is_empty() {
            return Ok(self.write_readable_entries());
        }

        self.write_entries(&mut |subtree| subtree.object_id())
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> Result<Self> {
        let mut entries = BTreeMap::new();

        for line in reader.lines() {
            let line = line.map_err(|e| Error::malformed("", format!("unreadable tree: {e}")))?;
            let malformed = |reason: &str| Error::malformed("", format!("{reason} in '{line}'"));

            let (header, name) = line.split_once('\t').ok_or_else(|| malformed("missing name"))?;
            let mut fields = header.split(' ');
            let (Some(mode), Some(kind), Some(oid), None) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return Err(malformed("expected mode, kind and object id"));
            };

            let mode = EntryMode::from_octal_str(mode).map_err(|_| malformed("invalid mode"))?;
            let kind = ObjectType::try_from(kind).map_err(|_| malformed("invalid kind"))?;
            let oid = ObjectId::try_parse(oid.to_string()).map_err(|_| malformed("invalid object id"))?;

            let entry = DatabaseEntry::new(oid, mode);
            if entry.object_type() != kind {
                return Err(malformed("mode does not match kind"));
            }
            if name.is_empty() || name.contains('/') {
                return Err(malformed("invalid entry name"));
            }
            if entries.insert(name.to_string(), entry).is_some() {
                return Err(malformed("duplicate entry name"));
            }
        }

        Ok(Tree {
            readable_entries: entries,
            writeable_entries: Default::default(),
        })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.readable_entries
            .iter()
            .map(|(name, entry)| entry_line(entry.mode, entry.object_type(), &entry.oid, name))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::index::index_entry::EntryMetadata;
    use crate::artifacts::objects::hasher::Hasher;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};
    use std::path::PathBuf;

    fn staged(path: &str, content: &str) -> IndexEntry {
        IndexEntry::new(
            PathBuf::from(path),
            Hasher::digest(content.as_bytes()),
            EntryMetadata {
                size: content.len() as u64,
                ..Default::default()
            },
        )
    }

    #[fixture]
    fn database() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        (dir, database)
    }

    fn read_tree(database: &Database, oid: &ObjectId) -> Tree {
        database.parse_object_as_tree(oid).unwrap()
    }

    #[rstest]
    fn empty_index_builds_the_empty_tree(database: (TempDir, Database)) {
        let (_dir, database) = database;

        let entries: [IndexEntry; 0] = [];
        let oid = Tree::build_from_index(&entries, &database).unwrap();

        assert_eq!(oid, Hasher::digest(b""));
        assert!(read_tree(&database, &oid).is_empty());
    }

    #[rstest]
    fn nested_paths_become_subtrees(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let entries = [staged("a.txt", "hi"), staged("dir/b.txt", "yo")];

        let root_oid = Tree::build_from_index(&entries, &database).unwrap();
        let root = read_tree(&database, &root_oid);

        let names = root.entries().map(|(name, _)| name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["a.txt", "dir"]);

        let a = root.entry("a.txt").unwrap();
        assert_eq!(a.object_type(), ObjectType::Blob);
        assert_eq!(a.oid, Hasher::digest(b"hi"));

        let dir = root.entry("dir").unwrap();
        assert_eq!(dir.object_type(), ObjectType::Tree);

        let subtree = read_tree(&database, &dir.oid);
        let sub_entries = subtree.entries().collect::<Vec<_>>();
        assert_eq!(sub_entries.len(), 1);
        assert_eq!(sub_entries[0].0, "b.txt");
        assert_eq!(sub_entries[0].1.oid, Hasher::digest(b"yo"));
    }

    #[rstest]
    fn deep_nesting_creates_one_tree_per_level(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let entries = [staged("a/b/c/d.txt", "deep")];

        let mut oid = Tree::build_from_index(&entries, &database).unwrap();
        for expected in ["a", "b", "c"] {
            let tree = read_tree(&database, &oid);
            let (name, entry) = tree.entries().next().unwrap();
            assert_eq!(name, expected);
            assert!(entry.is_tree());
            oid = entry.oid.clone();
        }

        let leaf = read_tree(&database, &oid);
        assert_eq!(leaf.entry("d.txt").unwrap().oid, Hasher::digest(b"deep"));
    }

    #[rstest]
    fn identical_subdirectories_share_one_object(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let first = [staged("x/lib/util.rs", "fn a() {}"), staged("x/main.rs", "one")];
        let second = [
            staged("y/z/lib/util.rs", "fn a() {}"),
            staged("readme", "two"),
        ];

        let first_root = read_tree(&database, &Tree::build_from_index(&first, &database).unwrap());
        let x = read_tree(&database, &first_root.entry("x").unwrap().oid);
        let lib_in_first = x.entry("lib").unwrap().oid.clone();

        let second_root =
            read_tree(&database, &Tree::build_from_index(&second, &database).unwrap());
        let y = read_tree(&database, &second_root.entry("y").unwrap().oid);
        let z = read_tree(&database, &y.entry("z").unwrap().oid);
        let lib_in_second = z.entry("lib").unwrap().oid.clone();

        assert_eq!(lib_in_first, lib_in_second);
    }

    #[test]
    fn serialized_entries_are_sorted_by_name() {
        let entries = [staged("b", "2"), staged("a/x", "1"), staged("c", "3")];

        let content = Tree::build(&entries).unwrap().serialize().unwrap();
        let names = String::from_utf8(content.to_vec())
            .unwrap()
            .lines()
            .map(|line| line.split_once('\t').unwrap().1.to_string())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn restaging_a_path_keeps_the_latest_entry() {
        let entries = [staged("a.txt", "old"), staged("a.txt", "new")];

        let expected = Tree::build(&[staged("a.txt", "new")]).unwrap();
        assert_eq!(
            Tree::build(&entries).unwrap().object_id().unwrap(),
            expected.object_id().unwrap()
        );
    }

    #[rstest]
    #[case(&["a", "a/b"])]
    #[case(&["a/b", "a"])]
    fn file_and_directory_with_the_same_name_conflict(#[case] paths: &[&str]) {
        let entries = paths.iter().map(|path| staged(path, "x")).collect::<Vec<_>>();

        let err = Tree::build(&entries).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[rstest]
    fn loaded_tree_keeps_its_stored_id(database: (TempDir, Database)) {
        let (_dir, database) = database;
        let entries = [staged("a.txt", "hi"), staged("dir/b.txt", "yo")];
        let oid = Tree::build_from_index(&entries, &database).unwrap();

        let loaded = database.parse_object_as_tree(&oid).unwrap();

        assert_eq!(loaded.object_id().unwrap(), oid);
        assert_eq!(loaded.serialize().unwrap(), database.load(&oid).unwrap());
        assert_eq!(database.parse_object(&oid).unwrap().object_id().unwrap(), oid);
    }

    #[rstest]
    #[case("bad\nname")]
    #[case("dir/bad\rname")]
    #[case("nul\0name")]
    fn names_that_cannot_be_stored_are_rejected(
        database: (TempDir, Database),
        #[case] path: &str,
    ) {
        let (dir, database) = database;

        let err = Tree::build_from_index(&[staged(path, "x")], &database).unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!dir.path().join("objects").exists());
    }

    #[rstest]
    #[case("no-tab-here")]
    #[case("100644 blob abc\tname")]
    #[case("40000 blob da39a3ee5e6b4b0d3255bfef95601890afd80709\tname")]
    #[case("100644 blob da39a3ee5e6b4b0d3255bfef95601890afd80709\ta/b")]
    fn malformed_tree_lines_are_rejected(#[case] content: &str) {
        let err = Tree::deserialize(content.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedObject { .. }));
    }

    proptest! {
        #[test]
        fn root_id_ignores_input_order(
            paths in proptest::collection::btree_set("[a-c]{1,2}(/[a-c]{1,2}){0,2}\\.txt", 1..12),
            seed in any::<u64>(),
        ) {
            let entries = paths
                .iter()
                .map(|path| staged(path, path))
                .collect::<Vec<_>>();
            let mut shuffled = entries.clone();
            // deterministic rotation + reversal stands in for a shuffle
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            if seed % 2 == 0 {
                shuffled.reverse();
            }

            let forward = Tree::build(&entries).unwrap().object_id().unwrap();
            let permuted = Tree::build(&shuffled).unwrap().object_id().unwrap();
            prop_assert_eq!(forward, permuted);
        }
    }
}
