use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::hasher::{CHUNK_SIZE, Hasher};
use crate::artifacts::objects::object::{Object, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::{OBJECT_ID_LENGTH, OBJECT_SHARD_LENGTH};
use crate::errors::{Error, IoContext, Result};
use bytes::Bytes;
use fake::rand;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};

/// Shortest abbreviated object ID accepted by [`Database::resolve`]
pub const MIN_PREFIX_LENGTH: usize = 4;

/// Content-addressed object store
///
/// Objects live at `<objects>/<first 2 hex>/<remaining 38 hex>` and are never
/// rewritten: storing content whose ID is already present is a no-op.
#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).is_file()
    }

    /// Store raw bytes, returning their ID.
    pub fn put(&self, content: &[u8]) -> Result<ObjectId> {
        let object_id = Hasher::digest(content);
        let object_path = self.path.join(object_id.to_path());

        // the ID alone vouches for the content, so an existing file is never re-checked
        if object_path.exists() {
            tracing::debug!(oid = %object_id, "object already stored");
            return Ok(object_id);
        }

        let object_dir = self.create_shard_dir(&object_path)?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let mut file = File::create(&temp_object_path).with_path(&temp_object_path)?;
        file.write_all(content).with_path(&temp_object_path)?;
        drop(file);

        self.commit_temp_object(&temp_object_path, &object_path)?;
        tracing::debug!(oid = %object_id, size = content.len(), "stored object");

        Ok(object_id)
    }

    /// Store everything `reader` yields without holding it all in memory.
    ///
    /// The stream is spooled into a temp file while being hashed, then moved
    /// into place (or dropped when the object already exists).
    pub fn put_reader(&self, mut reader: impl Read) -> Result<ObjectId> {
        std::fs::create_dir_all(&self.path).with_path(&self.path)?;
        let temp_object_path = self.path.join(Self::generate_temp_name());

        let spooled = (|| -> Result<(ObjectId, u64)> {
            let mut file = File::create(&temp_object_path).with_path(&temp_object_path)?;
            let mut hasher = Hasher::new();
            let mut buffer = [0u8; CHUNK_SIZE];
            let mut size = 0u64;

            loop {
                let n = match reader.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e).with_path(&temp_object_path),
                };
                hasher.update(&buffer[..n]);
                file.write_all(&buffer[..n]).with_path(&temp_object_path)?;
                size += n as u64;
            }

            Ok((hasher.finalize(), size))
        })();

        let (object_id, size) = match spooled {
            Ok(spooled) => spooled,
            Err(e) => {
                let _ = std::fs::remove_file(&temp_object_path);
                return Err(e);
            }
        };

        let object_path = self.path.join(object_id.to_path());
        if object_path.exists() {
            tracing::debug!(oid = %object_id, "object already stored");
            std::fs::remove_file(&temp_object_path).with_path(&temp_object_path)?;
            return Ok(object_id);
        }

        self.create_shard_dir(&object_path)?;
        self.commit_temp_object(&temp_object_path, &object_path)?;
        tracing::debug!(oid = %object_id, size, "stored object");

        Ok(object_id)
    }

    /// Serialize a typed object and store it.
    pub fn store(&self, object: &impl Object) -> Result<ObjectId> {
        self.put(&object.serialize()?)
    }

    /// Open an object for streaming reads.
    pub fn get(&self, object_id: &ObjectId) -> Result<impl std::io::BufRead + use<>> {
        let object_path = self.path.join(object_id.to_path());

        let file = File::open(&object_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(format!("object {object_id}")),
            _ => Error::Io {
                path: object_path.clone(),
                source: e,
            },
        })?;

        Ok(BufReader::new(file))
    }

    /// Read a whole object into memory.
    pub fn load(&self, object_id: &ObjectId) -> Result<Bytes> {
        let mut content = Vec::new();
        self.get(object_id)?
            .read_to_end(&mut content)
            .with_path(&self.path.join(object_id.to_path()))?;

        Ok(content.into())
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> Result<Blob> {
        self.parse_object_as(object_id)
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> Result<Tree> {
        self.parse_object_as(object_id)
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> Result<Commit> {
        self.parse_object_as(object_id)
    }

    /// Load an object as whichever kind its bytes parse as.
    ///
    /// Objects carry no type header, so the kind is inferred: a commit if the
    /// bytes have the commit shape, else a tree, else a blob. Empty content
    /// reads as the empty tree.
    pub fn parse_object(&self, object_id: &ObjectId) -> Result<Box<dyn Object>> {
        let content = self.load(object_id)?;

        if let Ok(commit) = Commit::deserialize(Cursor::new(&content)) {
            return Ok(Box::new(commit));
        }
        if let Ok(tree) = Tree::deserialize(Cursor::new(&content)) {
            return Ok(Box::new(tree));
        }

        Ok(Box::new(Blob::new(content)))
    }

    fn parse_object_as<T: Unpackable>(&self, object_id: &ObjectId) -> Result<T> {
        let content = self.load(object_id)?;

        T::deserialize(Cursor::new(content)).map_err(|e| e.for_object(object_id))
    }

    /// Resolve a full or abbreviated object ID.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidIdentifier`] for non-hex input or prefixes shorter than
    ///   [`MIN_PREFIX_LENGTH`]
    /// - [`Error::NotFound`] if no stored object matches
    /// - [`Error::InvalidInput`] if the prefix is ambiguous
    pub fn resolve(&self, name: &str) -> Result<ObjectId> {
        if name.len() == OBJECT_ID_LENGTH {
            return ObjectId::try_parse(name.to_string());
        }
        if name.len() < MIN_PREFIX_LENGTH
            || name.len() > OBJECT_ID_LENGTH
            || !name.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(Error::InvalidIdentifier(name.to_string()));
        }

        let mut matches = self.find_objects_by_prefix(&name.to_ascii_lowercase())?;
        match matches.len() {
            0 => Err(Error::NotFound(format!("object {name}"))),
            1 => Ok(matches.remove(0)),
            n => Err(Error::InvalidInput(format!(
                "short object ID {name} is ambiguous ({n} candidates)"
            ))),
        }
    }

    /// Find all objects whose OID starts with the given prefix.
    ///
    /// Only the shard directory named by the first two characters is scanned,
    /// so the prefix must be at least that long.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> Result<Vec<ObjectId>> {
        if prefix.len() < OBJECT_SHARD_LENGTH {
            return Err(Error::InvalidIdentifier(prefix.to_string()));
        }

        let (dir_name, file_prefix) = prefix.split_at(OBJECT_SHARD_LENGTH);
        let dir_path = self.path.join(dir_name);
        if !dir_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for entry in std::fs::read_dir(&dir_path).with_path(&dir_path)? {
            let file_name = entry.with_path(&dir_path)?.file_name();
            let file_name = file_name.to_string_lossy();

            if file_name.starts_with(file_prefix)
                && let Ok(oid) = ObjectId::try_parse(format!("{dir_name}{file_name}"))
            {
                matches.push(oid);
            }
        }
        matches.sort();

        Ok(matches)
    }

    fn create_shard_dir(&self, object_path: &Path) -> Result<PathBuf> {
        let object_dir = object_path
            .parent()
            .ok_or_else(|| Error::InvalidInput(format!("invalid object path {}", object_path.display())))?;
        std::fs::create_dir_all(object_dir).with_path(object_dir)?;

        Ok(object_dir.to_path_buf())
    }

    /// Move a fully written temp file to its final object path.
    fn commit_temp_object(&self, temp_object_path: &Path, object_path: &Path) -> Result<()> {
        std::fs::rename(temp_object_path, object_path).map_err(|e| {
            let _ = std::fs::remove_file(temp_object_path);
            Error::Io {
                path: object_path.to_path_buf(),
                source: e,
            }
        })
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}
