//! References: HEAD and branches
//!
//! HEAD is either symbolic (`ref: refs/heads/master`) or detached (a bare
//! commit ID). A branch file holds a bare commit ID, or nothing yet when the
//! branch has no commits. Resolution follows at most one level of
//! indirection: a branch file that is itself symbolic is malformed.

use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::{Error, IoContext, Result};
use derive_new::new;
use fake::rand;
use regex::Regex;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

const SYMREF_REGEX: &str = r"^ref: (.+)$";

static SYMREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(SYMREF_REGEX).unwrap_or_else(|e| panic!("invalid symref pattern: {e}"))
});

const HEADS_PREFIX: &str = "refs/heads/";

/// Path of a reference relative to the repository directory, such as
/// `refs/heads/master`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymRefName(String);

impl SymRefName {
    /// Accept only relative paths made of normal components so a reference can
    /// never point outside the repository directory. `HEAD` itself is not a
    /// valid target.
    pub fn try_parse(name: String) -> Result<Self> {
        let path = Path::new(&name);
        let valid = !name.is_empty()
            && name != HEAD_REF_NAME
            && path
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !valid {
            return Err(Error::InvalidInput(format!("invalid reference name '{name}'")));
        }

        Ok(SymRefName(name))
    }

    pub fn branch(name: &str) -> Result<Self> {
        Self::try_parse(format!("{HEADS_PREFIX}{name}"))
    }

    pub fn as_ref_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// `master` for `refs/heads/master`.
    pub fn to_short_name(&self) -> &str {
        self.0.strip_prefix(HEADS_PREFIX).unwrap_or(&self.0)
    }
}

impl AsRef<str> for SymRefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymRefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw content of HEAD
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadRef {
    Symbolic(SymRefName),
    Detached(ObjectId),
}

impl HeadRef {
    fn parse(content: &str) -> Result<Self> {
        let content = content.trim();

        if let Some(captures) = SYMREF.captures(content) {
            let target = SymRefName::try_parse(captures[1].to_string())
                .map_err(|e| Error::malformed(HEAD_REF_NAME, e.to_string()))?;
            return Ok(HeadRef::Symbolic(target));
        }

        ObjectId::try_parse(content.to_string())
            .map(HeadRef::Detached)
            .map_err(|_| Error::malformed(HEAD_REF_NAME, format!("unrecognized content '{content}'")))
    }
}

impl fmt::Display for HeadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadRef::Symbolic(target) => write!(f, "ref: {target}"),
            HeadRef::Detached(oid) => write!(f, "{oid}"),
        }
    }
}

/// Reads and moves HEAD and the branch it points to.
#[derive(Debug, new)]
pub struct Refs {
    /// Path to the repository directory (typically `.kit`)
    path: Box<Path>,
}

impl Refs {
    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    pub fn refs_path(&self) -> PathBuf {
        self.path.join("refs")
    }

    pub fn heads_path(&self) -> PathBuf {
        self.refs_path().join("heads")
    }

    /// HEAD as stored, without following it.
    ///
    /// A missing HEAD means the repository was never initialized and is
    /// reported as [`Error::NotFound`].
    pub fn read_head(&self) -> Result<HeadRef> {
        let head_path = self.head_path();
        let content = std::fs::read_to_string(&head_path).with_path(&head_path)?;

        HeadRef::parse(&content)
    }

    /// The commit HEAD currently points at, or `None` when the branch it
    /// names has no commits yet.
    pub fn resolve_head(&self) -> Result<Option<ObjectId>> {
        match self.read_head()? {
            HeadRef::Detached(oid) => Ok(Some(oid)),
            HeadRef::Symbolic(target) => self.read_ref(&target),
        }
    }

    /// Read a branch file. Absent or empty means the branch has no commits.
    pub fn read_ref(&self, name: &SymRefName) -> Result<Option<ObjectId>> {
        let ref_path = self.path.join(name.as_ref_path());

        let content = match std::fs::read_to_string(&ref_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_path(&ref_path),
        };
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }
        if SYMREF.is_match(content) {
            return Err(Error::malformed(
                name,
                "branch reference must hold a commit ID, not another symbolic reference",
            ));
        }

        ObjectId::try_parse(content.to_string())
            .map(Some)
            .map_err(|_| Error::malformed(name, format!("unrecognized content '{content}'")))
    }

    /// Advance history: write `oid` into the branch HEAD names, or into HEAD
    /// itself when detached.
    pub fn update_head(&self, oid: &ObjectId) -> Result<()> {
        match self.read_head()? {
            HeadRef::Symbolic(target) => {
                self.update_ref_file(&self.path.join(target.as_ref_path()), oid.as_ref())
            }
            HeadRef::Detached(_) => self.update_ref_file(&self.head_path(), oid.as_ref()),
        }
    }

    /// Overwrite HEAD, e.g. to point it at a branch.
    pub fn set_head(&self, head: &HeadRef) -> Result<()> {
        self.update_ref_file(&self.head_path(), &head.to_string())
    }

    /// Replace a ref file's content through a temp file and a rename,
    /// creating parent directories as needed.
    fn update_ref_file(&self, path: &Path, content: &str) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            Error::InvalidInput(format!("invalid reference path {}", path.display()))
        })?;
        std::fs::create_dir_all(parent).with_path(parent)?;

        let temp_path = parent.join(format!("ref-{}.tmp", rand::random::<u32>()));
        let written = std::fs::write(&temp_path, format!("{content}\n"))
            .with_path(&temp_path)
            .and_then(|_| std::fs::rename(&temp_path, path).with_path(path));
        if written.is_err() {
            let _ = std::fs::remove_file(&temp_path);
        }
        written?;

        tracing::debug!(reference = %path.display(), target = content, "updated reference");

        Ok(())
    }
}
