//! Commit object
//!
//! Commits chain tree snapshots into history. They contain:
//! - A parent commit ID (absent for the root commit)
//! - A tree object ID (directory snapshot)
//! - Author and timestamp
//! - Commit message
//!
//! ## Format
//!
//! Five newline-separated fields, in this order:
//!
//! ```text
//! <parent-sha or empty>
//! <tree-sha>
//! <author>
//! <unix-seconds> <+hhmm>
//! <message, possibly spanning several lines>
//! ```
//!
//! The message is the last field, so it may contain newlines of its own.

use crate::areas::database::Database;
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::{Error, Result};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Timelike};
use std::io::{BufRead, Read};

/// Number of newline-separated fields in a serialized commit
const COMMIT_FIELD_COUNT: usize = 5;

/// Author identity
///
/// Contains name, email and the time the commit is authored.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: DateTime<FixedOffset>,
}

impl Author {
    /// Create a new author with the current timestamp
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    /// Create a new author with a specific timestamp
    pub fn new_with_timestamp(name: String, email: String, timestamp: DateTime<FixedOffset>) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    /// Format author name and email for display
    ///
    /// # Returns
    ///
    /// String in format "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Load author information from environment variables
    ///
    /// Reads KIT_AUTHOR_NAME, KIT_AUTHOR_EMAIL, and optionally KIT_AUTHOR_DATE
    /// (RFC 2822 or `%Y-%m-%d %H:%M:%S %z`). If no date is provided, uses the
    /// current time.
    pub fn load_from_env() -> Result<Self> {
        let var = |key: &str| {
            std::env::var(key)
                .map_err(|_| Error::InvalidInput(format!("{key} is not set")))
        };
        let name = var("KIT_AUTHOR_NAME")?;
        let email = var("KIT_AUTHOR_EMAIL")?;
        let timestamp = std::env::var("KIT_AUTHOR_DATE").ok().and_then(|date_str| {
            DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        });

        match timestamp {
            Some(ts) => Ok(Author::new_with_timestamp(name, email, ts)),
            None => Ok(Author::new(name, email)),
        }
    }

    /// Get the timestamp
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }
}

/// Commit object
///
/// Represents a snapshot of the repository with metadata.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit ID (None for the root commit)
    parent: Option<ObjectId>,
    /// Tree object ID representing the directory snapshot
    tree_oid: ObjectId,
    /// Who wrote the changes
    author: String,
    /// When the commit was authored, to the second
    timestamp: DateTime<FixedOffset>,
    /// Commit message
    message: String,
}

impl Commit {
    /// Create a new commit value
    ///
    /// Sub-second precision is dropped from `timestamp` since the stored form
    /// keeps whole seconds only.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if the author contains a line break, which
    /// would shift every following field.
    pub fn new(
        parent: Option<ObjectId>,
        tree_oid: ObjectId,
        author: String,
        timestamp: DateTime<FixedOffset>,
        message: String,
    ) -> Result<Self> {
        if author.contains(['\n', '\r']) {
            return Err(Error::InvalidInput(format!(
                "author '{}' must fit on one line",
                author.escape_debug()
            )));
        }

        Ok(Commit {
            parent,
            tree_oid,
            author,
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            message,
        })
    }

    /// Build a commit, store it and return its ID with the stored value.
    ///
    /// The returned commit carries `timestamp` truncated to whole seconds, as
    /// [`Commit::new`] does, so it is what [`Commit::load`] reads back.
    pub fn create(
        database: &Database,
        parent: Option<ObjectId>,
        tree_oid: ObjectId,
        author: String,
        timestamp: DateTime<FixedOffset>,
        message: String,
    ) -> Result<(ObjectId, Self)> {
        let commit = Self::new(parent, tree_oid, author, timestamp, message)?;
        let commit_oid = database.store(&commit)?;

        Ok((commit_oid, commit))
    }

    /// Read a commit back from the database.
    pub fn load(database: &Database, commit_oid: &ObjectId) -> Result<Self> {
        database.parse_object_as_commit(commit_oid)
    }

    /// Get the first line of the commit message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    /// Format timestamp in human-readable form
    ///
    /// # Returns
    ///
    /// String like "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp.format("%a %b %-d %H:%M:%S %Y %z").to_string()
    }

    fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
        let (seconds, offset) = value.split_once(' ')?;
        let seconds = seconds.parse::<i64>().ok()?;
        let offset = *DateTime::parse_from_str(
            &format!("1970-01-01 00:00:00 {offset}"),
            "%Y-%m-%d %H:%M:%S %z",
        )
        .ok()?
        .offset();

        DateTime::from_timestamp(seconds, 0).map(|utc| utc.with_timezone(&offset))
    }
}

impl Packable for Commit {
    fn serialize(&self) -> Result<Bytes> {
        let parent = self
            .parent
            .as_ref()
            .map(|parent| parent.to_string())
            .unwrap_or_default();

        let object_content = [
            parent,
            self.tree_oid.to_string(),
            self.author.clone(),
            format!("{} {}", self.timestamp.timestamp(), self.timestamp.format("%z")),
            self.message.clone(),
        ]
        .join("\n");

        Ok(Bytes::from(object_content))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| Error::malformed("", format!("unreadable commit: {e}")))?;

        let fields = content.splitn(COMMIT_FIELD_COUNT, '\n').collect::<Vec<_>>();
        let [parent, tree_oid, author, timestamp, message] = fields[..] else {
            return Err(Error::malformed(
                "",
                format!(
                    "expected {COMMIT_FIELD_COUNT} fields, found {}",
                    fields.len()
                ),
            ));
        };

        let parent = match parent {
            "" => None,
            parent => Some(
                ObjectId::try_parse(parent.to_string())
                    .map_err(|_| Error::malformed("", format!("invalid parent '{parent}'")))?,
            ),
        };
        let tree_oid = ObjectId::try_parse(tree_oid.to_string())
            .map_err(|_| Error::malformed("", format!("invalid tree '{tree_oid}'")))?;
        let timestamp = Self::parse_timestamp(timestamp)
            .ok_or_else(|| Error::malformed("", format!("invalid timestamp '{timestamp}'")))?;

        Self::new(
            parent,
            tree_oid,
            author.to_string(),
            timestamp,
            message.to_string(),
        )
        .map_err(|e| Error::malformed("", e.to_string()))
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        String::from_utf8_lossy(&self.serialize().unwrap_or_default()).into_owned()
    }
}
