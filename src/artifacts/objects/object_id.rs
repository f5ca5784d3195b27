//! Object identifier (SHA-1 hash)
//!
//! Object IDs are 40-character lowercase hexadecimal strings.
//! They uniquely identify all objects (blobs, trees, commits).
//!
//! ## Format
//!
//! - Full: 40 hex characters (e.g., "abc123...def")
//! - Short: First 7 characters (e.g., "abc1234")
//!
//! ## Storage
//!
//! Objects are stored in `.kit/objects/<first-2-chars>/<remaining-38-chars>`

use crate::artifacts::objects::{OBJECT_ID_LENGTH, OBJECT_SHARD_LENGTH};
use crate::errors::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Abbreviated length used when displaying object IDs
pub const SHORT_OID_LENGTH: usize = 7;

/// Object identifier (SHA-1 hash)
///
/// Can only be built from a validated 40-character hex string, so every
/// `ObjectId` splits cleanly into a shard directory and a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate an object ID from a string
    ///
    /// Uppercase hex is accepted and normalized to lowercase.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidIdentifier`] if the string is too short to shard, has the
    /// wrong length, or contains non-hex characters.
    pub fn try_parse(id: String) -> Result<Self> {
        if id.len() != OBJECT_ID_LENGTH || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidIdentifier(id));
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Wrap the lowercase hex rendering of a freshly computed digest.
    pub(crate) fn from_digest(hex: String) -> Self {
        debug_assert_eq!(hex.len(), OBJECT_ID_LENGTH);
        Self(hex)
    }

    /// Convert to file system path for object storage
    ///
    /// Splits the hash as `XX/YYYYYY...` where XX is the first 2 chars.
    /// For example, `abc123...` becomes `ab/c123...`
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(OBJECT_SHARD_LENGTH);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the hash
    pub fn to_short_oid(&self) -> String {
        self.0[..SHORT_OID_LENGTH].to_string()
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_parse(s.to_string())
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const EMPTY_SHA1: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn to_path_splits_shard_prefix() {
        let oid = ObjectId::try_parse(EMPTY_SHA1.to_string()).unwrap();

        assert_eq!(
            oid.to_path(),
            PathBuf::from("da").join("39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
        assert_eq!(oid.to_short_oid(), "da39a3e");
    }

    #[test]
    fn uppercase_hex_is_normalized() {
        let oid: ObjectId = EMPTY_SHA1.to_uppercase().parse().unwrap();
        assert_eq!(oid.as_ref(), EMPTY_SHA1);
    }

    #[rstest]
    #[case("")]
    #[case("a")]
    #[case("da")]
    #[case("da39a3ee")]
    #[case("zz39a3ee5e6b4b0d3255bfef95601890afd80709")]
    #[case("da39a3ee5e6b4b0d3255bfef95601890afd807090")]
    fn malformed_ids_are_rejected(#[case] id: &str) {
        let err = ObjectId::try_parse(id.to_string()).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier(_)));
    }
}
