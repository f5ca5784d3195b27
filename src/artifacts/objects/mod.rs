//! Object types and operations
//!
//! Every piece of content is stored as an object identified by the SHA-1 of its
//! exact bytes. There are three kinds:
//!
//! - **Blob**: File content (raw bytes, stored as-is)
//! - **Tree**: Directory listing (names, modes, kinds and object IDs)
//! - **Commit**: Snapshot metadata (parent, tree, author, timestamp, message)
//!
//! Objects carry no type header on disk: a blob's ID is the digest of the file
//! bytes alone, and trees and commits are plain text field lists.

pub mod blob;
pub mod commit;
pub mod hasher;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;

/// Number of leading hex characters used as the shard directory name
pub const OBJECT_SHARD_LENGTH: usize = 2;
