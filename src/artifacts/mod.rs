//! Data structures and algorithms
//!
//! - `database`: Typed entries read back out of stored trees
//! - `index`: Staged-file records and their ledger line format
//! - `log`: Commit history traversal
//! - `objects`: Object types (blob, tree, commit), IDs and hashing

pub mod database;
pub mod index;
pub mod log;
pub mod objects;
