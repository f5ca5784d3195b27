//! Plumbing commands
//!
//! - `hash-object`: Compute an object ID and optionally store the object
//! - `cat-file`: Print a stored object
//! - `ls-tree`: List the contents of a tree (or of a commit's tree)
//! - `write-tree`: Store the index as a tree and print its ID

pub mod cat_file;
pub mod hash_object;
pub mod ls_tree;
pub mod write_tree;
