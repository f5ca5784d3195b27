//! Commit history traversal
//!
//! - `rev_list`: Walks from a starting commit back along parent links
//!
//! Commits have a single parent, so history is a chain and the walk is a
//! plain linked-list traversal ending at the root commit.

pub mod rev_list;
