//! Command implementations
//!
//! - `plumbing`: Low-level commands working on objects directly (hash-object,
//!   cat-file, ls-tree, write-tree)
//! - `porcelain`: User-facing commands for the staging and commit workflow
//!   (init, add, rm, commit, log)
//!
//! Every command is an inherent method on [`crate::areas::repository::Repository`]
//! and writes its output to the repository's writer.

pub mod plumbing;
pub mod porcelain;
