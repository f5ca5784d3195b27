//! Core repository components
//!
//! - `database`: Content-addressed object store for blobs, trees and commits
//! - `index`: Staging area tracking the files for the next commit
//! - `refs`: HEAD and branch references
//! - `repository`: Ties the areas together around one workspace root
//! - `workspace`: Working directory file system operations

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
