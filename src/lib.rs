//! kit: a small content-addressable version control engine
//!
//! The crate is organized like git's own layering:
//!
//! - `areas`: the on-disk areas of a repository (object database, index, refs, workspace)
//! - `artifacts`: the data structures stored in those areas (objects, index entries)
//! - `commands`: plumbing and porcelain operations driven by the CLI
//! - `errors`: the error kinds returned by every library operation

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;

pub use errors::{Error, Result};
