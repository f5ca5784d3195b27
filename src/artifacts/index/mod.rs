//! Index ledger format
//!
//! The index (staging area) is a plain text file with one line per staged
//! file, sorted by path:
//!
//! ```text
//! <path>|<object id>|<size>|<mtime millis>|<octal mode>
//! ```
//!
//! The path is the first field and is split off from the right, so it may
//! itself contain the separator.

pub mod entry_mode;
pub mod index_entry;

/// Field separator of a ledger line
pub const FIELD_SEPARATOR: char = '|';

/// Number of fields in a ledger line
pub const FIELD_COUNT: usize = 5;
