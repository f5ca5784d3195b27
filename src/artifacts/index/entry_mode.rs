use crate::errors::{Error, Result};

/// Mode recorded for index and tree entries
///
/// Only regular files and directories are tracked; executable bits and
/// symlinks collapse to `Regular`.
#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    #[default]
    Regular,
    Directory,
}

impl EntryMode {
    pub fn as_str(&self) -> &str {
        match self {
            EntryMode::Regular => "100644",
            EntryMode::Directory => "40000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::Regular => 0o100644,
            EntryMode::Directory => 0o40000,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    pub fn from_octal_str(value: &str) -> Result<Self> {
        let mode = u32::from_str_radix(value, 8)
            .map_err(|_| Error::InvalidInput(format!("invalid entry mode '{value}'")))?;
        Self::try_from(mode)
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = Error;

    fn try_from(mode: u32) -> Result<Self> {
        match mode {
            0o100644 => Ok(EntryMode::Regular),
            0o40000 => Ok(EntryMode::Directory),
            _ => Err(Error::InvalidInput(format!("invalid entry mode {mode:o}"))),
        }
    }
}

impl From<EntryMode> for u32 {
    fn from(mode: EntryMode) -> Self {
        mode.as_u32()
    }
}
