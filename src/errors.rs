use std::path::{Path, PathBuf};

/// Errors produced by repository operations.
///
/// Callers branch on the variant rather than on the message: a missing
/// object or file is `NotFound`, a bad hex id is `InvalidIdentifier`, stored
/// bytes that cannot be parsed are `MalformedObject`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid object id '{0}'")]
    InvalidIdentifier(String),

    #[error("malformed object {oid}: {reason}")]
    MalformedObject { oid: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("i/o error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn malformed(oid: impl ToString, reason: impl Into<String>) -> Self {
        Error::MalformedObject {
            oid: oid.to_string(),
            reason: reason.into(),
        }
    }

    /// Name the object a parse failure came from.
    ///
    /// Deserializers only see a byte stream, so they report `MalformedObject`
    /// with an empty id; the database fills it in once it knows which object
    /// it was reading.
    pub(crate) fn for_object(self, object_id: impl ToString) -> Self {
        match self {
            Error::MalformedObject { oid, reason } if oid.is_empty() => Error::MalformedObject {
                oid: object_id.to_string(),
                reason,
            },
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Attach the offending path to an `io::Error`.
///
/// `NotFound` from the OS is surfaced as [`Error::NotFound`] so callers do not
/// have to dig into the source error to tell a missing file from a failing disk.
pub(crate) trait IoContext<T> {
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            _ => Error::Io {
                path: path.to_path_buf(),
                source,
            },
        })
    }
}
