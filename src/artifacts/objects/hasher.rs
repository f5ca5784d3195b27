//! Streaming SHA-1 digests
//!
//! Data can be fed incrementally with [`Hasher::update`] or through the
//! [`std::io::Write`] implementation, then finalised into an [`ObjectId`].

use crate::artifacts::objects::object_id::ObjectId;
use sha1::{Digest, Sha1};
use std::io::{self, Read};

/// Size of the read buffer used when hashing streams
pub const CHUNK_SIZE: usize = 8192;

#[derive(Default, Clone)]
pub struct Hasher {
    inner: Sha1,
}

impl Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    pub fn finalize(self) -> ObjectId {
        let digest = self.inner.finalize();
        ObjectId::from_digest(format!("{digest:x}"))
    }

    /// Hash data in one call.
    pub fn digest(data: &[u8]) -> ObjectId {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }

    /// Hash everything a reader yields, `CHUNK_SIZE` bytes at a time.
    pub fn digest_reader(mut reader: impl Read) -> io::Result<ObjectId> {
        let mut hasher = Self::new();
        let mut buffer = [0u8; CHUNK_SIZE];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..n]);
        }

        Ok(hasher.finalize())
    }
}

impl io::Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
