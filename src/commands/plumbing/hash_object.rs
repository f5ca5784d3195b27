use crate::areas::repository::Repository;
use crate::artifacts::objects::hasher::Hasher;
use anyhow::Context;
use std::fs::File;
use std::path::Path;

impl Repository {
    /// Print the object ID of a file's content, storing it when `write` is set.
    ///
    /// Relative paths are taken from the repository root.
    pub fn hash_object(&self, object_path: &Path, write: bool) -> anyhow::Result<()> {
        let object_path = self.path().join(object_path);
        let file = File::open(&object_path)
            .with_context(|| format!("could not open '{}'", object_path.display()))?;

        let object_id = if write {
            self.ensure_initialized()?;
            self.database().put_reader(file)?
        } else {
            Hasher::digest_reader(file)
                .with_context(|| format!("could not read '{}'", object_path.display()))?
        };

        writeln!(self.writer(), "{object_id}")?;

        Ok(())
    }
}
