use crate::areas::repository::Repository;
use std::path::PathBuf;

impl Repository {
    /// Unstage paths, printing each removed entry. The working tree is not
    /// touched and paths that are not staged are skipped silently.
    pub fn rm(&self, paths: &[PathBuf]) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let mut index = self.index();
        index.load()?;

        for path in paths {
            let path = self.workspace().relativize(path)?;
            let removed = index
                .entries()
                .filter(|entry| entry.name.starts_with(&path))
                .map(|entry| entry.name.clone())
                .collect::<Vec<_>>();

            for name in removed {
                index.remove(&name);
                writeln!(self.writer(), "rm '{}'", name.display())?;
            }
        }

        index.save()?;

        Ok(())
    }
}
