use crate::areas::repository::Repository;
use anyhow::Context;
use std::path::PathBuf;

impl Repository {
    pub fn add(&self, paths: &[PathBuf]) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let mut index = self.index();
        index.load()?;

        // expand directories up front so a bad pathspec aborts before anything is staged
        let files = paths
            .iter()
            .map(|path| {
                self.workspace()
                    .list_files(Some(path))
                    .with_context(|| format!("pathspec '{}' did not match any files", path.display()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?
            .into_iter()
            .flatten();

        for file in files {
            index
                .add_file(self.workspace(), self.database(), &file)
                .with_context(|| format!("Failed to stage '{}'", file.display()))?;
        }

        index.save()?;

        Ok(())
    }
}
