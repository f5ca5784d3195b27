use crate::areas::refs::{HeadRef, SymRefName};
use crate::areas::repository::Repository;
use anyhow::Context;
use std::fs;

pub const DEFAULT_BRANCH: &str = "master";

impl Repository {
    /// Create `.kit/{objects,refs/heads}`, an empty index and a HEAD pointing
    /// at the default branch. Running it again keeps existing state.
    pub fn init(&self) -> anyhow::Result<()> {
        let reinitialized = self.is_initialized();

        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .kit/objects directory")?;

        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create .kit/refs/heads directory")?;

        if !reinitialized {
            self.refs()
                .set_head(&HeadRef::Symbolic(SymRefName::branch(DEFAULT_BRANCH)?))
                .context("Failed to create initial HEAD reference")?;
        }

        let index = self.index();
        if !index.path().exists() {
            index.save().context("Failed to create .kit/index file")?;
        }

        writeln!(
            self.writer(),
            "{} Kit repository in {}",
            if reinitialized {
                "Reinitialized existing"
            } else {
                "Initialized empty"
            },
            self.repository_path().display()
        )?;

        Ok(())
    }
}
