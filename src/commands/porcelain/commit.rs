use crate::areas::refs::HeadRef;
use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::tree::Tree;
use anyhow::Context;

impl Repository {
    pub fn commit(&self, message: &str) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let message = message.trim();
        if message.is_empty() {
            anyhow::bail!("Aborting commit due to empty commit message");
        }

        let mut index = self.index();
        index.load()?;

        let tree_oid = Tree::build_from_index(index.entries(), self.database())?;
        let parent = self.refs().resolve_head()?;
        let author = Author::load_from_env().context("Failed to load author identity")?;

        let (commit_oid, commit) = Commit::create(
            self.database(),
            parent.clone(),
            tree_oid,
            author.display_name(),
            author.timestamp(),
            message.to_string(),
        )?;
        self.refs().update_head(&commit_oid)?;

        let head_name = match self.refs().read_head()? {
            HeadRef::Symbolic(target) => target.to_short_name().to_string(),
            HeadRef::Detached(_) => "detached HEAD".to_string(),
        };
        let is_root = match parent {
            Some(_) => "",
            None => " (root-commit)",
        };

        writeln!(
            self.writer(),
            "[{}{} {}] {}",
            head_name,
            is_root,
            commit_oid.to_short_oid(),
            commit.short_message()
        )?;

        Ok(())
    }
}
