use crate::areas::repository::Repository;
use crate::artifacts::objects::tree::Tree;

impl Repository {
    pub fn write_tree(&self) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let mut index = self.index();
        index.load()?;

        let tree_oid = Tree::build_from_index(index.entries(), self.database())?;
        writeln!(self.writer(), "{tree_oid}")?;

        Ok(())
    }
}
