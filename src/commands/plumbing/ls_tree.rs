use crate::areas::refs::HEAD_REF_NAME;
use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use std::path::Path;

impl Repository {
    /// List a tree, or the tree of a commit. `HEAD` names the current commit.
    ///
    /// With `recursive`, subtrees are expanded and only files are printed,
    /// with paths relative to the listed tree.
    pub fn ls_tree(&self, object_sha: &str, recursive: bool) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let oid = if object_sha == HEAD_REF_NAME {
            self.refs()
                .resolve_head()?
                .ok_or_else(|| anyhow::anyhow!("HEAD does not point to a commit yet"))?
        } else {
            self.database().resolve(object_sha)?
        };

        // objects carry no type header, so try the commit shape first
        let tree_oid = match self.database().parse_object_as_commit(&oid) {
            Ok(commit) => commit.tree_oid().clone(),
            Err(_) => oid,
        };

        self.show_tree(&tree_oid, None, recursive)
    }

    fn show_tree(
        &self,
        oid: &ObjectId,
        prefix: Option<&Path>,
        recursive: bool,
    ) -> anyhow::Result<()> {
        let tree = self.database().parse_object_as_tree(oid)?;

        for (name, entry) in tree.into_entries() {
            let path = match prefix {
                Some(prefix) => prefix.join(&name),
                None => Path::new(&name).to_path_buf(),
            };

            if recursive && entry.is_tree() {
                self.show_tree(&entry.oid, Some(&path), recursive)?;
                continue;
            }

            writeln!(
                self.writer(),
                "{:06o} {} {}\t{}",
                entry.mode.as_u32(),
                entry.object_type(),
                entry.oid,
                path.display()
            )?;
        }

        Ok(())
    }
}
