use crate::areas::refs::HeadRef;
use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub oneline: bool,
}

impl Repository {
    /// Print history from HEAD back to the root commit.
    pub fn log(&self, opts: &LogOptions) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let head = self.refs().read_head()?;
        let start = self.refs().resolve_head()?;

        for (position, item) in RevList::new(self.database(), start).into_iter().enumerate() {
            let (commit_oid, commit) = item?;
            // only the newest commit carries HEAD
            let decoration = if position == 0 {
                Self::head_decoration(&head)
            } else {
                String::new()
            };

            if opts.oneline {
                self.show_commit_oneline(&commit_oid, &commit, &decoration)?;
            } else {
                if position > 0 {
                    writeln!(self.writer())?;
                }
                self.show_commit_medium(&commit_oid, &commit, &decoration)?;
            }
        }

        Ok(())
    }

    fn show_commit_medium(
        &self,
        commit_oid: &ObjectId,
        commit: &Commit,
        decoration: &str,
    ) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}{}",
            format!("commit {commit_oid}").yellow(),
            decoration
        )?;
        writeln!(self.writer(), "Author: {}", commit.author())?;
        writeln!(self.writer(), "Date:   {}", commit.readable_timestamp())?;
        writeln!(self.writer())?;
        for message_line in commit.message().lines() {
            writeln!(self.writer(), "    {message_line}")?;
        }

        Ok(())
    }

    fn show_commit_oneline(
        &self,
        commit_oid: &ObjectId,
        commit: &Commit,
        decoration: &str,
    ) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}{} {}",
            commit_oid.to_short_oid().yellow(),
            decoration,
            commit.short_message()
        )?;

        Ok(())
    }

    fn head_decoration(head: &HeadRef) -> String {
        let names = match head {
            HeadRef::Symbolic(target) => format!(
                "{}{}",
                "HEAD -> ".cyan().bold(),
                target.to_short_name().green().bold()
            ),
            HeadRef::Detached(_) => "HEAD".cyan().bold().to_string(),
        };

        format!(" {}{}{}", "(".yellow(), names, ")".yellow())
    }
}
