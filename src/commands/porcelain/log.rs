use crate::areas::repository::Repository;
use crate::artifacts::branch::reference::Reference;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::digest::Digest;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// Walk parent links from `reference` (the current position by default)
    pub async fn log(&mut self, reference: Option<&str>) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let start = match reference {
            Some(reference) => {
                Reference::parse(reference, self.refs(), self.database())?.resolve(self.refs())?
            }
            None => self.refs().current_position()?,
        };

        for entry in RevList::new(self.database(), start) {
            let (digest, decoded) = entry?;

            self.show_commit(&digest, decoded.commit())?;
        }

        Ok(())
    }

    fn show_commit(&self, digest: &Digest, commit: &Commit) -> anyhow::Result<()> {
        let name = self.refs().normalize(digest)?;
        let decoration = if name != digest.as_ref() {
            format!(" ({})", name.as_str().cyan())
        } else {
            String::new()
        };

        writeln!(
            self.writer(),
            "{}{}",
            format!("commit {digest}").yellow(),
            decoration
        )?;
        writeln!(
            self.writer(),
            "Committed on {} at {}",
            commit.readable_date(),
            commit.readable_time()
        )?;
        writeln!(self.writer(), "\t{}", commit.title())?;
        writeln!(self.writer())?;

        if !commit.message().is_empty() {
            for message_line in commit.message().lines() {
                writeln!(self.writer(), "\t{}", message_line)?;
            }
            writeln!(self.writer())?;
        }

        Ok(())
    }
}
