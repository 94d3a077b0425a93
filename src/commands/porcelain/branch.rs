use crate::areas::repository::Repository;
use crate::artifacts::branch::HEAD_REF_NAME;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::reference::Reference;
use crate::artifacts::checkout::OverwritePolicy;
use colored::Colorize;
use std::io::Write;

#[derive(Debug, Clone, Default)]
pub struct BranchOptions {
    /// Overwrite an existing branch without asking
    pub force: bool,
    /// Check the branch out once created
    pub checkout: bool,
}

impl Repository {
    /// List branches, or create `name` at `source` (the current position by default)
    pub async fn branch(
        &mut self,
        name: Option<&str>,
        source: Option<&str>,
        options: &BranchOptions,
    ) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        match name {
            None => self.list_branches(),
            Some(name) => self.create_branch(name, source, options).await,
        }
    }

    fn list_branches(&self) -> anyhow::Result<()> {
        let state = self.refs().head_state()?;

        if let Some(digest) = state.detached_digest() {
            writeln!(
                self.writer(),
                "* {}",
                format!("(detached at {})", digest.to_short()).red()
            )?;
        }

        for branch in self.refs().list_branches()? {
            if !state.is_detached() && &branch == state.branch() {
                writeln!(self.writer(), "* {}", branch.as_ref().green())?;
            } else {
                writeln!(self.writer(), "  {}", branch)?;
            }
        }

        Ok(())
    }

    async fn create_branch(
        &mut self,
        name: &str,
        source: Option<&str>,
        options: &BranchOptions,
    ) -> anyhow::Result<()> {
        let name = BranchName::try_parse(name)?;

        let reference = Reference::parse(
            source.unwrap_or(HEAD_REF_NAME),
            self.refs(),
            self.database(),
        )?;
        let digest = reference.resolve(self.refs())?;
        // a branch may only point at a stored commit
        self.database().load_commit(&digest)?;

        if self.refs().branch_exists(&name)? && !options.force {
            let question = format!("Branch '{name}' already exists. Overwrite it?");
            let confirmed = self.prompter().confirm(&question, false)?;

            if !confirmed {
                eprintln!("Branch '{name}' left unchanged");
                return Ok(());
            }
        }

        self.refs().create_branch(&name, &digest)?;
        writeln!(
            self.writer(),
            "Branch '{}' set to {}",
            name,
            digest.to_short()
        )?;

        // a branch at the detached position rescues it
        let state = self.refs().head_state()?;
        if state.detached_digest() == Some(&digest) {
            self.refs().attach(&name)?;
            eprintln!("Attached to branch '{name}'");
        }

        if options.checkout {
            self.checkout(name.as_ref(), OverwritePolicy::default())
                .await?;
        }

        Ok(())
    }
}
