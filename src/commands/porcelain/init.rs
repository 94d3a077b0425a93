use crate::areas::repository::Repository;
use crate::artifacts::branch::DEFAULT_BRANCH;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::HeroError;
use crate::artifacts::objects::commit::Commit;
use anyhow::Context;
use std::fs;
use std::io::Write;

const INITIAL_TITLE: &str = "Initial Commit";
const INITIAL_MESSAGE: &str = "This commit marks the initialization of the repository.";

impl Repository {
    pub async fn init(&mut self, branch: Option<&str>) -> anyhow::Result<()> {
        if self.is_initialized() {
            return Err(HeroError::AlreadyInitialized(self.path().to_path_buf()).into());
        }

        let branch = BranchName::try_parse(branch.unwrap_or(DEFAULT_BRANCH))?;

        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .hero/commits directory")?;

        fs::create_dir_all(self.refs().branches_path())
            .context("Failed to create .hero/branches directory")?;

        let index = self.index();
        let mut index = index.lock().await;
        fs::create_dir_all(index.path()).context("Failed to create .hero/index directory")?;
        // an empty table, so the first `add` finds one to load
        index.write_updates()?;

        let root = Commit::new(
            None,
            self.settings().commit_timestamp(),
            INITIAL_TITLE,
            INITIAL_MESSAGE,
            Vec::new(),
        );
        let root_digest = self.database().store(&root)?;

        self.refs().create_branch(&branch, &root_digest)?;
        self.refs()
            .attach(&branch)
            .context("Failed to create initial HEAD reference")?;

        writeln!(
            self.writer(),
            "Initialized empty hero repository in {}",
            self.path().display()
        )?;
        writeln!(
            self.writer(),
            "[{} (root-commit) {}] {}",
            branch,
            root_digest.to_short(),
            root.title()
        )?;

        Ok(())
    }
}
