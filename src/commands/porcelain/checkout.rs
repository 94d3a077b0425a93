use crate::areas::repository::Repository;
use crate::artifacts::branch::head_state::HeadState;
use crate::artifacts::branch::reference::Reference;
use crate::artifacts::checkout::OverwritePolicy;
use crate::artifacts::checkout::migration::Migration;
use crate::artifacts::objects::digest::Digest;

const DETACHMENT_NOTICE: &str = r#"
You are in a detached state. Commits made here advance no branch and can be
reached later only through their digest, which every such commit prints.

To keep them, create a branch at the current position:

    hero branch <new-branch-name>
"#;

impl Repository {
    pub async fn checkout(&mut self, target: &str, policy: OverwritePolicy) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let reference = Reference::parse(target, self.refs(), self.database())?;
        let target_digest = reference.resolve(self.refs())?;
        // unknown or unreadable targets fail here, before anything changes
        let target_commit = self.database().load_commit(&target_digest)?;

        let current_state = self.refs().head_state()?;
        let current_digest = self.refs().current_position()?;
        let current_commit = match self.database().load_commit(&current_digest) {
            Ok(commit) => Some(commit),
            Err(error) => {
                tracing::warn!("current commit {current_digest} is unreadable, no files will be removed: {error:#}");
                None
            }
        };

        let report = {
            let mut prompter = self.prompter();
            let migration = Migration::new(self.workspace(), &mut **prompter, policy);

            migration.apply_changes(
                &target_commit,
                current_commit.as_ref().map(|commit| commit.commit()),
            )?
        };
        tracing::info!(
            written = report.written.len(),
            skipped = report.skipped.len(),
            removed = report.removed.len(),
            "checked out {target_digest}"
        );

        let branch_head = self.refs().head_of(current_state.branch())?;
        let new_state = current_state.after_checkout(&reference, &branch_head);
        self.refs().set_head_state(&new_state)?;

        for path in &report.kept {
            eprintln!("warning: kept '{path}', it has local changes and '{target}' does not record it");
        }
        for (path, blocker) in &report.blocked {
            eprintln!("warning: could not restore '{path}', '{blocker}' is in the way");
        }

        self.print_previous_position(&current_state, &new_state)?;
        self.print_detachment_notice(&current_state, &new_state, target);
        self.print_new_position(&current_state, &new_state, &target_digest)?;

        Ok(())
    }

    fn print_previous_position(
        &self,
        current_state: &HeadState,
        new_state: &HeadState,
    ) -> anyhow::Result<()> {
        if let Some(digest) = current_state.detached_digest()
            && new_state.detached_digest() != Some(digest)
        {
            self.print_position("Previous position was", digest)?;
        }

        Ok(())
    }

    fn print_detachment_notice(&self, current_state: &HeadState, new_state: &HeadState, target: &str) {
        if !current_state.is_detached() && new_state.is_detached() {
            eprintln!("Note: checking out '{}'.\n{}", target, DETACHMENT_NOTICE);
        }
    }

    fn print_new_position(
        &self,
        current_state: &HeadState,
        new_state: &HeadState,
        target_digest: &Digest,
    ) -> anyhow::Result<()> {
        match new_state {
            HeadState::Detached { .. } => self.print_position("Position is now", target_digest)?,
            HeadState::Attached(branch) if current_state == new_state => {
                eprintln!("Already on '{}'", branch)
            }
            HeadState::Attached(branch) => eprintln!("Switched to branch '{}'", branch),
        }

        Ok(())
    }

    fn print_position(&self, message: &str, digest: &Digest) -> anyhow::Result<()> {
        let commit = self.database().load_commit(digest)?;

        eprintln!("{} {} {}", message, digest.to_short(), commit.commit().title());
        Ok(())
    }
}
