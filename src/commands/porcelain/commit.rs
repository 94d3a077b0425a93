use crate::areas::index::Index;
use crate::areas::repository::Repository;
use crate::artifacts::branch::head_state::HeadState;
use crate::artifacts::objects::commit::{Commit, FileEntry};
use crate::artifacts::objects::digest::Digest;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

/// Where the index waits while `commit <paths>` runs
const INDEX_BACKUP_DIR: &str = "index.backup";

const TITLE_PROMPT: &str = "Commit title: ";
const MESSAGE_PROMPT: &str = "Commit message (type Ctrl-X then press enter to end):\n";

const DETACHED_COMMIT_WARNING: &str = r#"Warning: no branch was updated, you are in a detached state.
This commit can be reached in the future only through its digest:"#;

#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Asked for when missing
    pub title: Option<String>,
    pub message: Option<String>,
    /// Restage every file of the current commit first
    pub all: bool,
    /// Commit exactly these paths and leave the rest of the index staged
    pub paths: Vec<String>,
}

impl Repository {
    pub async fn commit(&mut self, options: &CommitOptions) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let index = self.index();
        let mut index = index.lock().await;

        // Load the index table from disk
        index.rehydrate()?;

        if !options.paths.is_empty() {
            return self.commit_paths(&mut index, options);
        }

        if options.all {
            self.restage_current_files(&mut index)?;
        }

        self.commit_index(&mut index, options)?;

        Ok(())
    }

    /// Record the index as a child of the current position, then empty it
    fn commit_index(&self, index: &mut Index, options: &CommitOptions) -> anyhow::Result<Digest> {
        let state = self.refs().head_state()?;
        let parent = self.refs().current_position()?;
        let (title, message) = self.commit_text(options)?;

        let files = Self::staged_files(index)?;
        let commit = Commit::new(
            Some(parent),
            self.settings().commit_timestamp(),
            &title,
            &message,
            files,
        );
        let digest = self.database().store(&commit)?;

        match &state {
            HeadState::Attached(branch) => {
                self.refs().update_branch(branch, &digest)?;

                writeln!(
                    self.writer(),
                    "[{} {}] {}",
                    branch,
                    digest.to_short(),
                    commit.title()
                )?;
            }
            HeadState::Detached { .. } => {
                eprintln!("{DETACHED_COMMIT_WARNING}");

                writeln!(
                    self.writer(),
                    "[detached HEAD {}] {}",
                    digest.to_short(),
                    commit.title()
                )?;
                writeln!(self.writer(), "{digest}")?;
            }
        }

        index.clear()?;
        index.write_updates()?;

        Ok(digest)
    }

    /// File records for every staged path, each distinct content read once
    fn staged_files(index: &Index) -> anyhow::Result<Vec<FileEntry>> {
        let mut files = Vec::new();

        for (digest, paths) in index.commit_map() {
            let content = index.staged_content(digest)?;
            for path in paths {
                files.push(FileEntry::new(path.clone(), digest.clone(), content.clone()));
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(files)
    }

    fn commit_text(&self, options: &CommitOptions) -> anyhow::Result<(String, String)> {
        let title = match &options.title {
            Some(title) => title.clone(),
            None => self.prompter().read_line(TITLE_PROMPT)?,
        };
        if title.trim().is_empty() {
            anyhow::bail!("aborting commit due to empty title");
        }

        // a title given on the command line means no message unless one is given too
        let message = match (&options.title, &options.message) {
            (_, Some(message)) => message.clone(),
            (Some(_), None) => String::new(),
            (None, None) => self.prompter().read_text(MESSAGE_PROMPT)?,
        };

        Ok((title.trim().to_string(), message))
    }

    /// Stage again every file the current commit records that still exists
    fn restage_current_files(&self, index: &mut Index) -> anyhow::Result<()> {
        let position = self.refs().current_position()?;
        let current = self.database().load_commit(&position)?;

        let paths = current
            .commit()
            .files()
            .iter()
            .map(|entry| entry.path.clone())
            .filter(|path| {
                self.workspace()
                    .full_path(path)
                    .is_ok_and(|full_path| full_path.is_file())
            })
            .collect::<Vec<_>>();

        let staged = index.stage(self.workspace(), &paths);
        index.write_updates()?;
        staged?;

        Ok(())
    }

    /// Commit exactly `options.paths`
    ///
    /// The index is moved aside while the paths are staged and committed on their
    /// own, then put back (also on failure) without the committed paths.
    fn commit_paths(&self, index: &mut Index, options: &CommitOptions) -> anyhow::Result<()> {
        let index_path = index.path().to_path_buf();
        let backup_path = self.hero_path().join(INDEX_BACKUP_DIR);

        if backup_path.exists() {
            tracing::warn!("discarding stale index backup at {:?}", backup_path);
            std::fs::remove_dir_all(&backup_path)
                .with_context(|| format!("failed to remove stale backup {:?}", backup_path))?;
        }

        std::fs::rename(&index_path, &backup_path)
            .with_context(|| format!("failed to back up the index to {:?}", backup_path))?;
        std::fs::create_dir_all(&index_path)
            .with_context(|| format!("failed to create index directory at {:?}", index_path))?;
        index.rehydrate()?;

        let committed = self.commit_only(index, options);
        let restored = Self::restore_index(index, &index_path, &backup_path);

        let committed = committed?;
        restored.context("failed to restore the index; the backup is kept in .hero/index.backup")?;

        for path in &committed {
            index.remove(path)?;
        }
        index.write_updates()?;

        Ok(())
    }

    fn commit_only(
        &self,
        index: &mut Index,
        options: &CommitOptions,
    ) -> anyhow::Result<Vec<String>> {
        let staged = index.stage(self.workspace(), &options.paths)?;
        self.commit_index(index, options)?;

        Ok(staged.into_iter().map(|(path, _)| path).collect())
    }

    fn restore_index(index: &mut Index, index_path: &Path, backup_path: &Path) -> anyhow::Result<()> {
        std::fs::remove_dir_all(index_path)
            .with_context(|| format!("failed to remove index directory at {:?}", index_path))?;
        std::fs::rename(backup_path, index_path)
            .with_context(|| format!("failed to move {:?} back into place", backup_path))?;

        index.rehydrate()
    }
}
