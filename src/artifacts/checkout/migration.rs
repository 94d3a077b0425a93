use crate::areas::workspace::Workspace;
use crate::artifacts::checkout::{CheckoutReport, OverwritePolicy};
use crate::artifacts::core::prompt::Prompter;
use crate::artifacts::objects::anomaly::Anomaly;
use crate::artifacts::objects::commit::{Commit, DecodedCommit, FileEntry};
use std::collections::HashSet;

/// Moves the working directory from one commit to another
pub struct Migration<'r> {
    workspace: &'r Workspace,
    prompter: &'r mut dyn Prompter,
    policy: OverwritePolicy,
    report: CheckoutReport,
}

impl<'r> Migration<'r> {
    pub fn new(
        workspace: &'r Workspace,
        prompter: &'r mut dyn Prompter,
        policy: OverwritePolicy,
    ) -> Self {
        Migration {
            workspace,
            prompter,
            policy,
            report: CheckoutReport::default(),
        }
    }

    /// Clear out what only `previous` recorded, then restore `target`
    ///
    /// Every recorded path is checked before the first change, so a commit naming a
    /// path outside the repository leaves the working directory untouched.
    pub fn apply_changes(
        mut self,
        target: &DecodedCommit,
        previous: Option<&Commit>,
    ) -> anyhow::Result<CheckoutReport> {
        let recorded = target
            .commit()
            .files()
            .iter()
            .chain(previous.into_iter().flat_map(|commit| commit.files()));
        for entry in recorded {
            self.workspace.full_path(&entry.path)?;
        }

        if let Some(previous) = previous {
            self.remove_stale_files(target.commit(), previous)?;
        }

        let mut records_read = 0;
        let mut bytes_read = 0;

        for entry in target.commit().files() {
            self.restore_file(entry)?;
            records_read += 1;
            bytes_read += entry.size();
        }

        // decoding already warned about these, the report keeps them for the caller
        self.report
            .anomalies
            .extend(target.footer().compare(records_read, bytes_read));

        Ok(self.report)
    }

    fn restore_file(&mut self, entry: &FileEntry) -> anyhow::Result<()> {
        if let Some(blocker) = self.workspace.blocker_of(&entry.path)? {
            tracing::warn!("not restoring {}, {} is in the way", entry.path, blocker);
            self.report.blocked.push((entry.path.clone(), blocker));
            return Ok(());
        }

        let current = self.workspace.digest_of(&entry.path)?;

        if current.as_ref() == Some(&entry.digest) && !self.should_overwrite(&entry.path)? {
            self.report.skipped.push(entry.path.clone());
            return Ok(());
        }

        self.workspace.write_file(&entry.path, &entry.content)?;

        // read the file back to catch bad records and bad writes alike
        let written = self.workspace.digest_of(&entry.path)?;
        match written {
            Some(computed) if computed != entry.digest => {
                let anomaly = Anomaly::ChecksumMismatch {
                    path: entry.path.clone(),
                    recorded: entry.digest.clone(),
                    computed,
                };
                anomaly.warn();
                self.report.anomalies.push(anomaly);
            }
            Some(_) => {}
            None => anyhow::bail!("{} vanished right after being written", entry.path),
        }

        self.report.written.push(entry.path.clone());
        Ok(())
    }

    fn should_overwrite(&mut self, path: &str) -> anyhow::Result<bool> {
        match self.policy {
            OverwritePolicy::Always => Ok(true),
            OverwritePolicy::Ask => self
                .prompter
                .confirm(&format!("'{path}' already matches. Overwrite it anyway?"), false),
        }
    }

    fn remove_stale_files(&mut self, target: &Commit, previous: &Commit) -> anyhow::Result<()> {
        let target_paths = target
            .files()
            .iter()
            .map(|entry| entry.path.as_str())
            .collect::<HashSet<_>>();

        for entry in previous.files() {
            if target_paths.contains(entry.path.as_str()) {
                continue;
            }

            match self.workspace.digest_of(&entry.path)? {
                Some(digest) if digest == entry.digest => {
                    self.workspace.remove_file(&entry.path)?;
                    self.report.removed.push(entry.path.clone());
                }
                Some(_) => self.report.kept.push(entry.path.clone()),
                None => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::core::error::HeroError;
    use crate::artifacts::core::prompt::ScriptedPrompter;
    use crate::artifacts::objects::digest::Digest;
    use crate::artifacts::objects::object::{Packable, Unpackable};
    use assert_fs::TempDir;
    use bytes::Bytes;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn workspace(dir: &TempDir) -> Workspace {
        Workspace::new(dir.path().canonicalize().unwrap().into_boxed_path())
    }

    fn entry(path: &str, content: &'static [u8]) -> FileEntry {
        FileEntry::new(
            path.to_string(),
            Digest::of(content),
            Bytes::from_static(content),
        )
    }

    fn decoded(files: Vec<FileEntry>) -> DecodedCommit {
        let commit = Commit::new(None, Utc::now(), "t", "", files);
        DecodedCommit::deserialize(commit.serialize().unwrap()).unwrap()
    }

    #[test]
    fn restores_nested_files_byte_for_byte() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);
        let mut prompter = ScriptedPrompter::default();
        let target = decoded(vec![entry("a.txt", b"hi"), entry("x/y/z.bin", b"\x00&&&\xff")]);

        let report = Migration::new(&workspace, &mut prompter, OverwritePolicy::Ask)
            .apply_changes(&target, None)
            .unwrap();

        assert_eq!(report.written, vec!["a.txt", "x/y/z.bin"]);
        assert!(report.is_clean());
        assert_eq!(
            workspace.read_file("x/y/z.bin").unwrap(),
            Bytes::from_static(b"\x00&&&\xff")
        );
    }

    #[test]
    fn matching_files_are_skipped_unless_forced_or_confirmed() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);
        workspace.write_file("a.txt", b"hi").unwrap();
        let target = decoded(vec![entry("a.txt", b"hi")]);

        let mut prompter = ScriptedPrompter::default();
        let report = Migration::new(&workspace, &mut prompter, OverwritePolicy::Ask)
            .apply_changes(&target, None)
            .unwrap();
        assert_eq!(report.skipped, vec!["a.txt"]);
        assert_eq!(prompter.asked().len(), 1);

        let mut prompter = ScriptedPrompter::new(["y"]);
        let report = Migration::new(&workspace, &mut prompter, OverwritePolicy::Ask)
            .apply_changes(&target, None)
            .unwrap();
        assert_eq!(report.written, vec!["a.txt"]);

        let mut prompter = ScriptedPrompter::default();
        let report = Migration::new(&workspace, &mut prompter, OverwritePolicy::Always)
            .apply_changes(&target, None)
            .unwrap();
        assert_eq!(report.written, vec!["a.txt"]);
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn records_that_do_not_match_their_checksum_are_flagged() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);
        let mut prompter = ScriptedPrompter::default();
        let forged = FileEntry::new(
            "a.txt".to_string(),
            Digest::of("something else"),
            Bytes::from_static(b"hi"),
        );
        let target = decoded(vec![forged]);

        let report = Migration::new(&workspace, &mut prompter, OverwritePolicy::Ask)
            .apply_changes(&target, None)
            .unwrap();

        assert_eq!(report.written, vec!["a.txt"]);
        assert!(matches!(
            report.anomalies.as_slice(),
            [Anomaly::ChecksumMismatch { path, .. }] if path == "a.txt"
        ));
    }

    #[test]
    fn files_only_in_the_previous_commit_are_removed_unless_modified() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);
        workspace.write_file("gone/a.txt", b"a").unwrap();
        workspace.write_file("edited.txt", b"local edit").unwrap();
        let previous = Commit::new(
            None,
            Utc::now(),
            "prev",
            "",
            vec![entry("gone/a.txt", b"a"), entry("edited.txt", b"committed")],
        );
        let target = decoded(vec![]);
        let mut prompter = ScriptedPrompter::default();

        let report = Migration::new(&workspace, &mut prompter, OverwritePolicy::Ask)
            .apply_changes(&target, Some(&previous))
            .unwrap();

        assert_eq!(report.removed, vec!["gone/a.txt"]);
        assert_eq!(report.kept, vec!["edited.txt"]);
        assert!(!workspace.full_path("gone").unwrap().exists());
    }

    #[test]
    fn untracked_content_in_the_way_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);
        workspace.write_file("a/precious.txt", b"mine").unwrap();
        let target = decoded(vec![entry("a", b"file"), entry("b.txt", b"b")]);
        let mut prompter = ScriptedPrompter::default();

        let report = Migration::new(&workspace, &mut prompter, OverwritePolicy::Always)
            .apply_changes(&target, None)
            .unwrap();

        assert_eq!(report.blocked, vec![("a".to_string(), "a".to_string())]);
        assert_eq!(report.written, vec!["b.txt"]);
        assert_eq!(
            workspace.read_file("a/precious.txt").unwrap(),
            Bytes::from_static(b"mine")
        );
    }

    #[test]
    fn stale_files_make_room_for_restored_ones() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);
        workspace.write_file("a/b.txt", b"b").unwrap();
        let previous = Commit::new(None, Utc::now(), "prev", "", vec![entry("a/b.txt", b"b")]);
        let target = decoded(vec![entry("a", b"file")]);
        let mut prompter = ScriptedPrompter::default();

        let report = Migration::new(&workspace, &mut prompter, OverwritePolicy::Ask)
            .apply_changes(&target, Some(&previous))
            .unwrap();

        assert_eq!(report.removed, vec!["a/b.txt"]);
        assert_eq!(report.written, vec!["a"]);
        assert!(report.blocked.is_empty());
        assert_eq!(workspace.read_file("a").unwrap(), Bytes::from_static(b"file"));
    }

    #[test]
    fn paths_outside_the_repository_abort_before_any_change() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("repo");
        std::fs::create_dir(&root).unwrap();
        let workspace = Workspace::new(root.canonicalize().unwrap().into_boxed_path());
        let target = decoded(vec![entry("a.txt", b"hi"), entry("../escaped.txt", b"out")]);
        let mut prompter = ScriptedPrompter::default();

        let error = Migration::new(&workspace, &mut prompter, OverwritePolicy::Always)
            .apply_changes(&target, None)
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<HeroError>(),
            Some(HeroError::MalformedCommit(_))
        ));
        assert!(!dir.path().join("escaped.txt").exists());
        assert!(!root.join("a.txt").exists());
    }
}
