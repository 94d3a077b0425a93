use crate::areas::repository::Repository;
use crate::artifacts::branch::reference::Reference;
use crate::artifacts::merge::ancestor::AncestorFinder;
use crate::artifacts::merge::policy::{self, MergeDecision};
use crate::artifacts::objects::commit::FileEntry;
use crate::artifacts::objects::digest::Digest;
use std::collections::BTreeSet;
use std::io::Write;

#[derive(Debug, Default)]
struct MergeSummary {
    kept: usize,
    taken: usize,
    removed: usize,
}

impl Repository {
    /// Merge the files of `target` into the working directory and the index
    ///
    /// Nothing is committed: the result is staged for an ordinary commit.
    pub async fn merge(&mut self, target: &str) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let reference = Reference::parse(target, self.refs(), self.database())?;
        let theirs_digest = reference.resolve(self.refs())?;
        let ours_digest = self.refs().current_position()?;
        let theirs = self.database().load_commit(&theirs_digest)?;
        let ours = self.database().load_commit(&ours_digest)?;

        let finder = AncestorFinder::new(|digest: &Digest| {
            Ok(self.database().load_commit(digest)?.commit().parent().cloned())
        });
        let ancestor_digest = finder.find_common_ancestor(&ours_digest, &theirs_digest)?;

        if ancestor_digest.as_ref() == Some(&theirs_digest) {
            writeln!(self.writer(), "Already up to date.")?;
            return Ok(());
        }
        let ancestor = match &ancestor_digest {
            Some(digest) => Some(self.database().load_commit(digest)?),
            None => None,
        };

        let paths = ours
            .commit()
            .files()
            .iter()
            .chain(theirs.commit().files())
            .map(|entry| entry.path.as_str())
            .collect::<BTreeSet<_>>();

        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        let mut summary = MergeSummary::default();
        let mut to_stage = Vec::new();

        for path in &paths {
            self.workspace().full_path(path)?;
        }

        for path in paths {
            let base = ancestor
                .as_ref()
                .and_then(|ancestor| ancestor.commit().file(path))
                .map(|entry| &entry.digest);
            let our_entry = ours.commit().file(path);
            let their_entry = theirs.commit().file(path);

            let take_theirs = match policy::decide(
                base,
                our_entry.map(|entry| &entry.digest),
                their_entry.map(|entry| &entry.digest),
            ) {
                MergeDecision::Ours => false,
                MergeDecision::Theirs => true,
                MergeDecision::Ask => {
                    let question = format!("'{path}' changed on both sides. Keep our version?");
                    !self.prompter().confirm(&question, true)?
                }
            };

            let taken: Option<&FileEntry> = if take_theirs { their_entry } else { our_entry };
            match taken {
                Some(entry) => {
                    if take_theirs {
                        self.workspace().write_file(path, &entry.content)?;
                        summary.taken += 1;
                    } else {
                        summary.kept += 1;
                    }

                    // the committed bytes, whatever the working file holds now
                    to_stage.push((path, &entry.content));
                }
                None => {
                    self.workspace().remove_file(path)?;
                    index.remove(path)?;
                    summary.removed += 1;
                }
            }
        }

        let staged = index.stage_recorded(to_stage);
        index.write_updates()?;
        staged?;

        writeln!(
            self.writer(),
            "Merged {} into {}: {} taken, {} kept, {} removed",
            target,
            self.refs().normalize(&ours_digest)?,
            summary.taken,
            summary.kept,
            summary.removed
        )?;
        writeln!(self.writer(), "The result is staged; commit to record it.")?;

        Ok(())
    }
}
