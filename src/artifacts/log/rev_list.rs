use crate::areas::database::Database;
use crate::artifacts::objects::commit::DecodedCommit;
use crate::artifacts::objects::digest::Digest;
use std::collections::HashSet;
use std::rc::Rc;

/// Walks parent links from a starting commit back to the root
///
/// Yields `(digest, commit)` pairs, newest first. A digest seen twice ends the walk,
/// so a corrupted parent link cannot loop forever.
pub struct RevList<'r> {
    database: &'r Database,
    next: Option<Digest>,
    seen: HashSet<Digest>,
}

impl<'r> RevList<'r> {
    pub fn new(database: &'r Database, start: Digest) -> Self {
        RevList {
            database,
            next: Some(start),
            seen: HashSet::new(),
        }
    }
}

impl Iterator for RevList<'_> {
    type Item = anyhow::Result<(Digest, Rc<DecodedCommit>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let digest = self.next.take()?;

        if !self.seen.insert(digest.clone()) {
            tracing::warn!("history loops back to {digest}, stopping");
            return None;
        }

        match self.database.load_commit(&digest) {
            Ok(commit) => {
                self.next = commit.commit().parent().cloned();
                Some(Ok((digest, commit)))
            }
            Err(error) => Some(Err(error)),
        }
    }
}
