//! Common ancestor search
//!
//! Every commit has at most one parent, so each history is a chain. The common
//! ancestor of two commits is the first commit on the target's chain that also lies
//! on the source's chain.
//!
//! Set the `debug_merge` feature to log the walk.

use crate::artifacts::objects::digest::Digest;
use std::collections::HashSet;

/// Logs the search when the `debug_merge` feature is enabled
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "debug_merge")]
        {
            tracing::debug!($($arg)*);
        }
    };
}

pub struct AncestorFinder<F>
where
    F: Fn(&Digest) -> anyhow::Result<Option<Digest>>,
{
    /// Parent of a commit
    parent_of: F,
}

impl<F> AncestorFinder<F>
where
    F: Fn(&Digest) -> anyhow::Result<Option<Digest>>,
{
    pub fn new(parent_of: F) -> Self {
        AncestorFinder { parent_of }
    }

    pub fn find_common_ancestor(
        &self,
        source: &Digest,
        target: &Digest,
    ) -> anyhow::Result<Option<Digest>> {
        let source_chain = self.chain(source)?;
        debug_log!("source chain holds {} commits", source_chain.len());

        let mut seen = HashSet::new();
        let mut current = Some(target.clone());
        while let Some(digest) = current {
            if source_chain.contains(&digest) {
                debug_log!("common ancestor found: {digest}");
                return Ok(Some(digest));
            }
            if !seen.insert(digest.clone()) {
                break;
            }

            debug_log!("{digest} is not on the source chain");
            current = (self.parent_of)(&digest)?;
        }

        Ok(None)
    }

    fn chain(&self, start: &Digest) -> anyhow::Result<HashSet<Digest>> {
        let mut chain = HashSet::new();
        let mut current = Some(start.clone());

        while let Some(digest) = current {
            if !chain.insert(digest.clone()) {
                break;
            }
            current = (self.parent_of)(&digest)?;
        }

        Ok(chain)
    }
}
