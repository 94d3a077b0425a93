use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::reference::Reference;
use crate::artifacts::objects::digest::Digest;

/// Where the current position is
///
/// HEAD always names a branch. While detached, the position is the digest held in
/// the commit lock instead of that branch's head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    Attached(BranchName),
    Detached { branch: BranchName, digest: Digest },
}

impl HeadState {
    /// The attached (or last attached) branch
    pub fn branch(&self) -> &BranchName {
        match self {
            HeadState::Attached(branch) => branch,
            HeadState::Detached { branch, .. } => branch,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, HeadState::Detached { .. })
    }

    pub fn detached_digest(&self) -> Option<&Digest> {
        match self {
            HeadState::Attached(_) => None,
            HeadState::Detached { digest, .. } => Some(digest),
        }
    }

    /// State after checking out `reference`
    ///
    /// `branch_head` is the head of the HEAD branch. A detached position equal to it
    /// collapses back to the attached state.
    pub fn after_checkout(&self, reference: &Reference, branch_head: &Digest) -> HeadState {
        let branch = self.branch().clone();

        match reference {
            Reference::CurrentPosition => match self {
                HeadState::Detached { digest, .. } if digest != branch_head => self.clone(),
                _ => HeadState::Attached(branch),
            },
            Reference::Named(name) => HeadState::Attached(name.clone()),
            Reference::Raw(digest) if digest == branch_head => HeadState::Attached(branch),
            Reference::Raw(digest) => HeadState::Detached {
                branch,
                digest: digest.clone(),
            },
        }
    }
}
