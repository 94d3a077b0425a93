//! Classified failures
//!
//! Most functions return `anyhow::Result` and attach context as they go. The errors
//! below are the ones a caller needs to tell apart: they travel inside
//! `anyhow::Error` and are recovered with `downcast_ref` to pick an exit status.

use crate::artifacts::objects::digest::Digest;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeroError {
    /// No repository directory under the given root
    #[error("not a hero repository (or not initialized): {0}")]
    NotARepository(PathBuf),

    /// `init` on an existing repository
    #[error("repository already exists at {0}")]
    AlreadyInitialized(PathBuf),

    /// The reference is neither a branch, a stored commit nor the current position
    #[error("unknown reference '{0}'")]
    UnknownReference(String),

    /// An abbreviated digest matches several stored commits
    #[error("ambiguous reference '{prefix}' matches {candidates} commits")]
    AmbiguousReference { prefix: String, candidates: usize },

    #[error("invalid branch name '{0}'")]
    InvalidBranchName(String),

    #[error("object {0} not found")]
    ObjectNotFound(Digest),

    /// A staging session failed and the index was emptied
    #[error("could not stage '{path}'; the index has been emptied, please re-add your files")]
    StageFailed { path: String },

    #[error("malformed commit: {0}")]
    MalformedCommit(String),

    #[error("unrecognized repository layout version '{0}'")]
    UnknownLayoutVersion(String),
}

impl HeroError {
    pub fn exit_code(&self) -> u8 {
        match self {
            HeroError::NotARepository(_) | HeroError::AlreadyInitialized(_) => 1,
            HeroError::UnknownReference(_)
            | HeroError::AmbiguousReference { .. }
            | HeroError::InvalidBranchName(_)
            | HeroError::ObjectNotFound(_) => 2,
            HeroError::StageFailed { .. } => 3,
            HeroError::MalformedCommit(_) => 4,
            HeroError::UnknownLayoutVersion(_) => 127,
        }
    }
}

/// Exit status for a failed command: the classified status if the chain carries a
/// `HeroError`, otherwise the generic environment failure status
pub fn exit_code_of(error: &anyhow::Error) -> u8 {
    // context layers hide the classified error from `chain`, `downcast_ref` sees through them
    error
        .downcast_ref::<HeroError>()
        .or_else(|| {
            error
                .chain()
                .find_map(|cause| cause.downcast_ref::<HeroError>())
        })
        .map(HeroError::exit_code)
        .unwrap_or(1)
}
