//! Restoring commits to the working directory
//!
//! Checkout first removes unmodified files that only the previous position had, then
//! writes every file recorded in the target commit, verifying each write by hashing
//! the file back. Untracked content is never deleted to make room. Nothing in the
//! object store changes.

pub mod migration;

use crate::artifacts::objects::anomaly::Anomaly;

/// What to do with a working file that already matches the commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Ask the prompter; no answer keeps the file
    #[default]
    Ask,
    /// Rewrite it without asking
    Always,
}

#[derive(Debug, Default)]
pub struct CheckoutReport {
    pub written: Vec<String>,
    /// Already matching and left alone
    pub skipped: Vec<String>,
    /// Only in the previous commit and unmodified, so deleted
    pub removed: Vec<String>,
    /// Only in the previous commit but modified locally, so kept
    pub kept: Vec<String>,
    /// Not restored, paired with the untracked path standing in the way
    pub blocked: Vec<(String, String)>,
    pub anomalies: Vec<Anomaly>,
}

impl CheckoutReport {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }
}
