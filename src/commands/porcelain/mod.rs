//! Porcelain commands
//!
//! ## Commands
//!
//! - `init`: create a repository with a root commit and its first branch
//! - `add`: stage files
//! - `commit`: record the index as a new commit
//! - `log`: walk the history
//! - `checkout`: restore a commit and move the current position
//! - `branch`: list or create branches
//! - `merge`: merge another commit's files into the working directory and index

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod merge;
