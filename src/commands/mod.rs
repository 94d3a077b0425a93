//! Command implementations
//!
//! - `plumbing`: low-level access to digests and stored commits (hash-object, cat-file)
//! - `porcelain`: the everyday workflow (init, add, commit, log, checkout, branch, merge)
//!
//! Every command is an `async fn` on `Repository` and writes its output through the
//! repository writer.

pub mod plumbing;
pub mod porcelain;
