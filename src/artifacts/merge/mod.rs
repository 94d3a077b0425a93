//! Merging another commit's files into the working directory
//!
//! - `ancestor`: common ancestor search over parent chains
//! - `policy`: per-path decision rules
//!
//! A merge only writes files and stages them. Commits record a single parent, so
//! the user records the result with an ordinary commit.

pub mod ancestor;
pub mod policy;
