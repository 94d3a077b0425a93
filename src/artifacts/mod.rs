//! Data structures and algorithms
//!
//! - `branch`: branch names, reference tokens and the HEAD state machine
//! - `checkout`: restoring a commit to the working directory
//! - `core`: errors, prompts and settings shared by every command
//! - `log`: history traversal
//! - `merge`: common ancestor search and per-path merge rules
//! - `migration`: upgrades between repository layout versions
//! - `objects`: digests and the commit wire format

pub mod branch;
pub mod checkout;
pub mod core;
pub mod log;
pub mod merge;
pub mod migration;
pub mod objects;
