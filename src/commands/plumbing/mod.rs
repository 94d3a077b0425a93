//! Plumbing commands
//!
//! ## Commands
//!
//! - `hash-object`: print the digest of a file
//! - `cat-file`: print a stored commit and its integrity status

pub mod cat_file;
pub mod hash_object;
