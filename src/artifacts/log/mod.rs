//! Commit history traversal
//!
//! - `rev_list`: parent-link walk from a starting commit
//!
//! Commits carry a single parent, so history is a chain and the walk needs no
//! ordering beyond following links.

pub mod rev_list;
