//! hero: a small content-addressed version control tool
//!
//! - `areas`: the on-disk parts of a repository (object store, index, refs, workspace)
//! - `artifacts`: formats and algorithms working over those areas
//! - `commands`: the operations behind the `hero` command line

pub mod areas;
pub mod artifacts;
pub mod commands;
