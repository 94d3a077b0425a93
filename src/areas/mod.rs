//! Core repository components
//!
//! - `database`: content-addressed store for commit blobs (also backs the index)
//! - `index`: staging area
//! - `refs`: branches, HEAD and the commit lock
//! - `repository`: the per-invocation context every command runs against
//! - `workspace`: working directory file system operations

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
