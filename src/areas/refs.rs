//! Branches and the current position
//!
//! ## Files
//!
//! - `HEAD`: the attached (or last attached) branch name
//! - `branches/<name>`: the branch head digest
//! - `COMMIT_LOCK`: present only while detached, holds the detached digest
//!
//! Every file holds a single line. Writes take an exclusive lock on the file.

use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::head_state::HeadState;
use crate::artifacts::core::error::HeroError;
use crate::artifacts::objects::digest::Digest;
use anyhow::Context;
use derive_new::new;
use file_guard::Lock;
use std::io::Write;
use std::ops::DerefMut;
use std::path::Path;
use walkdir::WalkDir;

const HEAD_FILE: &str = "HEAD";
const BRANCHES_DIR: &str = "branches";
const COMMIT_LOCK_FILE: &str = "COMMIT_LOCK";

#[derive(Debug, new)]
pub struct Refs {
    /// Path to the repository directory (typically `.hero`)
    path: Box<Path>,
}

impl Refs {
    pub fn head_state(&self) -> anyhow::Result<HeadState> {
        let branch = self.read_head()?;

        match self.read_commit_lock()? {
            Some(digest) => Ok(HeadState::Detached { branch, digest }),
            None => Ok(HeadState::Attached(branch)),
        }
    }

    /// Digest of the current position
    pub fn current_position(&self) -> anyhow::Result<Digest> {
        let state = self.head_state()?;

        match state.detached_digest() {
            Some(digest) => Ok(digest.clone()),
            None => self.head_of(state.branch()),
        }
    }

    pub fn read_head(&self) -> anyhow::Result<BranchName> {
        let content = std::fs::read_to_string(self.head_path())
            .with_context(|| format!("failed to read HEAD at {:?}", self.head_path()))?;

        BranchName::try_parse(content.trim()).context("HEAD does not name a branch")
    }

    /// Attach HEAD to `branch` and drop the commit lock
    pub fn attach(&self, branch: &BranchName) -> anyhow::Result<()> {
        self.update_ref_file(&self.head_path(), branch.as_ref())?;
        self.clear_detached()
    }

    /// Detach at `digest`, leaving HEAD untouched
    pub fn detach(&self, digest: &Digest) -> anyhow::Result<()> {
        self.update_ref_file(&self.commit_lock_path(), digest.as_ref())
    }

    pub fn clear_detached(&self) -> anyhow::Result<()> {
        let lock_path = self.commit_lock_path();

        if lock_path.exists() {
            std::fs::remove_file(&lock_path)
                .with_context(|| format!("failed to remove commit lock at {:?}", lock_path))?;
        }

        Ok(())
    }

    pub fn set_head_state(&self, state: &HeadState) -> anyhow::Result<()> {
        match state {
            HeadState::Attached(branch) => self.attach(branch),
            HeadState::Detached { branch, digest } => {
                self.update_ref_file(&self.head_path(), branch.as_ref())?;
                self.detach(digest)
            }
        }
    }

    fn read_commit_lock(&self) -> anyhow::Result<Option<Digest>> {
        let lock_path = self.commit_lock_path();

        if !lock_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&lock_path)
            .with_context(|| format!("failed to read commit lock at {:?}", lock_path))?;

        Digest::try_parse(&content)
            .map(Some)
            .with_context(|| format!("commit lock at {:?} holds no digest", lock_path))
    }

    /// Whether `name` exists
    ///
    /// Fails if the branch directory itself cannot be read, rather than treating
    /// every name as absent.
    pub fn branch_exists(&self, name: &BranchName) -> anyhow::Result<bool> {
        std::fs::read_dir(self.branches_path()).with_context(|| {
            format!(
                "failed to read branch directory at {:?}",
                self.branches_path()
            )
        })?;

        Ok(self.branch_path(name).is_file())
    }

    pub fn head_of(&self, name: &BranchName) -> anyhow::Result<Digest> {
        if !self.branch_exists(name)? {
            return Err(HeroError::UnknownReference(name.to_string()).into());
        }

        let branch_path = self.branch_path(name);
        let content = std::fs::read_to_string(&branch_path)
            .with_context(|| format!("failed to read branch file at {:?}", branch_path))?;

        Digest::try_parse(&content)
            .with_context(|| format!("branch {name} does not hold a digest"))
    }

    /// Write a branch head, creating or overwriting it
    pub fn create_branch(&self, name: &BranchName, digest: &Digest) -> anyhow::Result<()> {
        self.update_ref_file(&self.branch_path(name), digest.as_ref())
    }

    /// Advance an existing branch
    pub fn update_branch(&self, name: &BranchName, digest: &Digest) -> anyhow::Result<()> {
        if !self.branch_exists(name)? {
            return Err(HeroError::UnknownReference(name.to_string()).into());
        }

        self.update_ref_file(&self.branch_path(name), digest.as_ref())
    }

    /// All branches, sorted by name
    pub fn list_branches(&self) -> anyhow::Result<Vec<BranchName>> {
        let branches_path = self.branches_path();
        let mut branches = Vec::new();

        for entry in WalkDir::new(&branches_path) {
            let entry = entry.with_context(|| {
                format!("failed to read branch directory at {:?}", branches_path)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative_path = entry.path().strip_prefix(&branches_path)?;
            let name = relative_path
                .components()
                .map(|component| component.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            match BranchName::try_parse(name.as_str()) {
                Ok(name) => branches.push(name),
                Err(_) => tracing::warn!("ignoring stray file {:?} among branches", entry.path()),
            }
        }

        branches.sort();
        Ok(branches)
    }

    /// Branches whose head is `digest`, sorted by name
    pub fn branches_at(&self, digest: &Digest) -> anyhow::Result<Vec<BranchName>> {
        let mut branches = Vec::new();

        for name in self.list_branches()? {
            if &self.head_of(&name)? == digest {
                branches.push(name);
            }
        }

        Ok(branches)
    }

    /// Human name for a digest: the attached branch if its head matches, then any
    /// branch at that digest, then the digest itself
    pub fn normalize(&self, digest: &Digest) -> anyhow::Result<String> {
        let state = self.head_state()?;

        if !state.is_detached() && &self.head_of(state.branch())? == digest {
            return Ok(state.branch().to_string());
        }

        Ok(self
            .branches_at(digest)?
            .into_iter()
            .next()
            .map(|name| name.to_string())
            .unwrap_or_else(|| digest.to_string()))
    }

    fn update_ref_file(&self, path: &Path, content: &str) -> anyhow::Result<()> {
        // create all the parent directories if they don't exist
        std::fs::create_dir_all(path.parent().with_context(|| {
            format!(
                "failed to create parent directories for ref file at {:?}",
                path
            )
        })?)?;

        let mut ref_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to open ref file at {:?}", path))?;
        let mut lock = file_guard::lock(&mut ref_file, Lock::Exclusive, 0, 1)?;
        writeln!(lock.deref_mut(), "{content}")?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn head_path(&self) -> Box<Path> {
        self.path.join(HEAD_FILE).into_boxed_path()
    }

    pub fn commit_lock_path(&self) -> Box<Path> {
        self.path.join(COMMIT_LOCK_FILE).into_boxed_path()
    }

    pub fn branches_path(&self) -> Box<Path> {
        self.path.join(BRANCHES_DIR).into_boxed_path()
    }

    fn branch_path(&self, name: &BranchName) -> Box<Path> {
        self.branches_path().join(name.as_ref()).into_boxed_path()
    }
}
