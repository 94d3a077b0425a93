//! Staging area
//!
//! The index records which working files go into the next commit. Staged content is
//! copied into a blob store under `index/`, so later edits to the working files do
//! not change what gets committed.
//!
//! ## File Format
//!
//! `index/map` holds one record per line, `<path>,<digest>`. Paths may contain
//! commas, so a record is split at its last comma.
//!
//! ## Data Structures
//!
//! - `entries`: path to digest
//! - `commit_map`: digest to the set of paths staged with that content
//!
//! Both views always hold the same pairs. Content staged from several paths is
//! stored and read once.

use crate::areas::database::Database;
use crate::areas::workspace::Workspace;
use crate::artifacts::core::error::HeroError;
use crate::artifacts::objects::anomaly::Anomaly;
use crate::artifacts::objects::digest::Digest;
use anyhow::Context;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Read, Write};
use std::ops::DerefMut;
use std::path::Path;

const MAP_FILE: &str = "map";

#[derive(Debug)]
pub struct Index {
    /// Path to the index directory (typically `.hero/index`)
    path: Box<Path>,
    /// Staged blobs
    store: Database,
    entries: BTreeMap<String, Digest>,
    commit_map: BTreeMap<Digest, BTreeSet<String>>,
    /// Flag indicating if the index has been modified since loading
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        let store = Database::new(path.clone());

        Index {
            path,
            store,
            entries: BTreeMap::new(),
            commit_map: BTreeMap::new(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn map_path(&self) -> Box<Path> {
        self.path.join(MAP_FILE).into_boxed_path()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn entry_by_path(&self, path: &str) -> Option<&Digest> {
        self.entries.get(path)
    }

    /// Staged pairs in path order
    pub fn entries(&self) -> impl Iterator<Item = (&String, &Digest)> {
        self.entries.iter()
    }

    /// Staged pairs grouped by content, in digest order
    pub fn commit_map(&self) -> &BTreeMap<Digest, BTreeSet<String>> {
        &self.commit_map
    }

    /// Read staged content back from the index store
    pub fn staged_content(&self, digest: &Digest) -> anyhow::Result<Bytes> {
        self.store.get(digest)
    }

    /// Load the index table from disk
    ///
    /// # Locking
    ///
    /// Acquires a shared lock on the table during reading.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.entries.clear();
        self.commit_map.clear();
        self.changed = false;

        let map_path = self.map_path();
        if !map_path.exists() {
            return Ok(());
        }

        let mut map_file = std::fs::OpenOptions::new()
            .read(true)
            .open(&map_path)
            .with_context(|| format!("failed to open index table at {:?}", map_path))?;
        let mut lock = file_guard::lock(&mut map_file, file_guard::Lock::Shared, 0, 1)?;

        let mut content = String::new();
        lock.deref_mut()
            .read_to_string(&mut content)
            .with_context(|| format!("failed to read index table at {:?}", map_path))?;

        for (number, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }

            let (path, digest) = Self::parse_record(line)
                .with_context(|| format!("invalid index record on line {}", number + 1))?;
            self.store_entry(path, digest);
        }

        Ok(())
    }

    fn parse_record(line: &str) -> anyhow::Result<(String, Digest)> {
        let (path, digest) = line
            .rsplit_once(',')
            .ok_or_else(|| anyhow::anyhow!("missing ',' in '{line}'"))?;

        if path.is_empty() {
            anyhow::bail!("empty path in '{line}'");
        }

        Ok((path.to_string(), Digest::try_parse(digest)?))
    }

    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.path)
            .with_context(|| format!("failed to create index directory at {:?}", self.path))?;

        let map_path = self.map_path();
        let mut map_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&map_path)
            .with_context(|| format!("failed to open index table at {:?}", map_path))?;
        let mut lock = file_guard::lock(&mut map_file, file_guard::Lock::Exclusive, 0, 1)?;

        let mut table = String::new();
        for (path, digest) in &self.entries {
            table.push_str(&format!("{path},{digest}\n"));
        }
        lock.deref_mut().write_all(table.as_bytes())?;

        self.changed = false;

        Ok(())
    }

    /// Stage every file under `paths`
    ///
    /// Either every file is staged or the index is emptied and `StageFailed` names the
    /// path that could not be staged.
    pub fn stage(
        &mut self,
        workspace: &Workspace,
        paths: &[impl AsRef<Path>],
    ) -> anyhow::Result<Vec<(String, Digest)>> {
        let mut staged = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let result = workspace
                .list_files(path)
                .and_then(|files| self.stage_files(workspace, &files));

            match result {
                Ok(files) => staged.extend(files),
                Err(error) => return Err(self.fail(error, &path.to_string_lossy())),
            }
        }

        Ok(staged)
    }

    /// Stage recorded content for each path, with the same all-or-nothing rule as
    /// [`Index::stage`]
    pub fn stage_recorded<'a>(
        &mut self,
        entries: impl IntoIterator<Item = (&'a str, &'a Bytes)>,
    ) -> anyhow::Result<Vec<(String, Digest)>> {
        let mut staged = Vec::new();

        for (path, content) in entries {
            match self.stage_content(path, content) {
                Ok(digest) => staged.push((path.to_string(), digest)),
                Err(error) => return Err(self.fail(error, path)),
            }
        }

        Ok(staged)
    }

    fn fail(&mut self, error: anyhow::Error, path: &str) -> anyhow::Error {
        let failed_path = match error.downcast_ref::<StagedPath>() {
            Some(StagedPath(file)) => file.clone(),
            None => path.to_string(),
        };

        if let Err(clear_error) = self.clear() {
            return clear_error.context("failed to empty the index");
        }

        error.context(HeroError::StageFailed { path: failed_path })
    }

    fn stage_files(
        &mut self,
        workspace: &Workspace,
        files: &[String],
    ) -> anyhow::Result<Vec<(String, Digest)>> {
        let mut staged = Vec::new();

        for file in files {
            let digest = self
                .stage_file(workspace, file)
                .with_context(|| StagedPath(file.clone()))?;
            staged.push((file.clone(), digest));
        }

        Ok(staged)
    }

    fn stage_file(&mut self, workspace: &Workspace, file: &str) -> anyhow::Result<Digest> {
        let content = workspace.read_file(file)?;
        self.stage_content(file, &content)
    }

    fn stage_content(&mut self, file: &str, content: &Bytes) -> anyhow::Result<Digest> {
        let digest = self.store.put(content)?;

        // the staged copy must be what was read
        let staged = self.store.get(&digest)?;
        if staged != *content {
            Anomaly::ChecksumMismatch {
                path: file.to_string(),
                recorded: digest.clone(),
                computed: Digest::of(&staged),
            }
            .warn();
        }

        if let Some(orphan) = self.remove_entry(file)
            && orphan != digest
        {
            self.store.delete(&orphan)?;
        }
        self.store_entry(file.to_string(), digest.clone());
        self.changed = true;

        Ok(digest)
    }

    fn store_entry(&mut self, path: String, digest: Digest) {
        self.commit_map
            .entry(digest.clone())
            .or_default()
            .insert(path.clone());
        self.entries.insert(path, digest);
    }

    /// Drop a pair from both views, returning the digest that is no longer referenced
    fn remove_entry(&mut self, path: &str) -> Option<Digest> {
        let digest = self.entries.remove(path)?;

        if let Some(paths) = self.commit_map.get_mut(&digest) {
            paths.remove(path);
            if paths.is_empty() {
                self.commit_map.remove(&digest);
                return Some(digest);
            }
        }

        None
    }

    /// Unstage one path
    pub fn remove(&mut self, path: &str) -> anyhow::Result<()> {
        if let Some(orphan) = self.remove_entry(path) {
            self.store.delete(&orphan)?;
        }

        self.changed = true;
        Ok(())
    }

    /// Empty both views and remove every staged blob
    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.entries.clear();
        self.commit_map.clear();
        self.store.purge()?;
        self.changed = true;

        Ok(())
    }
}

/// Marks the file being staged when an error occurred
#[derive(Debug)]
struct StagedPath(String);

impl std::fmt::Display for StagedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to stage {}", self.0)
    }
}
