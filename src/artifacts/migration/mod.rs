//! Repository layout upgrades
//!
//! ## Layout versions
//!
//! - `0.02.1`: repository directory is `.vcs`
//! - `0.02.2`: repository directory is `.hero`, HEAD holds a commit digest and staged
//!   files sit in `index/` under their own paths
//! - `0.03.0`: HEAD names a branch under `branches/`, staged blobs are keyed by
//!   digest and listed in `index/map`
//!
//! An upgrade runs every step from the named version up to the current one. Each
//! step checks the layout before touching it, so running an upgrade twice (or
//! against a current repository) changes nothing.

use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::repository::REPOSITORY_DIR;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::DEFAULT_BRANCH;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::HeroError;
use crate::artifacts::objects::digest::Digest;
use anyhow::Context;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Repository directory name before `0.02.2`
pub const LEGACY_REPOSITORY_DIR: &str = ".vcs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LayoutVersion {
    V0_02_1,
    V0_02_2,
    V0_03_0,
}

impl LayoutVersion {
    pub const CURRENT: LayoutVersion = LayoutVersion::V0_03_0;
    pub const ALL: [LayoutVersion; 3] = [
        LayoutVersion::V0_02_1,
        LayoutVersion::V0_02_2,
        LayoutVersion::V0_03_0,
    ];

    pub fn try_parse(version: &str) -> anyhow::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == version.trim())
            .ok_or_else(|| HeroError::UnknownLayoutVersion(version.to_string()).into())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutVersion::V0_02_1 => "0.02.1",
            LayoutVersion::V0_02_2 => "0.02.2",
            LayoutVersion::V0_03_0 => "0.03.0",
        }
    }

    pub fn next(&self) -> Option<LayoutVersion> {
        match self {
            LayoutVersion::V0_02_1 => Some(LayoutVersion::V0_02_2),
            LayoutVersion::V0_02_2 => Some(LayoutVersion::V0_03_0),
            LayoutVersion::V0_03_0 => None,
        }
    }
}

impl std::fmt::Display for LayoutVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one upgrade step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub from: LayoutVersion,
    pub to: LayoutVersion,
    /// False when the layout already matched `to`
    pub changed: bool,
}

pub struct Migrator {
    root: Box<Path>,
}

impl Migrator {
    pub fn new(root: Box<Path>) -> Self {
        Migrator { root }
    }

    fn legacy_path(&self) -> PathBuf {
        self.root.join(LEGACY_REPOSITORY_DIR)
    }

    fn hero_path(&self) -> PathBuf {
        self.root.join(REPOSITORY_DIR)
    }

    /// Guess the layout from what is on disk
    pub fn detect(&self) -> anyhow::Result<LayoutVersion> {
        if self.legacy_path().join("HEAD").is_file() {
            return Ok(LayoutVersion::V0_02_1);
        }

        let head_path = self.hero_path().join("HEAD");
        if head_path.is_file() {
            let head = std::fs::read_to_string(&head_path)
                .with_context(|| format!("failed to read HEAD at {:?}", head_path))?;
            if Digest::try_parse(&head).is_ok() {
                return Ok(LayoutVersion::V0_02_2);
            }
        }

        Ok(LayoutVersion::CURRENT)
    }

    /// Run every step from `source` up to the current layout
    pub fn upgrade_from(&self, source: LayoutVersion) -> anyhow::Result<Vec<StepReport>> {
        let mut reports = Vec::new();
        let mut version = source;

        while let Some(next) = version.next() {
            let changed = match version {
                LayoutVersion::V0_02_1 => self.rename_repository_directory()?,
                LayoutVersion::V0_02_2 => self.adopt_branches_and_index_map()?,
                LayoutVersion::V0_03_0 => false,
            };
            tracing::info!(from = %version, to = %next, changed, "upgrade step done");

            reports.push(StepReport {
                from: version,
                to: next,
                changed,
            });
            version = next;
        }

        Ok(reports)
    }

    /// `0.02.1` to `0.02.2`: `.vcs` becomes `.hero`
    fn rename_repository_directory(&self) -> anyhow::Result<bool> {
        let legacy_path = self.legacy_path();
        let hero_path = self.hero_path();

        if !legacy_path.is_dir() {
            return Ok(false);
        }
        if hero_path.exists() {
            anyhow::bail!(
                "both {:?} and {:?} exist; remove one of them first",
                legacy_path,
                hero_path
            );
        }

        if std::fs::rename(&legacy_path, &hero_path).is_err() {
            // rename fails across file systems, fall back to copying
            copy_directory(&legacy_path, &hero_path)?;
            std::fs::remove_dir_all(&legacy_path)
                .with_context(|| format!("failed to remove {:?}", legacy_path))?;
        }

        Ok(true)
    }

    /// `0.02.2` to `0.03.0`: HEAD digest moves to the default branch, loose staged
    /// files are keyed by digest and listed in the index table
    fn adopt_branches_and_index_map(&self) -> anyhow::Result<bool> {
        let hero_path = self.hero_path();
        let head_path = hero_path.join("HEAD");

        if !head_path.is_file() {
            return Err(HeroError::NotARepository(self.root.to_path_buf()).into());
        }

        let head = std::fs::read_to_string(&head_path)
            .with_context(|| format!("failed to read HEAD at {:?}", head_path))?;
        let Ok(digest) = Digest::try_parse(&head) else {
            return Ok(false);
        };

        let refs = Refs::new(hero_path.clone().into_boxed_path());
        let branch = BranchName::try_parse(DEFAULT_BRANCH)?;
        refs.create_branch(&branch, &digest)?;
        refs.attach(&branch)?;

        self.rebuild_index_map(&hero_path.join("index"))?;

        Ok(true)
    }

    fn rebuild_index_map(&self, index_path: &Path) -> anyhow::Result<()> {
        if !index_path.is_dir() {
            let mut index = Index::new(index_path.to_path_buf().into_boxed_path());
            return index.write_updates();
        }

        let index_path = index_path
            .canonicalize()
            .with_context(|| format!("failed to resolve {:?}", index_path))?;
        let index_path = index_path.as_path();
        let mut index = Index::new(index_path.to_path_buf().into_boxed_path());
        index.rehydrate()?;

        let loose_files = WalkDir::new(index_path)
            .min_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| !Self::is_index_file(index_path, path))
            .collect::<Vec<_>>();

        // the loose files form a workspace of their own, rooted at the index
        let staging = Workspace::new(index_path.to_path_buf().into_boxed_path());
        let relative_paths = loose_files
            .iter()
            .map(|path| path.strip_prefix(index_path).map(Path::to_path_buf))
            .collect::<Result<Vec<_>, _>>()?;

        if !relative_paths.is_empty() {
            index.stage(&staging, &relative_paths)?;
            for path in &relative_paths {
                let path = path
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                staging.remove_file(&path)?;
            }
        }

        index.write_updates()
    }

    /// Files that already belong to the current index layout
    fn is_index_file(index_path: &Path, path: &Path) -> bool {
        path.parent() == Some(index_path)
            && path.file_name().is_some_and(|name| {
                let name = name.to_string_lossy();
                name == "map" || Digest::try_parse(name.as_ref()).is_ok()
            })
    }
}

fn copy_directory(source: &Path, destination: &Path) -> anyhow::Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("failed to walk {:?}", source))?;
        let target = destination.join(entry.path().strip_prefix(source)?);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {:?}", target))?;
        } else {
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("failed to copy {:?}", entry.path()))?;
        }
    }

    Ok(())
}
