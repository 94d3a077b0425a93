use crate::artifacts::core::error::HeroError;
use crate::artifacts::objects::digest::Digest;
use anyhow::Context;
use bytes::Bytes;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Directories never walked into
const IGNORED_PATHS: [&str; 1] = [".hero"];

/// The working directory
///
/// Paths handed out and accepted are relative to the repository root and use `/`
/// as separator, which is also how they are recorded in commits and the index.
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Expand a user path into the files under it
    ///
    /// Relative paths are taken from the repository root. A file expands to itself,
    /// a directory to its regular files recursively.
    pub fn list_files(&self, path: &Path) -> anyhow::Result<Vec<String>> {
        let absolute_path = self.path.join(path);
        let absolute_path = absolute_path
            .canonicalize()
            .with_context(|| format!("the specified path does not exist: {:?}", path))?;

        if !absolute_path.starts_with(&self.path) {
            anyhow::bail!("{:?} is outside the repository", path);
        }

        if absolute_path.is_dir() {
            let mut files = Vec::new();
            let entries = WalkDir::new(&absolute_path)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !self.is_ignored(entry.path()));

            for entry in entries {
                let entry = entry.with_context(|| format!("failed to walk {:?}", path))?;
                if entry.file_type().is_file() {
                    files.push(self.to_relative(entry.path())?);
                }
            }

            Ok(files)
        } else if self.is_ignored(&absolute_path) {
            Ok(Vec::new())
        } else {
            Ok(vec![self.to_relative(&absolute_path)?])
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let path = path.strip_prefix(&self.path).unwrap_or(path);

        path.components().any(|component| {
            if let Component::Normal(name) = component {
                IGNORED_PATHS.contains(&name.to_string_lossy().as_ref())
            } else {
                false
            }
        })
    }

    fn to_relative(&self, path: &Path) -> anyhow::Result<String> {
        let relative_path = path
            .strip_prefix(&self.path)
            .with_context(|| format!("{:?} is outside the repository", path))?;

        let mut components = Vec::new();
        for component in relative_path.components() {
            let component = component
                .as_os_str()
                .to_str()
                .with_context(|| format!("{:?} is not valid UTF-8", relative_path))?;
            components.push(component);
        }

        let relative_path = components.join("/");
        // index records and commit fields are line-oriented
        if relative_path.contains(['\n', '\r']) {
            anyhow::bail!("{:?} contains a line break", relative_path);
        }

        Ok(relative_path)
    }

    /// Absolute path of a recorded path
    ///
    /// Recorded paths come from the index or from commits and must stay inside the
    /// repository: absolute paths and `..` are rejected as malformed.
    pub fn full_path(&self, file_path: &str) -> anyhow::Result<PathBuf> {
        let relative_path = Path::new(file_path);
        let escapes = file_path.is_empty()
            || relative_path.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::RootDir | Component::Prefix(_)
                )
            });

        if escapes {
            return Err(HeroError::MalformedCommit(format!(
                "path '{file_path}' points outside the repository"
            ))
            .into());
        }

        Ok(self.path.join(relative_path))
    }

    /// The path standing in the way of writing `file_path`
    ///
    /// Either a directory at the path itself or a non-directory at one of its
    /// parents, relative to the repository root.
    pub fn blocker_of(&self, file_path: &str) -> anyhow::Result<Option<String>> {
        let full_path = self.full_path(file_path)?;

        if full_path.is_dir() {
            return Ok(Some(file_path.to_string()));
        }

        let mut ancestors = full_path
            .ancestors()
            .skip(1)
            .take_while(|ancestor| *ancestor != &*self.path)
            .collect::<Vec<_>>();
        ancestors.reverse();

        for ancestor in ancestors {
            if ancestor.exists() && !ancestor.is_dir() {
                return self.to_relative(ancestor).map(Some);
            }
        }

        Ok(None)
    }

    pub fn read_file(&self, file_path: &str) -> anyhow::Result<Bytes> {
        let full_path = self.full_path(file_path)?;

        let content = std::fs::read(&full_path)
            .with_context(|| format!("failed to read file {:?}", full_path))?;

        Ok(content.into())
    }

    /// Digest of a working file, `None` when there is no regular file at the path
    pub fn digest_of(&self, file_path: &str) -> anyhow::Result<Option<Digest>> {
        let full_path = self.full_path(file_path)?;

        if !full_path.is_file() {
            return Ok(None);
        }

        let file = std::fs::File::open(&full_path)
            .with_context(|| format!("failed to open file {:?}", full_path))?;

        Digest::of_reader(file).map(Some)
    }

    /// Write a file, creating missing parent directories
    ///
    /// Nothing already on disk is removed to make room: a directory at the path, or
    /// a file where a parent directory goes, fails the write.
    pub fn write_file(&self, file_path: &str, content: &[u8]) -> anyhow::Result<()> {
        if let Some(blocker) = self.blocker_of(file_path)? {
            anyhow::bail!("cannot write '{file_path}', '{blocker}' is in the way");
        }
        let full_path = self.full_path(file_path)?;

        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {:?}", parent))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&full_path)
            .with_context(|| format!("failed to open file {:?}", full_path))?;

        file.write_all(content)
            .with_context(|| format!("failed to write to file {:?}", full_path))?;

        Ok(())
    }

    /// Remove a file and any parent directories left empty
    pub fn remove_file(&self, file_path: &str) -> anyhow::Result<()> {
        let full_path = self.full_path(file_path)?;

        if full_path.is_file() {
            std::fs::remove_file(&full_path)
                .with_context(|| format!("failed to remove file {:?}", full_path))?;
        }

        let mut parent = full_path.parent();
        while let Some(dir) = parent
            && dir != self.path.as_ref()
            && dir.starts_with(&self.path)
            && dir.read_dir().is_ok_and(|mut entries| entries.next().is_none())
        {
            std::fs::remove_dir(dir)
                .with_context(|| format!("failed to remove empty directory {:?}", dir))?;
            parent = dir.parent();
        }

        Ok(())
    }
}
