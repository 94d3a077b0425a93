use crate::artifacts::core::error::HeroError;
use crate::artifacts::objects::anomaly::Anomaly;
use crate::artifacts::objects::commit::DecodedCommit;
use crate::artifacts::objects::digest::Digest;
use crate::artifacts::objects::object::{Object, Unpackable};
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Content-addressed blob store
///
/// Every blob lives in a flat directory under the digest of its own bytes. Blobs
/// are never overwritten; writing an existing blob is a no-op.
#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
    /// Commits decoded during this invocation
    commits: RefCell<HashMap<Digest, Rc<DecodedCommit>>>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database {
            path,
            commits: RefCell::new(HashMap::new()),
        }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, object: &impl Object) -> anyhow::Result<Digest> {
        self.put(object.serialize()?)
    }

    /// Store a blob under its digest unless it is already there
    pub fn put(&self, content: impl AsRef<[u8]>) -> anyhow::Result<Digest> {
        let content = content.as_ref();
        let digest = Digest::of(content);
        let object_path = self.object_path(&digest);

        if !object_path.exists() {
            self.write_object(object_path, content)?;
        }

        Ok(digest)
    }

    /// Read a blob, checking that it still hashes to its name
    pub fn get(&self, digest: &Digest) -> anyhow::Result<Bytes> {
        let object_path = self.object_path(digest);

        if !object_path.is_file() {
            return Err(HeroError::ObjectNotFound(digest.clone()).into());
        }

        let content = std::fs::read(&object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;

        let computed = Digest::of(&content);
        if &computed != digest {
            Anomaly::CorruptObject {
                key: digest.clone(),
                computed,
            }
            .warn();
        }

        Ok(content.into())
    }

    pub fn exists(&self, digest: &Digest) -> bool {
        self.object_path(digest).is_file()
    }

    /// Decode a stored commit, once per invocation
    ///
    /// Integrity anomalies are reported on first decode.
    pub fn load_commit(&self, digest: &Digest) -> anyhow::Result<Rc<DecodedCommit>> {
        if let Some(commit) = self.commits.borrow().get(digest) {
            return Ok(commit.clone());
        }

        let content = self.get(digest)?;
        let commit = DecodedCommit::deserialize(content)
            .with_context(|| format!("Unable to decode commit {digest}"))?;
        commit.anomalies().iter().for_each(Anomaly::warn);

        let commit = Rc::new(commit);
        self.commits
            .borrow_mut()
            .insert(digest.clone(), commit.clone());

        Ok(commit)
    }

    /// Every stored blob whose digest starts with `prefix`
    pub fn find_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<Digest>> {
        let prefix = prefix.to_lowercase();

        Ok(self
            .list()?
            .into_iter()
            .filter(|digest| digest.as_ref().starts_with(&prefix))
            .collect())
    }

    /// Every stored blob, in digest order
    ///
    /// Files not named by a digest (such as the index table) are skipped.
    pub fn list(&self) -> anyhow::Result<Vec<Digest>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut digests = Vec::new();
        for entry in std::fs::read_dir(&self.path).context(format!(
            "Unable to read object directory {}",
            self.path.display()
        ))? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Ok(digest) = Digest::try_parse(entry.file_name().to_string_lossy()) {
                digests.push(digest);
            }
        }

        digests.sort();
        Ok(digests)
    }

    pub fn delete(&self, digest: &Digest) -> anyhow::Result<()> {
        let object_path = self.object_path(digest);

        if object_path.exists() {
            std::fs::remove_file(&object_path).context(format!(
                "Unable to remove object file {}",
                object_path.display()
            ))?;
        }

        Ok(())
    }

    /// Remove every stored blob
    pub fn purge(&self) -> anyhow::Result<()> {
        for digest in self.list()? {
            self.delete(&digest)?;
        }

        self.commits.borrow_mut().clear();
        Ok(())
    }

    fn object_path(&self, digest: &Digest) -> PathBuf {
        self.path.join(digest.as_ref())
    }

    fn write_object(&self, object_path: PathBuf, content: &[u8]) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.path).context(format!(
            "Unable to create object directory {}",
            self.path.display()
        ))?;
        let temp_object_path = self.path.join(Self::generate_temp_name());

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_object_path)
            .context(format!(
                "Unable to open object file {}",
                temp_object_path.display()
            ))?;

        file.write_all(content).context(format!(
            "Unable to write object file {}",
            temp_object_path.display()
        ))?;

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, &object_path).context(format!(
            "Unable to rename object file to {}",
            object_path.display()
        ))?;

        Ok(())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}
