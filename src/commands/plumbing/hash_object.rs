use crate::areas::repository::Repository;
use crate::artifacts::objects::digest::Digest;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

impl Repository {
    /// Print the digest of a file, as `add` would stage it
    pub async fn hash_object(&mut self, file_path: &str) -> anyhow::Result<()> {
        let full_path = self.path().join(Path::new(file_path));
        let file = std::fs::File::open(&full_path)
            .with_context(|| format!("failed to open file {:?}", full_path))?;

        let digest = Digest::of_reader(file)?;

        writeln!(self.writer(), "{digest}")?;

        Ok(())
    }
}
