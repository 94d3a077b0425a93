use crate::areas::repository::Repository;

impl Repository {
    pub async fn add(&mut self, paths: &[String]) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let index = self.index();
        let mut index = index.lock().await;

        // Load the index table from disk
        index.rehydrate()?;

        let staged = index.stage(self.workspace(), paths);
        // a failed session has emptied the index, which must reach the disk too
        if index.is_changed() {
            index.write_updates()?;
        }

        for (path, digest) in staged? {
            tracing::debug!(%path, %digest, "staged");
        }

        Ok(())
    }
}
