use crate::areas::repository::Repository;
use crate::artifacts::branch::reference::Reference;
use crate::artifacts::objects::object::Object;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// Print a stored commit followed by what its integrity checks found
    pub async fn cat_file(&mut self, reference: &str) -> anyhow::Result<()> {
        self.ensure_initialized()?;

        let reference = Reference::parse(reference, self.refs(), self.database())?;
        let digest = reference.resolve(self.refs())?;
        let decoded = self.database().load_commit(&digest)?;

        writeln!(self.writer(), "{}", format!("commit {digest}").yellow())?;
        writeln!(self.writer(), "{}", decoded.commit().display())?;

        let anomalies = decoded.anomalies();
        if anomalies.is_empty() {
            writeln!(self.writer(), "integrity: ok")?;
        } else {
            for anomaly in anomalies {
                writeln!(self.writer(), "{}", format!("integrity: {anomaly}").red())?;
            }
        }

        Ok(())
    }
}
