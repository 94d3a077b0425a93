//! Integrity anomalies
//!
//! An anomaly is a disagreement found after the data in question has already been
//! read in full. It is reported as a warning and never aborts the operation.

use crate::artifacts::objects::digest::Digest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// Footer `count` differs from the number of file records read
    FooterCount { declared: u64, actual: u64 },
    /// Footer `size` differs from the total bytes of the file records read
    FooterSize { declared: u64, actual: u64 },
    /// The header's `files [...]` list differs from the record checksums
    FileList {
        listed: Vec<Digest>,
        recorded: Vec<Digest>,
    },
    /// Bytes (staged, stored or written) hash to something other than recorded
    ChecksumMismatch {
        path: String,
        recorded: Digest,
        computed: Digest,
    },
    /// A stored object does not hash to the name it is stored under
    CorruptObject { key: Digest, computed: Digest },
}

impl Anomaly {
    pub fn warn(&self) {
        tracing::warn!("{}", self);
    }
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::FooterCount { declared, actual } => write!(
                f,
                "commit footer declares {declared} files but {actual} were read"
            ),
            Anomaly::FooterSize { declared, actual } => write!(
                f,
                "commit footer declares {declared} bytes of files but {actual} were read"
            ),
            Anomaly::FileList { listed, recorded } => write!(
                f,
                "commit header lists {} files that do not match the {} recorded checksums",
                listed.len(),
                recorded.len()
            ),
            Anomaly::ChecksumMismatch {
                path,
                recorded,
                computed,
            } => write!(
                f,
                "hash mismatch on {path}: recorded {recorded}, computed {computed}"
            ),
            Anomaly::CorruptObject { key, computed } => write!(
                f,
                "object {key} is corrupt: its content hashes to {computed}"
            ),
        }
    }
}
