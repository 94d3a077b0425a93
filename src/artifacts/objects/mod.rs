//! Stored objects and their wire format
//!
//! Every commit is a single self-contained blob: a text header, the raw bytes of
//! every committed file (each prefixed by its declared size), and a footer with
//! counters that cross-check the file section. A blob is stored under the SHA-256
//! digest of its own bytes.
//!
//! - `digest`: content digest type and hashing
//! - `escape`: escaping of the sentinel-delimited text fields
//! - `blob_cursor`: positional reader over a blob
//! - `commit`: the commit type, encoder and decoder
//! - `anomaly`: non-fatal integrity findings

pub mod anomaly;
pub mod blob_cursor;
pub mod commit;
pub mod digest;
pub mod escape;
pub mod object;

/// Length of a SHA-256 digest in hexadecimal format
pub const DIGEST_LENGTH: usize = 64;
/// Length of the abbreviated digest shown to users
pub const SHORT_DIGEST_LENGTH: usize = 7;
/// Parent marker of the root commit
pub const NO_PARENT: &str = "0";

pub const COMMIT_HEADER: &str = "COMMIT HEADER";
pub const COMMIT_FOOTER: &str = "COMMIT FOOTER";
/// Opens a section body
pub const SECTION_START: &str = "&&&";
/// Closes a section or a file record
pub const SECTION_END: &str = "&&&&&";
