//! Content digest (SHA-256 hash)
//!
//! Digests are 64-character lowercase hexadecimal strings. They are both the identity
//! of a stored object and the proof of its integrity: an object is stored under the
//! digest of its own bytes.
//!
//! ## Format
//!
//! - Full: 64 hex characters
//! - Short: First 7 characters, for display only
//!
//! ## Storage
//!
//! Objects are stored flat, in `.hero/commits/<digest>` and `.hero/index/<digest>`

use crate::artifacts::objects::{DIGEST_LENGTH, SHORT_DIGEST_LENGTH};
use sha2::{Digest as _, Sha256};
use std::io::Read;

/// SHA-256 content digest
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(String);

impl Digest {
    /// Hash an in-memory byte sequence
    pub fn of(content: impl AsRef<[u8]>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_ref());

        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hash everything a reader yields, without buffering it whole
    pub fn of_reader(mut reader: impl Read) -> anyhow::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];

        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Parse and validate a digest
    ///
    /// Uppercase hex is accepted and normalized, anything else that is not exactly
    /// 64 hex characters is rejected.
    pub fn try_parse(id: impl AsRef<str>) -> anyhow::Result<Self> {
        let id = id.as_ref().trim();

        if id.len() != DIGEST_LENGTH {
            anyhow::bail!("invalid digest length: {}", id.len());
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("invalid digest characters: {}", id);
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Whether a token could be a full or abbreviated digest
    pub fn looks_like_digest(token: &str) -> bool {
        (4..=DIGEST_LENGTH).contains(&token.len()) && token.chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn to_short(&self) -> &str {
        &self.0[..SHORT_DIGEST_LENGTH]
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn digest_of_known_content() {
        assert_eq!(
            Digest::of("hi").as_ref(),
            "8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4"
        );
        assert_eq!(
            Digest::of(b"").as_ref(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn streaming_digest_matches_in_memory_digest() {
        let content = vec![0xABu8; 20_000];

        assert_eq!(
            Digest::of_reader(content.as_slice()).unwrap(),
            Digest::of(&content)
        );
    }

    #[test]
    fn parse_normalizes_case_and_rejects_garbage() {
        let upper = "8F434346648F6B96DF89DDA901C5176B10A6D83961DD3C1AC88B59B2DC327AA4";

        assert_eq!(Digest::try_parse(upper).unwrap(), Digest::of("hi"));
        assert!(Digest::try_parse("0").is_err());
        assert!(Digest::try_parse("z".repeat(64)).is_err());
    }

    #[test]
    fn digest_like_tokens() {
        assert!(Digest::looks_like_digest("8f43"));
        assert!(!Digest::looks_like_digest("8f4"));
        assert!(!Digest::looks_like_digest("main"));
    }
}
