//! Positional reader over a commit blob
//!
//! The blob mixes `\n`-terminated text lines with raw payloads whose length is
//! declared beforehand. The cursor reads lines (dropping carriage returns) and
//! slices payloads by explicit length; it never searches for text except for the
//! closing sentinel of an escaped field.

use crate::artifacts::core::error::HeroError;
use bytes::Bytes;

#[derive(Debug)]
pub struct BlobCursor {
    bytes: Bytes,
    position: usize,
}

impl BlobCursor {
    pub fn new(bytes: Bytes) -> Self {
        BlobCursor { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Read up to the next newline, returning the line without `\n` or `\r`
    pub fn read_line(&mut self) -> anyhow::Result<String> {
        if self.remaining() == 0 {
            return Err(malformed(format!(
                "truncated: expected a line at offset {}",
                self.position
            )));
        }

        let rest = &self.bytes[self.position..];
        let (line, consumed) = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };

        let line = line
            .iter()
            .copied()
            .filter(|&b| b != b'\r')
            .collect::<Vec<u8>>();
        let line = String::from_utf8(line).map_err(|_| {
            malformed(format!("line at offset {} is not UTF-8", self.position))
        })?;

        self.position += consumed;
        Ok(line)
    }

    pub fn expect_line(&mut self, expected: &str) -> anyhow::Result<()> {
        let offset = self.position;
        let line = self.read_line()?;

        if line != expected {
            return Err(malformed(format!(
                "expected '{expected}' at offset {offset}, found '{line}'"
            )));
        }

        Ok(())
    }

    /// Read a `<prefix><value>` line and return the value
    pub fn read_field(&mut self, prefix: &str) -> anyhow::Result<String> {
        let offset = self.position;
        let line = self.read_line()?;

        line.strip_prefix(prefix)
            .map(str::to_string)
            .ok_or_else(|| {
                malformed(format!(
                    "expected field '{}' at offset {offset}, found '{line}'",
                    prefix.trim_end()
                ))
            })
    }

    /// Read a `<prefix><integer>` line
    pub fn read_integer_field(&mut self, prefix: &str) -> anyhow::Result<u64> {
        let value = self.read_field(prefix)?;

        value.trim().parse::<u64>().map_err(|_| {
            malformed(format!(
                "field '{}' holds '{value}', which is not an integer",
                prefix.trim_end()
            ))
        })
    }

    /// Consume an exact byte prefix
    pub fn expect_bytes(&mut self, expected: &[u8]) -> anyhow::Result<()> {
        let offset = self.position;
        let found = self.take(expected.len())?;

        if found != expected {
            return Err(malformed(format!(
                "expected '{}' at offset {offset}",
                String::from_utf8_lossy(expected)
            )));
        }

        Ok(())
    }

    /// Slice exactly `len` bytes
    pub fn take(&mut self, len: usize) -> anyhow::Result<Bytes> {
        if self.remaining() < len {
            return Err(malformed(format!(
                "truncated: expected {len} bytes at offset {}, only {} left",
                self.position,
                self.remaining()
            )));
        }

        let slice = self.bytes.slice(self.position..self.position + len);
        self.position += len;

        Ok(slice)
    }

    /// Slice up to (not including) the next `delimiter` byte and consume the delimiter
    pub fn take_until(&mut self, delimiter: u8) -> anyhow::Result<Bytes> {
        let rest = &self.bytes[self.position..];
        let end = rest.iter().position(|&b| b == delimiter).ok_or_else(|| {
            malformed(format!(
                "truncated: missing '{}' after offset {}",
                delimiter as char, self.position
            ))
        })?;

        let slice = self.bytes.slice(self.position..self.position + end);
        self.position += end + 1;

        Ok(slice)
    }
}

fn malformed(reason: String) -> anyhow::Error {
    HeroError::MalformedCommit(reason).into()
}
