//! Commit object
//!
//! A commit is a snapshot of the staged files, with their full content embedded,
//! plus a link to its parent commit.
//!
//! ## Format
//!
//! ```text
//! COMMIT HEADER
//! &&&
//! parent <digest or 0>
//! date <YYYY-MM-DD>
//! time <HH:MM:SS> UTC
//! title <escaped title>
//! message &<escaped message>&
//! files [<digest>,<digest>,]
//! &&&&&
//! <path>                     \
//! checksum <digest>           |
//! size <byte count>           | once per file, in `files [...]` order
//! &&&                         |
//! <raw bytes>&&&&&           /
//! COMMIT FOOTER
//! &&&
//! count <number of files>
//! size <total bytes of files>
//! &&&&&
//! ```
//!
//! File content is embedded verbatim and may contain any byte, including the
//! delimiters: the declared size says how much to read. Title and message are
//! escaped instead, because the message is delimited by `&`.

use crate::artifacts::core::error::HeroError;
use crate::artifacts::objects::anomaly::Anomaly;
use crate::artifacts::objects::blob_cursor::BlobCursor;
use crate::artifacts::objects::digest::Digest;
use crate::artifacts::objects::escape::{escape, unescape};
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::{
    COMMIT_FOOTER, COMMIT_HEADER, NO_PARENT, SECTION_END, SECTION_START,
};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound, Utc};
use derive_new::new;
use std::io::Write;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// One committed file with its content
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct FileEntry {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    /// Digest recorded for the content
    pub digest: Digest,
    pub content: Bytes,
}

impl FileEntry {
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Footer counters, redundant with the file section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitFooter {
    pub count: u64,
    pub size: u64,
}

impl CommitFooter {
    /// Compare the declared counters with what was actually read
    pub fn compare(&self, count: u64, size: u64) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        if self.count != count {
            anomalies.push(Anomaly::FooterCount {
                declared: self.count,
                actual: count,
            });
        }
        if self.size != size {
            anomalies.push(Anomaly::FooterSize {
                declared: self.size,
                actual: size,
            });
        }

        anomalies
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// None for the root commit
    parent: Option<Digest>,
    timestamp: DateTime<Utc>,
    title: String,
    message: String,
    files: Vec<FileEntry>,
}

impl Commit {
    /// Build a commit
    ///
    /// The timestamp is truncated to whole seconds and the title to its first line,
    /// since the wire format keeps nothing finer.
    pub fn new(
        parent: Option<Digest>,
        timestamp: DateTime<Utc>,
        title: &str,
        message: &str,
        files: Vec<FileEntry>,
    ) -> Self {
        Commit {
            parent,
            timestamp: timestamp.trunc_subsecs(0),
            title: title.lines().next().unwrap_or("").to_string(),
            message: message.to_string(),
            files,
        }
    }

    pub fn parent(&self) -> Option<&Digest> {
        self.parent.as_ref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|entry| entry.path == path)
    }

    pub fn footer(&self) -> CommitFooter {
        CommitFooter {
            count: self.files.len() as u64,
            size: self.files.iter().map(FileEntry::size).sum(),
        }
    }

    pub fn readable_date(&self) -> String {
        self.timestamp.format(DATE_FORMAT).to_string()
    }

    pub fn readable_time(&self) -> String {
        format!("{} UTC", self.timestamp.format(TIME_FORMAT))
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut blob = Vec::new();

        writeln!(blob, "{COMMIT_HEADER}")?;
        writeln!(blob, "{SECTION_START}")?;
        match &self.parent {
            Some(parent) => writeln!(blob, "parent {parent}")?,
            None => writeln!(blob, "parent {NO_PARENT}")?,
        }
        writeln!(blob, "date {}", self.readable_date())?;
        writeln!(blob, "time {}", self.readable_time())?;
        writeln!(blob, "title {}", escape(&self.title))?;
        writeln!(blob, "message &{}&", escape(&self.message))?;

        write!(blob, "files [")?;
        for entry in &self.files {
            write!(blob, "{},", entry.digest)?;
        }
        writeln!(blob, "]")?;
        writeln!(blob, "{SECTION_END}")?;

        for entry in &self.files {
            writeln!(blob, "{}", entry.path)?;
            writeln!(blob, "checksum {}", entry.digest)?;
            writeln!(blob, "size {}", entry.size())?;
            writeln!(blob, "{SECTION_START}")?;
            blob.write_all(&entry.content)?;
            writeln!(blob, "{SECTION_END}")?;
        }

        let footer = self.footer();
        writeln!(blob, "{COMMIT_FOOTER}")?;
        writeln!(blob, "{SECTION_START}")?;
        writeln!(blob, "count {}", footer.count)?;
        writeln!(blob, "size {}", footer.size)?;
        writeln!(blob, "{SECTION_END}")?;

        Ok(Bytes::from(blob))
    }
}

impl Object for Commit {
    fn display(&self) -> String {
        let mut lines = vec![];

        match &self.parent {
            Some(parent) => lines.push(format!("parent {parent}")),
            None => lines.push(format!("parent {NO_PARENT}")),
        }
        lines.push(format!("date {}", self.readable_date()));
        lines.push(format!("time {}", self.readable_time()));
        lines.push(format!("title {}", self.title));
        lines.push(String::new());
        lines.extend(self.message.lines().map(|line| format!("    {line}")));
        lines.push(String::new());
        for entry in &self.files {
            lines.push(format!("{} {:>10} {}", entry.digest, entry.size(), entry.path));
        }

        lines.join("\n")
    }
}

/// A commit as read back from a blob, with what its header and footer declared
#[derive(Debug, Clone)]
pub struct DecodedCommit {
    commit: Commit,
    /// Digests listed in the header's `files [...]`
    listed: Vec<Digest>,
    footer: CommitFooter,
}

impl DecodedCommit {
    pub fn commit(&self) -> &Commit {
        &self.commit
    }

    pub fn footer(&self) -> CommitFooter {
        self.footer
    }

    /// Cross-checks between the header, the file records and the footer
    pub fn anomalies(&self) -> Vec<Anomaly> {
        let read = self.commit.footer();
        let mut anomalies = self.footer.compare(read.count, read.size);

        let recorded = self
            .commit
            .files
            .iter()
            .map(|entry| entry.digest.clone())
            .collect::<Vec<_>>();
        if recorded != self.listed {
            anomalies.push(Anomaly::FileList {
                listed: self.listed.clone(),
                recorded,
            });
        }

        anomalies
    }
}

impl Unpackable for DecodedCommit {
    fn deserialize(bytes: Bytes) -> anyhow::Result<Self> {
        let mut cursor = BlobCursor::new(bytes);

        cursor.expect_line(COMMIT_HEADER)?;
        cursor.expect_line(SECTION_START)?;

        let parent = cursor.read_field("parent ")?;
        let parent = match parent.trim() {
            NO_PARENT => None,
            digest => Some(parse_digest(digest)?),
        };

        let date = cursor.read_field("date ")?;
        let date = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
            .map_err(|_| malformed(format!("invalid date '{date}'")))?;
        let time = cursor.read_field("time ")?;
        let time = time
            .trim()
            .strip_suffix("UTC")
            .map(str::trim)
            .and_then(|time| NaiveTime::parse_from_str(time, TIME_FORMAT).ok())
            .ok_or_else(|| malformed(format!("invalid time '{time}'")))?;
        let timestamp = date.and_time(time).and_utc();

        let title = unescape(&cursor.read_field("title ")?);

        cursor.expect_bytes(b"message &")?;
        let message = cursor.take_until(b'&')?;
        let message = String::from_utf8(message.to_vec())
            .map_err(|_| malformed("message is not UTF-8".to_string()))?;
        let message = unescape(&message);
        let rest = cursor.read_line()?;
        if !rest.is_empty() {
            return Err(malformed(format!("unexpected '{rest}' after message")));
        }

        let listed = cursor.read_field("files [")?;
        let listed = listed
            .strip_suffix(']')
            .ok_or_else(|| malformed(format!("unterminated file list '{listed}'")))?
            .split(',')
            .map(str::trim)
            .filter(|digest| !digest.is_empty())
            .map(parse_digest)
            .collect::<anyhow::Result<Vec<_>>>()?;
        cursor.expect_line(SECTION_END)?;

        // the header's file list decides how many records follow, so a path may
        // read like any sentinel
        let mut files = Vec::with_capacity(listed.len());
        for _ in 0..listed.len() {
            let offset = cursor.position();
            let path = cursor.read_line()?;

            let digest = parse_digest(&cursor.read_field("checksum ")?)?;
            let size = cursor.read_integer_field("size ")?;
            let size = usize::try_from(size).map_err(|_| {
                malformed(format!(
                    "size {size} of the record at offset {offset} is too large"
                ))
            })?;
            cursor.expect_line(SECTION_START)?;
            let content = cursor.take(size)?;
            cursor.expect_line(SECTION_END)?;

            files.push(FileEntry::new(path, digest, content));
        }

        cursor.expect_line(COMMIT_FOOTER)?;
        cursor.expect_line(SECTION_START)?;
        let count = cursor.read_integer_field("count ")?;
        let size = cursor.read_integer_field("size ")?;
        cursor.expect_line(SECTION_END)?;

        let commit = Commit {
            parent,
            timestamp,
            title,
            message,
            files,
        };

        Ok(DecodedCommit {
            commit,
            listed,
            footer: CommitFooter { count, size },
        })
    }
}

fn parse_digest(value: &str) -> anyhow::Result<Digest> {
    Digest::try_parse(value).map_err(|_| malformed(format!("invalid digest '{value}'")))
}

fn malformed(reason: String) -> anyhow::Error {
    HeroError::MalformedCommit(reason).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
    }

    fn file(path: &str, content: &'static [u8]) -> FileEntry {
        FileEntry::new(
            path.to_string(),
            Digest::of(content),
            Bytes::from_static(content),
        )
    }

    fn sample_commit() -> Commit {
        Commit::new(
            Some(Digest::of("parent")),
            timestamp(),
            "fix a/b & c",
            "line one\nline & two/three\n",
            vec![
                file("a.txt", b"hi"),
                file("bin/data", b"\x00&&&&&\nCOMMIT FOOTER\n\xff"),
            ],
        )
    }

    #[test]
    fn encodes_the_exact_grammar() {
        let commit = Commit::new(
            None,
            timestamp(),
            "t",
            "",
            vec![file("a.txt", b"hi")],
        );
        let hi = Digest::of("hi");

        let expected = format!(
            "COMMIT HEADER\n&&&\nparent 0\ndate 2024-03-09\ntime 07:05:01 UTC\ntitle t\n\
             message &&\nfiles [{hi},]\n&&&&&\na.txt\nchecksum {hi}\nsize 2\n&&&\nhi&&&&&\n\
             COMMIT FOOTER\n&&&\ncount 1\nsize 2\n&&&&&\n"
        );

        assert_eq!(
            String::from_utf8(commit.serialize().unwrap().to_vec()).unwrap(),
            expected
        );
    }

    #[test]
    fn empty_commit_has_zero_footer() {
        let commit = Commit::new(None, timestamp(), "Initial Commit", "", vec![]);
        let blob = String::from_utf8(commit.serialize().unwrap().to_vec()).unwrap();

        assert!(blob.contains("files []\n&&&&&\nCOMMIT FOOTER\n&&&\ncount 0\nsize 0\n&&&&&\n"));
    }

    #[test]
    fn decodes_what_it_encodes_including_delimiters_in_content() {
        let commit = sample_commit();
        let decoded = DecodedCommit::deserialize(commit.serialize().unwrap()).unwrap();

        assert_eq!(decoded.commit(), &commit);
        assert!(decoded.anomalies().is_empty());
    }

    #[test]
    fn footer_size_matches_total_record_bytes() {
        let commit = sample_commit();
        let total = commit.files().iter().map(|entry| entry.content.len() as u64).sum::<u64>();
        let blob = String::from_utf8_lossy(&commit.serialize().unwrap()).to_string();

        assert!(blob.ends_with(&format!("count 2\nsize {total}\n&&&&&\n")));
    }

    #[test]
    fn object_id_is_the_digest_of_the_blob() {
        let commit = sample_commit();

        assert_eq!(
            commit.object_id().unwrap(),
            Digest::of(commit.serialize().unwrap())
        );
    }

    #[test]
    fn tolerates_carriage_returns_in_line_fields() {
        let commit = Commit::new(None, timestamp(), "t", "m", vec![file("a.txt", b"hi")]);
        let blob = String::from_utf8(commit.serialize().unwrap().to_vec()).unwrap();
        // only the text lines get CRLF endings, the payload stays intact
        let blob = blob
            .replace("COMMIT HEADER\n", "COMMIT HEADER\r\n")
            .replace("size 2\n", "size 2\r\n")
            .replace("&&&\nhi", "&&&\r\nhi")
            .replace("count 1\n", "count 1\r\n");

        let decoded = DecodedCommit::deserialize(Bytes::from(blob)).unwrap();

        assert_eq!(decoded.commit(), &commit);
    }

    #[test]
    fn flags_a_corrupted_footer_without_rejecting_it() {
        let commit = sample_commit();
        let blob = String::from_utf8_lossy(&commit.serialize().unwrap()).to_string();
        let blob = blob.replace("count 2\n", "count 3\n");

        let decoded = DecodedCommit::deserialize(Bytes::from(blob)).unwrap();

        assert_eq!(decoded.commit().files().len(), 2);
        assert_eq!(
            decoded.anomalies(),
            vec![Anomaly::FooterCount {
                declared: 3,
                actual: 2
            }]
        );
    }

    #[test]
    fn rejects_truncated_payloads() {
        let commit = sample_commit();
        let blob = commit.serialize().unwrap();
        let truncated = blob.slice(..blob.len() - 80);

        let error = DecodedCommit::deserialize(truncated).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<HeroError>(),
            Some(HeroError::MalformedCommit(_))
        ));
    }

    #[test]
    fn rejects_payloads_shorter_than_declared() {
        let commit = Commit::new(None, timestamp(), "t", "", vec![file("a.txt", b"hi")]);
        let blob = String::from_utf8(commit.serialize().unwrap().to_vec()).unwrap();
        let blob = blob.replace("size 2\n", "size 200\n");

        assert!(DecodedCommit::deserialize(Bytes::from(blob)).is_err());
    }

    #[test]
    fn rejects_malformed_integers() {
        let commit = Commit::new(None, timestamp(), "t", "", vec![file("a.txt", b"hi")]);
        let blob = String::from_utf8(commit.serialize().unwrap().to_vec()).unwrap();
        let blob = blob.replace("size 2\n", "size two\n");

        let error = DecodedCommit::deserialize(Bytes::from(blob)).unwrap_err();

        assert!(error.to_string().contains("not an integer"));
    }

    #[test]
    fn accepts_file_list_without_trailing_comma() {
        let commit = Commit::new(None, timestamp(), "t", "", vec![file("a.txt", b"hi")]);
        let blob = String::from_utf8(commit.serialize().unwrap().to_vec()).unwrap();
        let blob = blob.replace(",]", "]");

        let decoded = DecodedCommit::deserialize(Bytes::from(blob)).unwrap();

        assert!(decoded.anomalies().is_empty());
    }

    #[test]
    fn paths_spelling_sentinels_round_trip() {
        let commit = Commit::new(
            None,
            timestamp(),
            "t",
            "",
            vec![
                file("COMMIT FOOTER", b"footer"),
                file("&&&", b"start"),
                file("&&&&&", b"end"),
            ],
        );

        let decoded = DecodedCommit::deserialize(commit.serialize().unwrap()).unwrap();

        assert_eq!(decoded.commit(), &commit);
        assert!(decoded.anomalies().is_empty());
    }

    #[test]
    fn records_missing_from_the_file_list_are_rejected() {
        let commit = Commit::new(None, timestamp(), "t", "", vec![file("a.txt", b"hi")]);
        let blob = String::from_utf8(commit.serialize().unwrap().to_vec()).unwrap();
        let blob = blob.replace(&format!("files [{},]", Digest::of("hi")), "files []");

        let error = DecodedCommit::deserialize(Bytes::from(blob)).unwrap_err();

        assert!(matches!(
            error.downcast_ref::<HeroError>(),
            Some(HeroError::MalformedCommit(_))
        ));
    }

    #[test]
    fn title_keeps_only_its_first_line() {
        let commit = Commit::new(None, timestamp(), "first\nsecond", "", vec![]);

        assert_eq!(commit.title(), "first");
    }
}
