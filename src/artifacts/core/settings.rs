use chrono::{DateTime, NaiveDateTime, Utc};

/// Fixed commit timestamp, `%Y-%m-%d %H:%M:%S` (UTC) or RFC 3339
pub const COMMIT_DATE_VAR: &str = "HERO_COMMIT_DATE";
/// `tracing` filter directives for the binaries
pub const LOG_FILTER_VAR: &str = "HERO_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

const COMMIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Settings read from the environment once per invocation
#[derive(Debug, Clone, Default)]
pub struct Settings {
    commit_date: Option<DateTime<Utc>>,
}

impl Settings {
    pub fn new(commit_date: Option<DateTime<Utc>>) -> Self {
        Settings { commit_date }
    }

    pub fn load_from_env() -> anyhow::Result<Self> {
        let commit_date = match std::env::var(COMMIT_DATE_VAR) {
            Ok(value) => Some(Self::parse_commit_date(&value)?),
            Err(_) => None,
        };

        Ok(Settings { commit_date })
    }

    fn parse_commit_date(value: &str) -> anyhow::Result<DateTime<Utc>> {
        let value = value.trim();

        NaiveDateTime::parse_from_str(value, COMMIT_DATE_FORMAT)
            .map(|date| date.and_utc())
            .or_else(|_| DateTime::parse_from_rfc3339(value).map(|date| date.with_timezone(&Utc)))
            .map_err(|_| {
                anyhow::anyhow!(
                    "{COMMIT_DATE_VAR} must be '{COMMIT_DATE_FORMAT}' or RFC 3339, got '{value}'"
                )
            })
    }

    /// Timestamp for a new commit: the configured date, or now
    pub fn commit_timestamp(&self) -> DateTime<Utc> {
        self.commit_date.unwrap_or_else(Utc::now)
    }
}
