//! Lenient timestamp deserialization for the persisted files.
//!
//! Timestamps are written as RFC 3339 in UTC. Older logs carry naive ISO-8601
//! timestamps (`2024-05-01T22:13:45.123456`) in the writer's local time;
//! those are read as local time and converted to UTC.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};

/// Parse an RFC 3339 timestamp, or a naive one taken as local time.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive: NaiveDateTime = raw
        .parse()
        .map_err(|e| format!("invalid timestamp {:?}: {}", raw, e))?;

    // A local time skipped by a DST jump has no mapping; fall back to UTC
    Ok(match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => naive.and_utc(),
    })
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(de::Error::custom)
}

/// Same as the parent module, for `Option<DateTime<Utc>>` fields.
pub mod option {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw))
            .transpose()
            .map_err(de::Error::custom)
    }
}
