use serde::{Deserialize, Deserializer, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::ItemId;

/// A single recommendation, exactly as received from the service
///
/// Only `id` is strictly required. Missing or malformed optional fields
/// are tolerated, so one odd record does not fail a whole page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: ItemId,
    #[serde(default, deserialize_with = "deserialize_lenient_title")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    pub description: Option<String>,
    /// View count over the last year
    #[serde(default, deserialize_with = "deserialize_lenient_count")]
    pub year_views: Option<u64>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_datetime",
        serialize_with = "time::serde::rfc3339::option::serialize"
    )]
    pub publication_datetime: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "deserialize_lenient_text")]
    pub category: Option<String>,
}

/// Parse a publication instant
///
/// Accepts RFC 3339, and also a bare `YYYY-MM-DDTHH:MM:SS[.fff]` which
/// is then assumed to be UTC.
pub fn parse_publication_datetime(s: &str) -> Option<OffsetDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }

    let with_t = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    let with_space = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(s, with_t)
        .or_else(|_| PrimitiveDateTime::parse(s, with_space))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

fn integral_count(f: f64) -> Option<u64> {
    (f.is_finite() && 0.0 <= f && f.fract() == 0.0 && f < u64::MAX as f64).then_some(f as u64)
}

/// Parse a view count given as an integer, an integral float or a
/// numeric string
fn parse_count(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| integral_count(n.as_f64()?)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| integral_count(s.parse().ok()?))
        }
        _ => None,
    }
}

fn deserialize_lenient_count<'de, D>(d: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(d)?;
    Ok(raw.as_ref().and_then(parse_count))
}

fn deserialize_lenient_text<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

fn deserialize_lenient_title<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_lenient_text(d)?.unwrap_or_default())
}

fn deserialize_lenient_datetime<'de, D>(d: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_publication_datetime(&s),
        _ => None,
    })
}
