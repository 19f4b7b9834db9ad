//! Custom deserializers for signup documents coming out of the store.
//!
//! Documents are written by several clients over the years, so the same
//! attribute can arrive in more than one shape. These helpers normalise them
//! into the typed model.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Accepts either a plain SurrealDB Thing object `{ tb, id }`, a `"table:id"`
/// string or a bare id, and yields the bare record id.
pub fn deserialize_record_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    record_id_from_value(&value).ok_or_else(|| D::Error::custom("Expected Thing object or string"))
}

fn record_id_from_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(match s.split_once(':') {
            Some((_, id)) => id.trim_matches(|c| c == '⟨' || c == '⟩').to_string(),
            None => s.clone(),
        }),
        serde_json::Value::Object(map) => match map.get("id")? {
            serde_json::Value::String(id) => Some(id.clone()),
            serde_json::Value::Object(inner) => inner
                .get("String")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        },
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parses a timestamp given as RFC 3339 text, a `{ "Datetime": ... }` wrapper,
/// epoch milliseconds, or a `{ seconds, nanoseconds }` pair.
pub fn datetime_from_value(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => {
            let raw = s.trim_start_matches("d'").trim_end_matches('\'');
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|d| d.with_timezone(&Utc))
        }
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        serde_json::Value::Object(map) => {
            if let Some(inner) = map.get("Datetime") {
                return datetime_from_value(inner);
            }
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(|v| v.as_i64())?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanos).ok()?).single()
        }
        _ => None,
    }
}

/// Optional timestamp; null or missing stays `None`, unparseable is an error.
pub fn de_option_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let opt = Option::<serde_json::Value>::deserialize(deserializer)?;
    match opt {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => datetime_from_value(&v)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", v))),
    }
}

/// Required timestamp in any of the accepted shapes.
pub fn de_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let v = serde_json::Value::deserialize(deserializer)?;
    datetime_from_value(&v).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {}", v)))
}

/// Boolean flag where null counts as false.
pub fn de_bool_or_null<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
