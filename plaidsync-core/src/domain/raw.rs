//! Raw payload serialization
//!
//! Every record keeps the vendor object it was built from as plain JSON
//! (`raw_data`). The shape of that JSON is fixed:
//!
//! - date-time fields: `2024-01-15T10:30:00+00:00` (fractional seconds only when present)
//! - date fields: `2024-01-15`
//! - enumerated fields: the vendor's plain string
//! - amounts: JSON numbers, or a decimal string when a double cannot hold the value exactly
//!
//! The serde helper modules below are attached to the vendor models with
//! `#[serde(with = "...")]`.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Textual format for date-time fields in raw payloads
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// Serialize a vendor object into its raw payload form
pub fn to_raw<T: Serialize>(value: &T) -> serde_json::Result<JsonValue> {
    serde_json::to_value(value)
}

/// `DateTime<FixedOffset>` as `%Y-%m-%dT%H:%M:%S%.f%:z`, parsed from RFC 3339
pub mod timestamp {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map_err(|e| D::Error::custom(format!("invalid timestamp '{}': {}", s, e)))
    }
}

/// Optional variant of [`timestamp`]; `null` stays `null`
pub mod timestamp_option {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(
        value: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.collect_str(&dt.format(TIMESTAMP_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let value: Option<String> = Option::deserialize(deserializer)?;
        match value {
            Some(s) if !s.is_empty() => DateTime::parse_from_rfc3339(&s)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid timestamp '{}': {}", s, e))),
            _ => Ok(None),
        }
    }
}

fn parse_decimal(s: &str) -> Result<rust_decimal::Decimal, String> {
    use std::str::FromStr;
    rust_decimal::Decimal::from_str(s)
        .or_else(|_| rust_decimal::Decimal::from_scientific(s))
        .map_err(|e| format!("invalid decimal '{}': {}", s, e))
}

/// Amount written as a JSON number; read from a number or a numeric string
///
/// Values with more significant digits than a double carries are written as
/// strings so nothing is rounded away.
pub mod amount {
    use std::str::FromStr;

    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value as JsonValue;

    pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value.to_f64() {
            Some(f) if Decimal::from_str(&f.to_string()).ok() == Some(*value) => {
                serializer.serialize_f64(f)
            }
            _ => serializer.collect_str(value),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let value: JsonValue = Deserialize::deserialize(deserializer)?;
        match value {
            JsonValue::Number(n) => super::parse_decimal(&n.to_string()).map_err(D::Error::custom),
            JsonValue::String(s) => super::parse_decimal(&s).map_err(D::Error::custom),
            _ => Err(D::Error::custom("expected number or string for amount")),
        }
    }
}

/// Optional variant of [`amount`]
pub mod amount_option {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value as JsonValue;

    pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => super::amount::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;
        let value: Option<JsonValue> = Option::deserialize(deserializer)?;
        match value {
            Some(JsonValue::Number(n)) => super::parse_decimal(&n.to_string())
                .map(Some)
                .map_err(D::Error::custom),
            Some(JsonValue::String(s)) => super::parse_decimal(&s)
                .map(Some)
                .map_err(D::Error::custom),
            Some(JsonValue::Null) | None => Ok(None),
            _ => Err(D::Error::custom("expected number or string for amount")),
        }
    }
}
