//! Tolerant decoding for story fields.
//!
//! Story documents are hand-authored and only shape-checked by the
//! validator, so a few fields accept loose input: stray non-string ids are
//! dropped, `null` stands in for an empty collection, and effect entries the
//! engine does not understand are skipped instead of failing the document.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::effect::Effect;

/// Decode `T`, treating `null` as `T::default()`.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode `T`, falling back to `T::default()` for any input of the wrong
/// shape.
pub fn lossy<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Decode a keyed map whose entries fall back to `T::default()` when they
/// have the wrong shape. Anything that is not an object decodes as empty.
pub fn lossy_map<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .map(|(key, value)| (key, serde_json::from_value(value).unwrap_or_default()))
        .collect())
}

/// Decode a schema version, accepting integral floats such as `1.0`.
pub fn schema_version<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    as_integer(&value)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| D::Error::custom(format!("invalid schema version {value}")))
}

/// Decode minimum thresholds. Fractions round up, which keeps `>=`
/// comparisons against whole numbers exact. Non-numeric entries are dropped.
pub fn min_thresholds<'de, D>(deserializer: D) -> Result<BTreeMap<String, i64>, D::Error>
where
    D: Deserializer<'de>,
{
    thresholds(deserializer, f64::ceil)
}

/// Decode maximum thresholds. Fractions round down, which keeps `<=`
/// comparisons against whole numbers exact. Non-numeric entries are dropped.
pub fn max_thresholds<'de, D>(deserializer: D) -> Result<BTreeMap<String, i64>, D::Error>
where
    D: Deserializer<'de>,
{
    thresholds(deserializer, f64::floor)
}

fn thresholds<'de, D>(
    deserializer: D,
    round: fn(f64) -> f64,
) -> Result<BTreeMap<String, i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| {
            let bound = match value.as_i64() {
                Some(n) => n,
                None => as_integer(&Value::from(round(value.as_f64()?)))?,
            };
            Some((key, bound))
        })
        .collect())
}

/// Decode a list of ids, keeping only the string entries.
///
/// Anything that is not an array decodes as an empty list.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(values) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

/// Decode an optional id, treating non-strings as absent.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// Decode an optional integer, treating non-numbers as absent.
///
/// Integral floats such as `10.0` are accepted.
pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_integer(&Value::deserialize(deserializer)?))
}

/// Decode an effect list, dropping entries with an unknown `op` or a
/// malformed payload.
pub fn effect_list<'de, D>(deserializer: D) -> Result<Vec<Effect>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(values) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(values.into_iter().filter_map(decode_effect).collect())
}

/// Decode a single effect entry, logging and returning `None` when the
/// engine would ignore it.
pub fn decode_effect(value: Value) -> Option<Effect> {
    let op = value
        .get("op")
        .and_then(Value::as_str)
        .unwrap_or("<missing>")
        .to_string();
    match serde_json::from_value(value) {
        Ok(effect) => Some(effect),
        Err(err) => {
            warn!(op = %op, error = %err, "ignoring effect");
            None
        }
    }
}

/// Read a JSON number as an integer. Fractional values are rejected.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}
