//! Firestore typed values.
//!
//! The REST API wraps every field in a single-key object naming its type,
//! e.g. `{"stringValue": "ABC123"}` or `{"integerValue": "20"}` (64-bit
//! integers travel as strings). [`Value`] mirrors that encoding and converts
//! to and from plain `serde_json::Value` so documents can be decoded with
//! ordinary serde derives.

use crate::error::FirestoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A Firestore field value in its REST encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    /// `{"nullValue": null}`
    NullValue(()),
    /// `{"booleanValue": true}`
    BooleanValue(bool),
    /// `{"integerValue": "42"}`
    IntegerValue(String),
    /// `{"doubleValue": 4.2}`
    DoubleValue(f64),
    /// `{"timestampValue": "2025-01-01T00:00:00Z"}`
    TimestampValue(String),
    /// `{"stringValue": "text"}`
    StringValue(String),
    /// `{"bytesValue": "<base64>"}`
    BytesValue(String),
    /// `{"referenceValue": "projects/…/documents/…"}`
    ReferenceValue(String),
    /// `{"geoPointValue": {"latitude": 1.0, "longitude": 2.0}}`
    GeoPointValue(GeoPoint),
    /// `{"arrayValue": {"values": [...]}}`
    ArrayValue(ArrayValue),
    /// `{"mapValue": {"fields": {...}}}`
    MapValue(MapValue),
}

/// Latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Degrees latitude
    #[serde(default)]
    pub latitude: f64,
    /// Degrees longitude
    #[serde(default)]
    pub longitude: f64,
}

/// Array payload; Firestore omits `values` for an empty array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    /// Elements
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Map payload; Firestore omits `fields` for an empty map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    /// Entries
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Value {
    /// Shorthand for a string value
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::StringValue(value.into())
    }

    /// Convert into plain JSON.
    ///
    /// Timestamps, bytes and references become strings. Non-finite doubles
    /// become `null`.
    ///
    /// # Errors
    ///
    /// Returns [`FirestoreError::InvalidValue`] if an integer payload is not
    /// a valid 64-bit integer. `field` names the value in the error.
    pub fn into_json(self, field: &str) -> Result<serde_json::Value, FirestoreError> {
        Ok(match self {
            Self::NullValue(()) => serde_json::Value::Null,
            Self::BooleanValue(b) => serde_json::Value::Bool(b),
            Self::IntegerValue(raw) => {
                let n = raw
                    .parse::<i64>()
                    .map_err(|e| FirestoreError::InvalidValue {
                        field: field.to_string(),
                        reason: format!("integer {raw:?}: {e}"),
                    })?;
                serde_json::Value::from(n)
            },
            Self::DoubleValue(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::TimestampValue(s)
            | Self::StringValue(s)
            | Self::BytesValue(s)
            | Self::ReferenceValue(s) => serde_json::Value::String(s),
            Self::GeoPointValue(point) => serde_json::json!({
                "latitude": point.latitude,
                "longitude": point.longitude,
            }),
            Self::ArrayValue(array) => serde_json::Value::Array(
                array
                    .values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| v.into_json(&format!("{field}[{i}]")))
                    .collect::<Result<_, _>>()?,
            ),
            Self::MapValue(map) => serde_json::Value::Object(fields_into_json(map.fields, field)?),
        })
    }

    /// Encode plain JSON as a Firestore value.
    ///
    /// Whole numbers that fit in `i64` become integers, other numbers doubles.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::NullValue(()),
            serde_json::Value::Bool(b) => Self::BooleanValue(*b),
            serde_json::Value::Number(n) => n.as_i64().map_or_else(
                || Self::DoubleValue(n.as_f64().unwrap_or(f64::NAN)),
                |i| Self::IntegerValue(i.to_string()),
            ),
            serde_json::Value::String(s) => Self::StringValue(s.clone()),
            serde_json::Value::Array(items) => Self::ArrayValue(ArrayValue {
                values: items.iter().map(Self::from_json).collect(),
            }),
            serde_json::Value::Object(map) => Self::MapValue(MapValue {
                fields: map
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            }),
        }
    }
}

/// Convert a document's field map into a JSON object.
///
/// `prefix` is prepended to field names in error messages; pass `""` for a
/// top-level document.
///
/// # Errors
///
/// Returns [`FirestoreError::InvalidValue`] for the first unconvertible field.
pub fn fields_into_json(
    fields: BTreeMap<String, Value>,
    prefix: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, FirestoreError> {
    fields
        .into_iter()
        .map(|(name, value)| {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            value.into_json(&path).map(|json| (name, json))
        })
        .collect()
}
