//! Documents and write preconditions.

use crate::error::FirestoreError;
use crate::value::{Value, fields_into_json};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A Firestore document as returned by the REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name: `projects/{p}/databases/{db}/documents/{path}`
    pub name: String,

    /// Field values in their typed encoding
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,

    /// When the document was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,

    /// When the document was last changed; used as a write precondition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// The document id (last segment of the resource name)
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Decode the fields into a plain serde type.
    ///
    /// # Errors
    ///
    /// - [`FirestoreError::InvalidValue`] if a typed value is malformed
    /// - [`FirestoreError::ResponseParseFailed`] if the fields don't match `T`
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, FirestoreError> {
        let object = fields_into_json(self.fields.clone(), "")?;
        serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| {
            FirestoreError::ResponseParseFailed(format!("document {}: {e}", self.id()))
        })
    }
}

/// Condition the server checks before applying a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// The document must (or must not) exist
    Exists(bool),
    /// The document must not have changed since this time
    UpdateTime(DateTime<Utc>),
}

impl Precondition {
    /// Query parameter encoding (`currentDocument.*`)
    #[must_use]
    pub fn query_param(&self) -> (&'static str, String) {
        match self {
            Self::Exists(exists) => ("currentDocument.exists", exists.to_string()),
            Self::UpdateTime(time) => (
                "currentDocument.updateTime",
                time.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ),
        }
    }
}
