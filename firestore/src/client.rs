//! Firestore REST client implementation

use crate::{
    document::{Document, Precondition},
    error::FirestoreError,
    value::Value,
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Default database id
pub const DEFAULT_DATABASE: &str = "(default)";

/// Firestore REST client
///
/// Covers the two calls the scanner needs: a `runQuery` with a single
/// equality filter, and a `PATCH` of selected fields with an optional
/// precondition.
#[derive(Clone)]
pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    database: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl FirestoreClient {
    /// Create a client for the given project against the public endpoint
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            api_key: None,
        }
    }

    /// Point the client at another endpoint (emulator, test server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a database other than `(default)`
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Send an API key with every request
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Bound every request by `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`FirestoreError::RequestFailed`] if the HTTP client cannot be built.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self, FirestoreError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FirestoreError::RequestFailed(e.to_string()))?;
        Ok(self)
    }

    /// `{base}/projects/{project}/databases/{database}/documents`
    #[must_use]
    pub fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.base_url, self.project_id, self.database
        )
    }

    /// Query `collection_id` under `parent` for documents where
    /// `field == value`.
    ///
    /// `parent` is a document path such as `organiser/o1/events/e1`, or `""`
    /// for a root collection. Results come back in whatever order the server
    /// chooses.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures.
    pub async fn query_equal(
        &self,
        parent: &str,
        collection_id: &str,
        field: &str,
        value: Value,
    ) -> Result<Vec<Document>, FirestoreError> {
        let url = if parent.is_empty() {
            format!("{}:runQuery", self.documents_root())
        } else {
            format!("{}/{}:runQuery", self.documents_root(), parent)
        };

        let body = RunQueryRequest {
            structured_query: StructuredQuery {
                from: vec![CollectionSelector {
                    collection_id: collection_id.to_string(),
                }],
                filter: Filter {
                    field_filter: FieldFilter {
                        field: FieldReference {
                            field_path: field.to_string(),
                        },
                        op: "EQUAL",
                        value,
                    },
                },
            },
        };

        tracing::debug!(%url, collection_id, field, "Running equality query");

        let response = self
            .client
            .post(&url)
            .query(&self.key_param())
            .json(&body)
            .send()
            .await
            .map_err(|e| FirestoreError::RequestFailed(e.to_string()))?;

        let response = check_status(response, &url).await?;
        let rows = response
            .json::<Vec<RunQueryResponse>>()
            .await
            .map_err(|e| FirestoreError::ResponseParseFailed(e.to_string()))?;

        Ok(rows.into_iter().filter_map(|row| row.document).collect())
    }

    /// Overwrite the given fields of the document at `document_path`,
    /// leaving all other fields untouched.
    ///
    /// # Errors
    ///
    /// - [`FirestoreError::PreconditionFailed`] if `precondition` did not hold
    /// - [`FirestoreError::NotFound`] if the document is missing
    /// - network, API and parsing errors otherwise
    pub async fn update_fields(
        &self,
        document_path: &str,
        fields: BTreeMap<String, Value>,
        precondition: Option<Precondition>,
    ) -> Result<Document, FirestoreError> {
        let url = format!("{}/{}", self.documents_root(), document_path);

        let mut params: Vec<(&str, String)> = fields
            .keys()
            .map(|name| ("updateMask.fieldPaths", name.clone()))
            .collect();
        if let Some(precondition) = precondition {
            params.push(precondition.query_param());
        }
        params.extend(self.key_param());

        tracing::debug!(%url, ?precondition, "Updating document fields");

        let response = self
            .client
            .patch(&url)
            .query(&params)
            .json(&PatchBody { fields })
            .send()
            .await
            .map_err(|e| FirestoreError::RequestFailed(e.to_string()))?;

        let response = check_status(response, &url).await?;
        response
            .json::<Document>()
            .await
            .map_err(|e| FirestoreError::ResponseParseFailed(e.to_string()))
    }

    fn key_param(&self) -> Vec<(&'static str, String)> {
        self.api_key
            .iter()
            .map(|key| ("key", key.clone()))
            .collect()
    }
}

/// Turn non-success responses into typed errors
async fn check_status(response: Response, url: &str) -> Result<Response, FirestoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorEnvelope>(&body).ok();
    let message = detail
        .as_ref()
        .map_or_else(|| body.clone(), |d| d.error.message.clone());
    let rpc_status = detail.as_ref().map(|d| d.error.status.as_str());

    Err(match (status, rpc_status) {
        (_, Some("FAILED_PRECONDITION" | "ABORTED"))
        | (StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED, _) => {
            FirestoreError::PreconditionFailed(message)
        },
        (StatusCode::NOT_FOUND, _) => FirestoreError::NotFound(url.to_string()),
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            FirestoreError::Unauthorized(message)
        },
        (status, _) => FirestoreError::ApiError {
            status: status.as_u16(),
            message,
        },
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest {
    structured_query: StructuredQuery,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StructuredQuery {
    from: Vec<CollectionSelector>,
    #[serde(rename = "where")]
    filter: Filter,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSelector {
    collection_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Filter {
    field_filter: FieldFilter,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldFilter {
    field: FieldReference,
    op: &'static str,
    value: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldReference {
    field_path: String,
}

#[derive(Serialize)]
struct PatchBody {
    fields: BTreeMap<String, Value>,
}

/// One element of the `runQuery` response stream; rows without a
/// `document` only carry progress information.
#[derive(Deserialize)]
struct RunQueryResponse {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}
