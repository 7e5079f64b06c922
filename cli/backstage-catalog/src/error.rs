//! Error handling for catalog API operations.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::params::ValidationError;

/// Error envelope the catalog uses for non-success responses.
///
/// ```json
/// { "error": { "name": "NotFoundError", "message": "..." }, "response": { "statusCode": 404 } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiErrorDetail {
    pub name: String,
    pub message: String,
}

/// Common error type for catalog API operations.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    /// The request parameters are invalid, nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The server answered with a non-success status.
    #[error("{}", fmt_api_error(.status, .detail))]
    APIError {
        status: StatusCode,
        detail: Option<ApiErrorDetail>,
    },
    #[error("request to catalog failed")]
    Request(#[source] reqwest::Error),
    #[error("catalog response is not valid JSON")]
    InvalidPayload(#[source] serde_json::Error),
    #[error("invalid catalog url")]
    InvalidUrl(#[source] url::ParseError),
    #[error("{}", .0)]
    Other(String),
}

impl CatalogClientError {
    /// The HTTP status of an API error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CatalogClientError::APIError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Turn the body of a non-success response into an error.
///
/// Bodies that aren't the catalog's error envelope (e.g. HTML from a proxy)
/// are omitted, only the status is kept.
pub(crate) fn parse_api_error(status: StatusCode, body: &[u8]) -> CatalogClientError {
    let detail = serde_json::from_slice::<ApiErrorResponse>(body)
        .ok()
        .map(|response| response.error);
    CatalogClientError::APIError { status, detail }
}

fn fmt_api_error(status: &StatusCode, detail: &Option<ApiErrorDetail>) -> String {
    match detail {
        Some(ApiErrorDetail { name, message }) => format!("{status}: {name}: {message}"),
        None => format!("{status}"),
    }
}
