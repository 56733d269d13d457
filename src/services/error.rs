// src/services/error.rs

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Why a call to a remote service did not produce a usable payload
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    pub fn parse(message: impl Into<String>) -> Self {
        ApiError::Parse(message.into())
    }

    /// The HTTP status for `Status` failures
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Anything but 200 is a failure; the body is kept for logging.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if status != reqwest::StatusCode::OK {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| ApiError::parse(e.to_string()))
}
