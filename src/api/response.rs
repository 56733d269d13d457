// src/api/response.rs
//
// Every route answers with the same JSON envelope, including requests the
// extractors reject before a handler runs.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::image_processing::ImageError;

/// `{"success": .., "data": .., "error": ..}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler outcome: data for a 200, or a status and message
pub enum ApiResult<T: Serialize> {
    Success(T),
    Error(StatusCode, String),
}

impl<T: Serialize> ApiResult<T> {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiResult::Success(_) => StatusCode::OK,
            ApiResult::Error(status, _) => *status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResult<T> {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiResult::Success(data) => ApiResponse::success(data),
            ApiResult::Error(_, message) => ApiResponse::error(message),
        };
        (status, Json(body)).into_response()
    }
}

pub fn api_success<T: Serialize>(data: T) -> ApiResult<T> {
    ApiResult::Success(data)
}

pub fn api_error<T: Serialize>(status: StatusCode, message: impl Into<String>) -> ApiResult<T> {
    ApiResult::Error(status, message.into())
}

pub fn bad_request<T: Serialize>(message: impl Into<String>) -> ApiResult<T> {
    api_error(StatusCode::BAD_REQUEST, message)
}

pub fn not_found<T: Serialize>(message: impl Into<String>) -> ApiResult<T> {
    api_error(StatusCode::NOT_FOUND, message)
}

impl<T: Serialize> From<ImageError> for ApiResult<T> {
    fn from(err: ImageError) -> Self {
        bad_request(err.to_string())
    }
}

// Extractor rejections keep axum's status (400, 413, 415, 422) and message
macro_rules! rejection_into_api_result {
    ($($rejection:ty),+) => {
        $(
            impl<T: Serialize> From<$rejection> for ApiResult<T> {
                fn from(rejection: $rejection) -> Self {
                    api_error(rejection.status(), rejection.body_text())
                }
            }
        )+
    };
}

rejection_into_api_result!(QueryRejection, PathRejection, JsonRejection);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(ApiResponse::success(vec!["en"])).unwrap();
        assert_eq!(ok, json!({"success": true, "data": ["en"], "error": null}));

        let err = serde_json::to_value(ApiResponse::<()>::error("Unknown chat session")).unwrap();
        assert_eq!(
            err,
            json!({"success": false, "data": null, "error": "Unknown chat session"})
        );
    }

    #[test]
    fn test_image_errors_are_bad_requests() {
        let result = ApiResult::<()>::from(ImageError::Empty);
        assert_eq!(result.status(), StatusCode::BAD_REQUEST);
        match result {
            ApiResult::Error(_, message) => assert_eq!(message, "no image provided"),
            ApiResult::Success(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn test_success_status() {
        assert_eq!(api_success("OK").status(), StatusCode::OK);
        assert_eq!(not_found::<()>("gone").status(), StatusCode::NOT_FOUND);
    }
}
