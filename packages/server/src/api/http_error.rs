//! HTTP error responses
//!
//! Every failure leaves the server as `{message, code, details?}` with a
//! status derived from `code`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use navtree_core::services::TreeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "VALIDATION_ERROR" | "INVALID_REQUEST" => StatusCode::BAD_REQUEST,
            "NODE_NOT_FOUND" => StatusCode::NOT_FOUND,
            "CYCLE_DETECTED" | "DUPLICATE_KEY" => StatusCode::CONFLICT,
            "INVALID_PARENT" => StatusCode::UNPROCESSABLE_ENTITY,
            "STORE_UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<TreeError> for HttpError {
    fn from(err: TreeError) -> Self {
        match &err {
            TreeError::StoreUnavailable(source) => {
                tracing::warn!(error = %source, "Store unavailable");
                HttpError::with_details(
                    "The tree store is temporarily unavailable; retry the request",
                    err.code(),
                    source.to_string(),
                )
            }
            TreeError::OrderConflict(_) | TreeError::Configuration(_) => {
                tracing::error!(error = %err, "Internal tree error");
                HttpError::new(err.to_string(), err.code())
            }
            _ => HttpError::new(err.to_string(), err.code()),
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::with_details(
            "Request body is not valid JSON for this endpoint",
            "VALIDATION_ERROR",
            rejection.body_text(),
        )
    }
}
