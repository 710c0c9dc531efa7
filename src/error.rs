use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("server configuration error: {0}")]
    Config(String),

    #[error("upstream search failed: {0}")]
    Upstream(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::MethodNotAllowed => {
                tracing::warn!("Rejected non-POST request");
                (
                    StatusCode::METHOD_NOT_ALLOWED,
                    ErrorResponse {
                        message: "method not allowed".to_string(),
                        error_details: None,
                    },
                )
            }
            AppError::MalformedBody(msg) => {
                tracing::warn!(error = %msg, "Malformed request body");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        message: msg.clone(),
                        error_details: None,
                    },
                )
            }
            AppError::PayloadTooLarge(msg) => {
                tracing::warn!(error = %msg, "Request body too large");
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    ErrorResponse {
                        message: "request body too large".to_string(),
                        error_details: None,
                    },
                )
            }
            AppError::Config(msg) => {
                // Not a per-request fault: the deployment is missing something.
                tracing::error!(kind = "configuration", error = %msg, "Server configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        message: "server configuration error".to_string(),
                        error_details: None,
                    },
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!(kind = "upstream", error = %msg, "Upstream search error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        message: "error performing web search".to_string(),
                        error_details: Some(msg.clone()),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::MalformedBody(rejection.body_text())
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
