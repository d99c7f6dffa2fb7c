use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

use crate::{
    services::{ServiceError, SwapWarning, Updated},
    utils::validation::ValidationError,
};

/// `{success: true, data}`
#[derive(Debug, Serialize, Clone)]
pub struct ApiData<T> {
    pub success: bool,
    pub data: T,
}

/// `{success: false, warning: true, message, conflictWith, currentOrder}`, sent with 200.
#[derive(Debug, Serialize, Clone)]
pub struct ApiWarning<T> {
    pub success: bool,
    pub warning: bool,
    #[serde(flatten)]
    pub detail: SwapWarning<T>,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    with_status(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: T) -> Response {
    with_status(StatusCode::CREATED, data)
}

fn with_status<T: Serialize>(status: StatusCode, data: T) -> Response {
    (
        status,
        Json(ApiData {
            success: true,
            data,
        }),
    )
        .into_response()
}

/// `{success: true}` with no payload.
pub fn done() -> Response {
    Json(json!({ "success": true })).into_response()
}

pub fn updated<T: Serialize>(outcome: Updated<T>) -> Response {
    match outcome {
        Updated::Applied(value) => ok(value),
        Updated::NeedsConfirmation(detail) => Json(ApiWarning {
            success: false,
            warning: true,
            detail,
        })
        .into_response(),
    }
}

/// Hard failure rendered as `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => Self::not_found(message),
            ServiceError::BadRequest(message) => Self::bad_request(message),
            ServiceError::Database { message, source } => {
                error!(err = ?source, "{message}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.0)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(reason = %rejection.body_text(), "rejected request body");
        Self::bad_request("Invalid JSON body")
    }
}

/// `Json` extractor that rejects with the error envelope instead of plain text.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub type ApiResult = Result<Response, ApiError>;
