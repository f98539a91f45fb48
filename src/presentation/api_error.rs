// API error mapping for HTTP handlers
use crate::application::dashboard_store::{ImportError, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::DashboardNotFound(_))
            | ApiError::Store(StoreError::WidgetNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::DuplicateWidget { .. }) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::Serialization(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(_) | ApiError::Import(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::BAD_REQUEST {
            tracing::warn!("Rejected request: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
