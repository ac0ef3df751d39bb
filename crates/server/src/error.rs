// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `EngineError -> HTTP response` mapping (§7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ob_engine::EngineError;
use serde_json::json;

/// Newtype so this crate may implement the foreign `IntoResponse` trait for
/// the foreign `EngineError` type.
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::InvalidState(_) => StatusCode::BAD_REQUEST,
            EngineError::CycleDetected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Adapter(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
