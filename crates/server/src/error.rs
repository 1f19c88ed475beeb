// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP-facing error mapping for the Control API (§6.1).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use behemoth_dispatch::DispatchError;
use behemoth_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("plan {0} not found")]
    PlanNotFound(String),
    #[error("execution {0} not found")]
    ExecutionNotFound(String),
    #[error("command {0} not found")]
    CommandNotFound(String),
    #[error("invalid multipart upload: {0}")]
    InvalidUpload(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::PlanNotFound(_) | ApiError::ExecutionNotFound(_) | ApiError::CommandNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::Dispatch(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, axum::Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}
