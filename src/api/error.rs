use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::validate::ValidationError;
use super::{ErrorResponse, json_response};
use crate::core::SolveError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("targetRetirementAge is required to solve for a contribution")]
    MissingTargetAge,
    #[error("invalid JSON body: {}", .0.body_text())]
    Json(#[from] JsonRejection),
    #[error("invalid path: {}", .0.body_text())]
    Path(#[from] PathRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Validation(_)
            | ApiError::Solve(_)
            | ApiError::MissingTargetAge
            | ApiError::Json(_)
            | ApiError::Path(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(%status, error = %self, "request rejected");
        json_response(
            status,
            ErrorResponse {
                error: self.to_string(),
            },
        )
    }
}
