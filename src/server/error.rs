//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::PredictError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Predict(PredictError::Inference(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Predict(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::Predict(e) => e.kind(),
            ServerError::BadRequest(_) => "bad_request",
            ServerError::NotFound(_) => "not_found",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), detail = %self, "Prediction failed");
        } else {
            tracing::debug!(kind = self.kind(), detail = %self, "Rejected request");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InferenceError, TransformError, ValidationError};

    #[test]
    fn test_status_by_kind() {
        let validation = ServerError::from(PredictError::from(ValidationError::MissingField("Age")));
        assert_eq!(validation.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(validation.kind(), "validation");

        let transform = ServerError::from(PredictError::from(TransformError::MissingValue("Age".to_string())));
        assert_eq!(transform.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let inference = ServerError::from(PredictError::from(InferenceError::NotFitted));
        assert_eq!(inference.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(inference.kind(), "inference");
    }

    #[test]
    fn test_interrupted_scoring_is_server_error() {
        let err = ServerError::from(PredictError::from(InferenceError::Interrupted(
            "task panicked".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "inference");
        assert!(err.to_string().contains("task panicked"));
    }

    #[test]
    fn test_message_is_inner_error() {
        let err = ServerError::from(PredictError::from(ValidationError::MissingField("Age")));
        assert_eq!(err.to_string(), "missing field: Age");
    }
}
