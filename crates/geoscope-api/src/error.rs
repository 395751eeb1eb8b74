use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geoscope_core::error::GeoscopeError;
use serde::Serialize;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            details: None,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<GeoscopeError> for ApiError {
    fn from(err: GeoscopeError) -> Self {
        match &err {
            GeoscopeError::Validation { .. } => {
                Self::bad_request("Validation failed").with_details(err.to_string())
            }
            GeoscopeError::MalformedGeometry { .. } => {
                Self::bad_request("Malformed geometry").with_details(err.to_string())
            }
            GeoscopeError::NotFound { entity, .. } => {
                Self::not_found(format!("{} not found", entity)).with_details(err.to_string())
            }
            GeoscopeError::Conflict { .. } => {
                Self::conflict("Conflict").with_details(err.to_string())
            }
            GeoscopeError::InvalidTransition { .. } => {
                Self::conflict("Invalid task transition").with_details(err.to_string())
            }
            _ => {
                tracing::error!(error = %err, "Request failed");
                Self::internal("Internal error").with_details(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoscope_core::models::{TaskId, TaskStatus};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GeoscopeError::validation("bbox", "inverted"), StatusCode::BAD_REQUEST),
            (
                GeoscopeError::MalformedGeometry { index: 2, reason: "ring not closed".into() },
                StatusCode::BAD_REQUEST,
            ),
            (GeoscopeError::not_found("Dataset", "x"), StatusCode::NOT_FOUND),
            (GeoscopeError::conflict("busy"), StatusCode::CONFLICT),
            (
                GeoscopeError::InvalidTransition {
                    task_id: TaskId::new(),
                    expected: TaskStatus::Pending,
                    actual: TaskStatus::Processing,
                    requested: TaskStatus::Cancelled,
                },
                StatusCode::CONFLICT,
            ),
            (GeoscopeError::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }

    #[test]
    fn test_details_carry_the_cause() {
        let err = ApiError::from(GeoscopeError::MalformedGeometry {
            index: 4,
            reason: "ring not closed".into(),
        });
        assert!(err.details.unwrap().contains("index 4"));
    }
}
