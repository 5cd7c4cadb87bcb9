//! Error types for the API.
//!
//! Every handler returns `Result<_, ApiError>`. The error decides the status
//! code and the JSON body:
//!
//! ```text
//! {"code": "VALIDATION_ERROR", "message": "...", "errors": [{"field": "name", "message": "..."}]}
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use defter_core::{CoreError, ValidationErrors};
use defter_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// One or more fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// The request itself could not be read (malformed JSON, bad query).
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<CoreError> for ApiError {
    fn from(error: CoreError) -> Self {
        ApiError::Db(DbError::Core(error))
    }
}

/// One failed field in a 400 body.
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ApiError {
    /// Status code and machine-readable code of this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            ApiError::Db(err) => match err {
                DbError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                DbError::UniqueViolation { .. } => (StatusCode::CONFLICT, "CONFLICT"),
                DbError::ForeignKeyViolation { .. } => (StatusCode::BAD_REQUEST, "INVALID_REFERENCE"),
                DbError::Core(core) => match core {
                    CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                    CoreError::NotPayable { .. } | CoreError::CustomerMismatch { .. } => {
                        (StatusCode::BAD_REQUEST, "INVALID_PAYMENT")
                    }
                    CoreError::Overpayment { .. }
                    | CoreError::NegativeTotal { .. }
                    | CoreError::AmountOverflow { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "BUSINESS_RULE")
                    }
                },
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            },
        }
    }

    fn field_errors(&self) -> Vec<FieldError> {
        let errors = match self {
            ApiError::Validation(errors) => errors,
            ApiError::Db(DbError::Core(CoreError::Validation(errors))) => errors,
            _ => return Vec::new(),
        };

        errors
            .errors()
            .iter()
            .map(|e| FieldError {
                field: e.field().to_string(),
                message: e.to_string(),
            })
            .collect()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, code, "Request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(error = %self, code, "Request rejected");
            match &self {
                ApiError::Validation(_)
                | ApiError::Db(DbError::Core(CoreError::Validation(_))) => {
                    "Validation failed".to_string()
                }
                other => other.to_string(),
            }
        };

        let body = ErrorBody {
            code,
            message,
            errors: self.field_errors(),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use defter_core::ValidationError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(DbError::not_found("Product", "p1")).status().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DbError::duplicate("sku", "TEA-001")).status().0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(CoreError::Overpayment {
                transaction_number: "INV-1".to_string(),
                outstanding_cents: 100,
                requested_cents: 200,
            })
            .status(),
            (StatusCode::UNPROCESSABLE_ENTITY, "BUSINESS_RULE")
        );
        assert_eq!(
            ApiError::from(CoreError::AmountOverflow {
                context: "invoice total".to_string(),
            })
            .status(),
            (StatusCode::UNPROCESSABLE_ENTITY, "BUSINESS_RULE")
        );
        assert_eq!(
            ApiError::from(DbError::QueryFailed("boom".to_string())).status().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_field_errors_from_nested_validation() {
        let errors = ValidationErrors::from(ValidationError::Required {
            field: "name".to_string(),
        });
        let api = ApiError::from(CoreError::from(errors));

        let fields = api.field_errors();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "name");
        assert_eq!(api.status(), (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"));
    }
}
