use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Error type shared by the REST handlers. Each variant maps to one HTTP
/// status and a JSON body in the `{"detail": ...}` / `{"field": [...]}`
/// shape the API speaks.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    MethodNotAllowed(&'static str),

    /// Single-field validation failure, rendered as `{"field": ["message"]}`.
    #[error("{message}")]
    Field {
        field: &'static str,
        message: String,
    },

    /// Cross-field validation failure, rendered under "non_field_errors".
    #[error("{0}")]
    NonField(String),
}

impl ApiError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Field {
            field,
            message: message.into(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Field { .. } | ApiError::NonField(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            // Database details stay in the server log, not on the wire
            ApiError::Database(e) => {
                leptos::logging::error!("Database error: {:?}", e);
                json!({ "detail": "A server error occurred." })
            }
            ApiError::NotFound => json!({ "detail": "Not found." }),
            ApiError::Unauthorized(detail)
            | ApiError::Forbidden(detail)
            | ApiError::MethodNotAllowed(detail) => json!({ "detail": detail }),
            ApiError::Field { field, message } => {
                let field: &str = field;
                json!({ field: [message] })
            }
            ApiError::NonField(message) => json!({ "non_field_errors": [message] }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
