use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

/// JSON error envelope returned by API endpoints: `{status, message, data}`.
#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
    data: Value,
}

/// Application-wide error type.
///
/// Domain errors (`UrlNotFound`, `UrlDeleted`, `UrlExists`) are produced by
/// the storage backends and the URL service; `UniqueViolation` is the raw
/// backend uniqueness error the service translates into `UrlExists`. The
/// remaining variants carry HTTP-facing failures.
#[derive(Debug)]
pub enum AppError {
    /// Lookup of an absent short or original URL.
    UrlNotFound,
    /// Lookup of a tombstoned record by short URL.
    UrlDeleted,
    /// Insert of an original URL that already has a mapping. Carries the
    /// existing short URL so handlers can answer 409 with a usable link.
    UrlExists { short_url: String },
    /// Raw backend uniqueness violation, before translation. The constraint
    /// name distinguishes the original-URL index from the short-URL key.
    UniqueViolation { constraint: Option<String> },
    Validation { message: String, details: Value },
    Unauthorized { message: String },
    Forbidden { message: String },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::UrlNotFound => write!(f, "url not found"),
            AppError::UrlDeleted => write!(f, "url deleted"),
            AppError::UrlExists { short_url } => {
                write!(f, "url already exists: {short_url}")
            }
            AppError::UniqueViolation { constraint } => {
                write!(f, "unique violation: {constraint:?}")
            }
            AppError::Validation { message, .. }
            | AppError::Unauthorized { message }
            | AppError::Forbidden { message }
            | AppError::Internal { message, .. } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, data) = match self {
            AppError::UrlNotFound => (StatusCode::NOT_FOUND, "URL not found".to_string(), json!({})),
            AppError::UrlDeleted => (
                StatusCode::GONE,
                "URL has been deleted".to_string(),
                json!({}),
            ),
            AppError::UrlExists { short_url } => (
                StatusCode::CONFLICT,
                "URL already exists".to_string(),
                json!({ "short_url": short_url }),
            ),
            AppError::UniqueViolation { constraint } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
                json!({ "constraint": constraint }),
            ),
            AppError::Validation { message, details } => {
                (StatusCode::BAD_REQUEST, message, details)
            }
            AppError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message, json!({})),
            AppError::Forbidden { message } => (StatusCode::FORBIDDEN, message, json!({})),
            AppError::Internal { message, details } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, details)
            }
        };

        let body = ErrorBody {
            status: status.as_u16(),
            message,
            data,
        };

        (status, Json(body)).into_response()
    }
}

/// Maps raw sqlx errors to the application error set.
///
/// Unique violations keep their constraint name so the URL service can tell
/// an original-URL conflict apart from a short-URL collision.
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::RowNotFound => AppError::UrlNotFound,
        e => {
            if let Some(db) = e.as_database_error()
                && db.is_unique_violation()
            {
                return AppError::UniqueViolation {
                    constraint: db.constraint().map(str::to_owned),
                };
            }
            AppError::internal("Database error", json!({ "cause": e.to_string() }))
        }
    }
}
