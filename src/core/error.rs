//! Error types - errori dello store e conversione in risposta HTTP
//!
//! `StoreError` è l'unico errore che può nascere sotto i service handler.
//! `AppError` è ciò che gli handler restituiscono: viene sempre renderizzato
//! come `ApiResponse` di fallimento, mai come panic.

use crate::dtos::{ApiResponse, ResponseStatus};
use crate::patch::PatchError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::{Json, http::StatusCode, response::IntoResponse};
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::error;

/// Failure raised by an entity store binding.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row carries the identifier targeted by a write.
    #[error("no row with id {id} in table '{table}'")]
    RowNotFound { table: &'static str, id: i32 },

    /// A write would duplicate the value of a unique column.
    #[error("unique constraint violated: {0}")]
    Duplicate(String),

    /// The store rejected the write (foreign key, check constraint, type mismatch).
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The store could not be reached in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("store failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => match db.kind() {
                ErrorKind::UniqueViolation => Self::Duplicate(db.message().to_string()),
                ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => Self::Constraint(db.message().to_string()),
                // deadlock, lock wait timeout, syntax...
                _ => Self::Backend(db.message().to_string()),
            },

            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::Unavailable("database connection pool exhausted or closed".to_string())
            }

            sqlx::Error::Io(io) => Self::Unavailable(io.to_string()),

            other => Self::Backend(other.to_string()),
        }
    }
}

/// Errore restituito dagli handler HTTP.
///
/// `status` è lo status di trasporto, `code` quello scritto nell'envelope.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: ResponseStatus,
    messages: Vec<String>,
}

impl AppError {
    pub fn new(status: StatusCode, code: ResponseStatus, messages: Vec<String>) -> Self {
        Self {
            status,
            code,
            messages,
        }
    }

    // Common error constructors
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::validation(vec![message.into()])
    }

    pub fn validation(messages: Vec<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ResponseStatus::BadRequest, messages)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ResponseStatus::NotFound,
            vec![message.into()],
        )
    }

    /// Store failure on a write path (delete, update, patch): the transport
    /// status becomes 400 unless the failure already carries a 4xx.
    pub fn write_failure(err: StoreError) -> Self {
        let mut app_error = Self::from(err);
        if app_error.status.is_success() {
            app_error.status = StatusCode::BAD_REQUEST;
        }
        app_error
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> ResponseStatus {
        self.code
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

/// Lo store error viene catturato al confine dell'handler: sul percorso di
/// lettura il trasporto resta 200 e il fallimento vive solo nell'envelope.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RowNotFound { .. } => Self::not_found(err.to_string()),
            StoreError::Duplicate(_) => Self::bad_request(err.to_string()),
            other => {
                error!(error = %other, "Store operation failed");
                Self::new(
                    StatusCode::OK,
                    ResponseStatus::InternalError,
                    vec![other.to_string()],
                )
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid ({})", field, e.code),
                })
            })
            .collect();
        // HashMap order is not stable
        messages.sort();
        Self::validation(messages)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<Vec<PatchError>> for AppError {
    fn from(errors: Vec<PatchError>) -> Self {
        Self::validation(errors.iter().map(ToString::to_string).collect())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ApiResponse::<()>::failure(self.code, self.messages));
        (self.status, body).into_response()
    }
}
