//! Response envelope - involucro uniforme di tutte le risposte
//!
//! Ogni endpoint risponde con lo stesso involucro:
//! `{ statusCode, isSuccess, errorMessages, result }`.
//! L'envelope viene costruito una sola volta per esito e non è modificabile:
//! i costruttori garantiscono che `isSuccess` sia falso se e solo se ci sono
//! messaggi di errore, e che lo status sia 2xx solo in caso di successo.

use axum::http::StatusCode;
use serde::{Serialize, Serializer};

/// Status code carried inside the envelope body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Created,
    NoContent,
    BadRequest,
    NotFound,
    InternalError,
}

impl ResponseStatus {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
            Self::NoContent => 204,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalError => 500,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::Created | Self::NoContent)
    }

    fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::NoContent => "No Content",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::InternalError => "Internal Server Error",
        }
    }
}

impl From<ResponseStatus> for StatusCode {
    fn from(value: ResponseStatus) -> Self {
        StatusCode::from_u16(value.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

// serializzato come numero, come fanno i client che leggono l'envelope
impl Serialize for ResponseStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T = ()> {
    status_code: ResponseStatus,
    is_success: bool,
    error_messages: Vec<String>,
    result: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(result: T) -> Self {
        Self::success(ResponseStatus::Ok, Some(result))
    }

    pub fn created(result: T) -> Self {
        Self::success(ResponseStatus::Created, Some(result))
    }

    pub fn no_content() -> Self {
        Self::success(ResponseStatus::NoContent, None)
    }

    /// Failure envelope. An empty message list is replaced by the status
    /// reason so that a failed envelope never has zero messages.
    pub fn failure(status: ResponseStatus, messages: Vec<String>) -> Self {
        debug_assert!(!status.is_success(), "failure envelope with 2xx status");
        let error_messages = if messages.is_empty() {
            vec![status.reason().to_string()]
        } else {
            messages
        };
        Self {
            status_code: status,
            is_success: false,
            error_messages,
            result: None,
        }
    }

    fn success(status: ResponseStatus, result: Option<T>) -> Self {
        Self {
            status_code: status,
            is_success: true,
            error_messages: Vec::new(),
            result,
        }
    }

    pub fn status_code(&self) -> ResponseStatus {
        self.status_code
    }

    pub fn is_success(&self) -> bool {
        self.is_success
    }

    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }
}
