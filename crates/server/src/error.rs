// SPDX-License-Identifier: MIT OR Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of error kinds surfaced by the server, each with a fixed HTTP
/// status and machine-readable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    TransportError,
    ProtocolError,
    NotFound,
    ValidationError,
    AdmissionDenied,
    Unauthorized,
    Timeout,
    StorageError,
    LicenseError,
    Internal,
}

impl ErrorKind {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::TransportError => 502,
            Self::ProtocolError => 400,
            Self::NotFound => 404,
            Self::ValidationError => 400,
            Self::AdmissionDenied => 403,
            Self::Unauthorized => 401,
            Self::Timeout => 504,
            Self::StorageError => 500,
            Self::LicenseError => 502,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransportError => "TRANSPORT_ERROR",
            Self::ProtocolError => "PROTOCOL_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::AdmissionDenied => "ADMISSION_DENIED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Timeout => "TIMEOUT",
            Self::StorageError => "STORAGE_ERROR",
            Self::LicenseError => "LICENSE_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody {
            code: self.as_str().to_owned(),
            message: message.into(),
            upgrade_required: *self == Self::AdmissionDenied,
        }
    }

    pub fn to_http_response(&self, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "is_false")]
    pub upgrade_required: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A kind carrying the message that produced it. Service-layer functions
/// return this; HTTP handlers turn it into a response at the boundary.
#[derive(Debug)]
pub struct PankhaError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PankhaError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn admission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AdmissionDenied, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportError, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProtocolError, message)
    }

    pub fn license(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::LicenseError, message)
    }
}

impl fmt::Display for PankhaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for PankhaError {}

impl From<pankha_storage::StorageError> for PankhaError {
    fn from(err: pankha_storage::StorageError) -> Self {
        match err {
            pankha_storage::StorageError::NotFound(msg) => Self::new(ErrorKind::NotFound, msg),
            pankha_storage::StorageError::Conflict(msg) => Self::new(ErrorKind::ValidationError, msg),
            other => Self::new(ErrorKind::StorageError, other.to_string()),
        }
    }
}

impl IntoResponse for PankhaError {
    fn into_response(self) -> Response {
        self.kind.to_http_response(self.message).into_response()
    }
}

pub type ServerResult<T> = Result<T, PankhaError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
