use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

use crate::errors::{DomainError, ServiceError, ValidationError};

/// Error codes for FFI boundary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Success (no error)
    Success = 0,

    // General errors (1-99)
    InvalidArgument = 2,
    NullPointer = 3,
    InvalidUtf8 = 4,
    InvalidJson = 5,
    InternalError = 6,

    // Domain errors (200-299)
    ValidationFailed = 204,
    ExternalError = 209,

    // Service errors (300-399)
    ConfigurationError = 310,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// Error type for FFI boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FFIError {
    /// Error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (JSON string)
    pub details: Option<String>,
}

impl fmt::Display for FFIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {} ({})", self.code, self.message, details)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for FFIError {}

impl FFIError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: &str, details: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn null_pointer(argument: &str) -> Self {
        Self::with_details(
            ErrorCode::NullPointer,
            &format!("Null pointer passed for '{}'", argument),
            &json!({ "argument": argument }).to_string(),
        )
    }

    pub fn invalid_json(err: &serde_json::Error) -> Self {
        Self::with_details(
            ErrorCode::InvalidJson,
            &format!("Malformed payload: {}", err),
            &json!({ "line": err.line(), "column": err.column() }).to_string(),
        )
    }

    pub fn internal(message: String) -> Self {
        Self::new(ErrorCode::InternalError, &message)
    }
}

impl From<ValidationError> for FFIError {
    fn from(err: ValidationError) -> Self {
        let details = match &err {
            ValidationError::Required { field } => json!({ "field": field, "type": "required" }),
            ValidationError::MaxLength { field, max } => {
                json!({ "field": field, "type": "max_length", "max": max })
            }
            ValidationError::Range { field, min, max } => {
                json!({ "field": field, "type": "range", "min": min, "max": max })
            }
            ValidationError::Format { field, reason } => {
                json!({ "field": field, "type": "format", "reason": reason })
            }
        };
        Self::with_details(ErrorCode::ValidationFailed, &err.to_string(), &details.to_string())
    }
}

impl From<DomainError> for FFIError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(val_err) => val_err.into(),
            DomainError::External(msg) => Self::new(ErrorCode::ExternalError, &msg),
            DomainError::Internal(msg) => Self::new(ErrorCode::InternalError, &msg),
        }
    }
}

impl From<ServiceError> for FFIError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(domain_err) => domain_err.into(),
            ServiceError::Configuration(msg) => Self::new(ErrorCode::ConfigurationError, &msg),
        }
    }
}

/// Result type for FFI functions
pub type FFIResult<T> = Result<T, FFIError>;
