use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    PermissionDenied,
    HandlerNotFound,
    MethodNotImplemented,
    ReservedMethod,
    MalformedArguments,
    MessageTooLarge,
    TransportFailure,
    CapabilityRevoked,
    Canceled,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::HandlerNotFound => "handler_not_found",
            ErrorCode::MethodNotImplemented => "method_not_implemented",
            ErrorCode::ReservedMethod => "reserved_method",
            ErrorCode::MalformedArguments => "malformed_arguments",
            ErrorCode::MessageTooLarge => "message_too_large",
            ErrorCode::TransportFailure => "transport_failure",
            ErrorCode::CapabilityRevoked => "capability_revoked",
            ErrorCode::Canceled => "canceled",
            ErrorCode::Internal => "internal",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        RpcError {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: Value) -> Self {
        RpcError {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    pub fn handler_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::HandlerNotFound, message)
    }

    pub fn method_not_implemented(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MethodNotImplemented, message)
    }

    pub fn reserved_method(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ReservedMethod, message)
    }

    pub fn malformed_arguments(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedArguments, message)
    }

    pub fn message_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MessageTooLarge, message)
    }

    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransportFailure, message)
    }

    pub fn capability_revoked(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CapabilityRevoked, message)
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Canceled, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Whether this error is fatal to the owning incoming request.
    ///
    /// Every other kind rejects only the specific call and leaves the
    /// capability usable for further calls.
    pub fn is_fatal(&self) -> bool {
        self.code == ErrorCode::HandlerNotFound
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::malformed_arguments(format!("JSON error: {}", err))
    }
}
