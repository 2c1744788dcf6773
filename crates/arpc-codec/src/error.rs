//! # RPC Errors
//!
//! Every failure on the request path ends up as an [`RpcError`]: a
//! JSON-RPC error kind (which fixes code and message) plus optional
//! detail text carried in the `data` member of the error object.
//!
//! [`CodecError`] is the lower-level failure of converting a single value
//! between its wire and native forms; the decoder and encoder map it to
//! the appropriate [`RpcError`] kind.

use std::fmt;

use arpc_schema::{ErrorDescriptor, RootKind};
use thiserror::Error;

use crate::envelope::JsonRpcError;
use crate::hex::HexError;

/// JSON-RPC error categories and the domain errors declared by methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The payload is not JSON.
    Parse,
    /// The JSON is not a valid request envelope.
    InvalidRequest,
    /// No schema is known for the requested method.
    MethodNotFound,
    /// Parameters do not match the method signature.
    InvalidParams,
    /// Server-side failure, including results that violate their schema.
    Internal,
    /// The method's schemas could not be resolved.
    Schema,
    /// A domain error declared in the method's error schema.
    Domain { code: i64, message: String },
}

impl ErrorKind {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const SCHEMA_ERROR: i64 = -32001;

    pub fn code(&self) -> i64 {
        match self {
            Self::Parse => Self::PARSE_ERROR,
            Self::InvalidRequest => Self::INVALID_REQUEST,
            Self::MethodNotFound => Self::METHOD_NOT_FOUND,
            Self::InvalidParams => Self::INVALID_PARAMS,
            Self::Internal => Self::INTERNAL_ERROR,
            Self::Schema => Self::SCHEMA_ERROR,
            Self::Domain { code, .. } => *code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Parse => "Parse error",
            Self::InvalidRequest => "Invalid request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::Internal => "Internal error",
            Self::Schema => "Schema validation error",
            Self::Domain { message, .. } => message,
        }
    }
}

/// An error to be reported to the client as a JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    kind: ErrorKind,
    data: Option<String>,
}

impl RpcError {
    pub fn new(kind: ErrorKind, data: Option<String>) -> Self {
        Self { kind, data }
    }

    pub fn parse_error(data: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, Some(data.into()))
    }

    pub fn invalid_request(data: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, Some(data.into()))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(ErrorKind::MethodNotFound, Some(method.to_string()))
    }

    pub fn invalid_params(data: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, Some(data.into()))
    }

    pub fn internal(data: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, Some(data.into()))
    }

    pub fn schema(data: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, Some(data.into()))
    }

    /// A declared domain error, with its code and message from the
    /// error definition.
    pub fn domain(descriptor: &ErrorDescriptor, data: Option<String>) -> Self {
        Self::new(
            ErrorKind::Domain {
                code: descriptor.code(),
                message: descriptor.message().to_string(),
            },
            data,
        )
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn code(&self) -> i64 {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        self.kind.message()
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// The error object as it appears in a response.
    pub fn to_wire(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.code(),
            message: self.message().to_string(),
            data: self.data.clone().map(serde_json::Value::String),
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())?;
        if let Some(data) = &self.data {
            write!(f, ": {data}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RpcError {}

/// Failure converting one value between wire and native form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error(transparent)]
    Hex(#[from] HexError),

    /// The wire value has the wrong JSON type.
    #[error("expected a {expected} wire value, found {found}")]
    WireShape { expected: &'static str, found: String },

    /// The native value does not match the root of the declared type.
    #[error("declared type is {declared} but the value is {found}")]
    Kind { declared: RootKind, found: RootKind },

    /// DATA with an exact length received a buffer of another length.
    #[error("expected {expected} bytes of DATA, got {actual}")]
    Length { expected: usize, actual: usize },

    /// No object codec (and no fallback) for the object type.
    #[error("no object codec registered for type '{0}'")]
    UnknownObjectType(String),

    /// The object value holds a different host type than the codec handles.
    #[error("object '{type_name}' holds {found}, codec expects {expected}")]
    HostType {
        type_name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A host object codec failed.
    #[error("object codec for '{type_name}' failed: {reason}")]
    Object { type_name: String, reason: String },
}

impl CodecError {
    /// True when the failure is a server-side configuration problem
    /// rather than a bad value.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownObjectType(_) | Self::HostType { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_codes() {
        assert_eq!(RpcError::parse_error("x").code(), -32700);
        assert_eq!(RpcError::invalid_request("x").code(), -32600);
        assert_eq!(RpcError::method_not_found("m").code(), -32601);
        assert_eq!(RpcError::invalid_params("x").code(), -32602);
        assert_eq!(RpcError::internal("x").code(), -32603);
        assert_eq!(RpcError::schema("x").code(), -32001);
        assert_eq!(RpcError::schema("x").message(), "Schema validation error");
    }

    #[test]
    fn domain_error_takes_code_and_message_from_descriptor() {
        let descriptor = ErrorDescriptor::new("Unauthorized", 10001, "Unauthorized");
        let err = RpcError::domain(&descriptor, Some("key 0xee".to_string()));
        assert_eq!(err.code(), 10001);
        assert_eq!(err.message(), "Unauthorized");
        assert_eq!(err.data(), Some("key 0xee"));
        assert_eq!(err.to_string(), "Unauthorized (10001): key 0xee");
    }

    #[test]
    fn wire_form_omits_absent_data() {
        let wire = RpcError::new(ErrorKind::Internal, None).to_wire();
        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            serde_json::json!({"code": -32603, "message": "Internal error"})
        );
    }

    #[test]
    fn configuration_errors_are_flagged() {
        assert!(CodecError::UnknownObjectType("T".into()).is_configuration());
        assert!(!CodecError::Length { expected: 32, actual: 1 }.is_configuration());
    }
}
