//! # Response Encoding
//!
//! Results are encoded by the root of the method's declared result type
//! and then validated against the result schema before they are sent. A
//! result that fails is a server bug and is reported as `Internal error`.
//!
//! Error responses never fail to encode: if serialization of the error
//! object breaks, a fixed `Internal error` document carrying the failure
//! text is returned instead.

use std::sync::Arc;

use arpc_schema::{RootKind, SchemaValidationError};
use serde_json::Value;

use crate::catalog::{MethodCatalog, TypedSchema};
use crate::decoder::catalog_failure;
use crate::envelope::{JsonRpcResponse, JSONRPC_VERSION};
use crate::error::{CodecError, ErrorKind, RpcError};
use crate::objects::ObjectCodecTable;
use crate::scalar::encode_scalar;
use crate::value::NativeValue;

pub struct ResponseEncoder {
    catalog: Arc<MethodCatalog>,
    objects: Arc<ObjectCodecTable>,
}

impl ResponseEncoder {
    pub fn new(catalog: Arc<MethodCatalog>, objects: Arc<ObjectCodecTable>) -> Self {
        Self { catalog, objects }
    }

    /// Encode the result of `method` as a success response.
    pub fn encode_response(&self, id: Option<&str>, result: &NativeValue, method: &str) -> Result<String, RpcError> {
        let declared = self.catalog.response(method).map_err(|e| catalog_failure(method, e))?;
        let encoded = self.encode_result(&declared, result).map_err(|e| {
            tracing::error!(method, error = %e, "result does not fit the declared type");
            RpcError::internal(e.to_string())
        })?;

        match self.catalog.validator().validate(declared.schema(), &encoded) {
            Ok(()) => {}
            Err(SchemaValidationError::ValidationFailed { violations, .. }) => {
                tracing::error!(method, result = %encoded, %violations, "result violates its own schema");
                return Err(RpcError::internal(format!(
                    "result of '{method}' does not match its schema: {encoded}"
                )));
            }
            Err(e) => {
                tracing::error!(method, error = %e, "result schema does not compile");
                return Err(RpcError::schema(e.to_string()));
            }
        }

        let response = JsonRpcResponse::success(id.map(str::to_string), encoded);
        serde_json::to_string(&response).map_err(|e| RpcError::internal(e.to_string()))
    }

    pub fn encode_error(&self, id: Option<&str>, error: &RpcError) -> String {
        encode_error(id, error)
    }

    fn encode_result(&self, declared: &TypedSchema, result: &NativeValue) -> Result<Value, CodecError> {
        match (declared.ty().root_kind(), result) {
            (RootKind::Object, NativeValue::Object(object)) => self.objects.encode(declared.ty(), object),
            (RootKind::Object, other) => Err(CodecError::Kind {
                declared: RootKind::Object,
                found: other.kind(),
            }),
            _ => encode_scalar(result, declared.ty()),
        }
    }
}

/// Encode an error response. Never fails.
pub fn encode_error(id: Option<&str>, error: &RpcError) -> String {
    render_error(id, error, |response| serde_json::to_string(response))
}

fn render_error<F>(id: Option<&str>, error: &RpcError, serialize: F) -> String
where
    F: FnOnce(&JsonRpcResponse) -> Result<String, serde_json::Error>,
{
    let response = JsonRpcResponse::error(id.map(str::to_string), error.to_wire());
    match serialize(&response) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, code = error.code(), "error response failed to serialize");
            fallback_error(id, &e.to_string())
        }
    }
}

fn fallback_error(id: Option<&str>, failure: &str) -> String {
    let id = match id {
        Some(id) => format!("\"{}\"", escape_json(id)),
        None => "null".to_string(),
    };
    format!(
        r#"{{"jsonrpc":"{JSONRPC_VERSION}","id":{id},"error":{{"code":{},"message":"{}","data":"{}"}}}}"#,
        ErrorKind::INTERNAL_ERROR,
        ErrorKind::Internal.message(),
        escape_json(failure)
    )
}

fn escape_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde_json::json;

    #[test]
    fn error_response_carries_code_message_and_data() {
        let text = encode_error(Some("7"), &RpcError::invalid_params("bad"));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": "7", "error": {"code": -32602, "message": "Invalid params", "data": "bad"}})
        );
    }

    #[test]
    fn serialization_failure_falls_back_to_internal_error() {
        let err = RpcError::invalid_request("x");
        let text = render_error(Some("a\"b"), &err, |_| Err(serde_json::Error::custom("boom \"quoted\"\n")));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["id"], json!("a\"b"));
        assert_eq!(value["error"]["code"], json!(-32603));
        assert_eq!(value["error"]["message"], json!("Internal error"));
        assert!(value["error"]["data"].as_str().unwrap().contains("boom \"quoted\""));
    }

    #[test]
    fn fallback_without_id_is_null() {
        let value: Value = serde_json::from_str(&fallback_error(None, "\u{1}")).unwrap();
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["data"], json!("\u{1}"));
    }
}
