//! JSON-RPC 2.0 envelope types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::NativeValue;

pub const JSONRPC_VERSION: &str = "2.0";

/// A request as it appears on the wire. Unknown members are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub params: Vec<Value>,
}

/// A request whose parameters have been validated and decoded.
#[derive(Debug)]
pub struct DecodedRequest {
    pub jsonrpc: String,
    pub method: String,
    pub id: Option<String>,
    pub params: Vec<NativeValue>,
}

/// A response: exactly one of `result` or `error` besides the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(JsonRpcError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<String>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn error(id: Option<String>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: Outcome::Error(error),
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcError> {
        match &self.outcome {
            Outcome::Error(error) => Some(error),
            Outcome::Result(_) => None,
        }
    }
}

/// Text form of a request id. Strings pass through, numbers use their
/// JSON text, `null` or an absent id is `None`.
pub(crate) fn id_text(id: Option<&Value>) -> Result<Option<String>, String> {
    match id {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(format!("id must be a string or a number, found {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_serializes_flat() {
        let response = JsonRpcResponse::success(Some("1.0".to_string()), json!(true));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"jsonrpc":"2.0","id":"1.0","result":true}"#
        );
    }

    #[test]
    fn error_serializes_flat_and_parses_back() {
        let response = JsonRpcResponse::error(
            None,
            JsonRpcError {
                code: -32601,
                message: "Method not found".into(),
                data: Some(json!("nope")),
            },
        );
        let text = serde_json::to_string(&response).unwrap();
        assert_eq!(
            text,
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32601,"message":"Method not found","data":"nope"}}"#
        );
        let back: JsonRpcResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(back, response);
        assert!(back.result().is_none());
        assert_eq!(back.error_object().unwrap().code, -32601);
    }

    #[test]
    fn request_rejects_unknown_members() {
        let raw = json!({"jsonrpc": "2.0", "method": "m", "params": [], "id": 1, "extra": 0});
        assert!(serde_json::from_value::<JsonRpcRequest>(raw).is_err());
    }

    #[test]
    fn request_requires_method_and_params() {
        assert!(serde_json::from_value::<JsonRpcRequest>(json!({"jsonrpc": "2.0", "params": []})).is_err());
        assert!(serde_json::from_value::<JsonRpcRequest>(json!({"jsonrpc": "2.0", "method": "m"})).is_err());
        let ok = serde_json::from_value::<JsonRpcRequest>(json!({"jsonrpc": "2.0", "method": "m", "params": []}));
        assert!(ok.unwrap().id.is_none());
    }

    #[test]
    fn ids_normalize_to_text() {
        assert_eq!(id_text(Some(&json!("abc"))).unwrap(), Some("abc".to_string()));
        assert_eq!(id_text(Some(&json!(7))).unwrap(), Some("7".to_string()));
        assert_eq!(id_text(Some(&json!(null))).unwrap(), None);
        assert_eq!(id_text(None).unwrap(), None);
        assert!(id_text(Some(&json!([1]))).is_err());
    }
}
