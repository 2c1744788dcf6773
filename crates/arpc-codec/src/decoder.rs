//! # Request Decoding
//!
//! Raw request text to [`DecodedRequest`], in this order:
//!
//! 1. Parse JSON (`Parse error` on failure).
//! 2. Read the envelope: `jsonrpc`, `method`, `params` array and optional
//!    `id`, nothing else (`Invalid request`).
//! 3. Look up the method's parameter types (`Method not found`).
//! 4. Check the parameter count, validate each parameter against its own
//!    schema node and decode it by the root of its type (`Invalid params`).

use std::sync::Arc;

use arpc_schema::{RootKind, SchemaValidationError};
use serde_json::Value;

use crate::catalog::{CatalogError, MethodCatalog, TypedSchema};
use crate::envelope::{id_text, DecodedRequest, JsonRpcRequest, JSONRPC_VERSION};
use crate::error::RpcError;
use crate::objects::ObjectCodecTable;
use crate::scalar::decode_scalar;
use crate::value::NativeValue;

pub struct RequestDecoder {
    catalog: Arc<MethodCatalog>,
    objects: Arc<ObjectCodecTable>,
}

impl RequestDecoder {
    pub fn new(catalog: Arc<MethodCatalog>, objects: Arc<ObjectCodecTable>) -> Self {
        Self { catalog, objects }
    }

    pub fn decode_request(&self, raw: &str) -> Result<DecodedRequest, RpcError> {
        let envelope = read_envelope(raw).map_err(|e| {
            tracing::warn!(error = %e, "request envelope rejected");
            e
        })?;
        let id = id_text(envelope.id.as_ref()).map_err(|reason| {
            tracing::warn!(method = %envelope.method, %reason, "request id rejected");
            RpcError::invalid_request(reason)
        })?;

        let declared = self
            .catalog
            .request(&envelope.method)
            .map_err(|e| catalog_failure(&envelope.method, e))?;
        if declared.len() != envelope.params.len() {
            let err = RpcError::invalid_params(format!(
                "wrong number of arguments (expected {} but got {})",
                declared.len(),
                envelope.params.len()
            ));
            tracing::warn!(method = %envelope.method, error = %err, "request rejected");
            return Err(err);
        }

        let params = declared
            .iter()
            .zip(&envelope.params)
            .enumerate()
            .map(|(position, (param, raw))| self.decode_param(&envelope.method, position, param, raw))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(method = %envelope.method, params = params.len(), "decoded request");
        Ok(DecodedRequest {
            jsonrpc: envelope.jsonrpc,
            method: envelope.method,
            id,
            params,
        })
    }

    fn decode_param(
        &self,
        method: &str,
        position: usize,
        param: &TypedSchema,
        raw: &Value,
    ) -> Result<NativeValue, RpcError> {
        match self.catalog.validator().validate(param.schema(), raw) {
            Ok(()) => {}
            Err(SchemaValidationError::ValidationFailed { violations, .. }) => {
                tracing::warn!(method, position, %violations, "parameter failed schema validation");
                return Err(RpcError::invalid_params(format!(
                    "parameter {position} ({}) does not match its schema: {raw}",
                    param.ty().name()
                )));
            }
            Err(e) => {
                tracing::error!(method, position, error = %e, "parameter schema does not compile");
                return Err(RpcError::schema(e.to_string()));
            }
        }

        let decoded = match param.ty().root_kind() {
            RootKind::Object => self.objects.decode(param.ty(), raw).map(NativeValue::Object),
            _ => decode_scalar(raw, param.ty()),
        };
        decoded.map_err(|e| {
            if e.is_configuration() {
                tracing::error!(method, position, error = %e, "no usable object codec");
                RpcError::internal(e.to_string())
            } else {
                tracing::warn!(method, position, error = %e, "parameter failed to decode");
                RpcError::invalid_params(format!("parameter {position}: {e}: {raw}"))
            }
        })
    }
}

fn read_envelope(raw: &str) -> Result<JsonRpcRequest, RpcError> {
    let payload: Value = serde_json::from_str(raw).map_err(|e| RpcError::parse_error(e.to_string()))?;
    let envelope: JsonRpcRequest =
        serde_json::from_value(payload).map_err(|e| RpcError::invalid_request(e.to_string()))?;
    if envelope.jsonrpc != JSONRPC_VERSION {
        return Err(RpcError::invalid_request(format!(
            "unsupported jsonrpc version '{}'",
            envelope.jsonrpc
        )));
    }
    Ok(envelope)
}

/// Map a catalog failure to the error reported to the client.
pub(crate) fn catalog_failure(method: &str, error: CatalogError) -> RpcError {
    match error {
        CatalogError::MethodNotFound(_) => {
            tracing::warn!(method, "method not found");
            RpcError::method_not_found(method)
        }
        other => {
            tracing::error!(method, error = %other, "method schemas failed to resolve");
            RpcError::schema(other.to_string())
        }
    }
}

/// Best-effort id of a raw request, for reporting errors about it.
///
/// Returns `None` when the text is not JSON, has no id, or the id is
/// neither a string nor a number.
pub fn id_of_request(raw: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(raw).ok()?;
    id_text(payload.get("id")).ok().flatten()
}
