//! Wire conversions for the scalar roots (BOOLEAN, DATA, QUANTITY).

use arpc_schema::{LengthConstraint, NamedType, RootKind};
use serde_json::Value;

use crate::error::CodecError;
use crate::hex::{decode_hex, encode_hex};
use crate::quantity::Quantity;
use crate::value::NativeValue;

fn wire_kind(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

fn hex_text<'a>(raw: &'a Value, expected: &'static str) -> Result<&'a str, CodecError> {
    raw.as_str().ok_or_else(|| CodecError::WireShape {
        expected,
        found: wire_kind(raw),
    })
}

/// Decode a wire value of a scalar-rooted type.
///
/// DATA length constraints are checked here; schema validation normally
/// rejects such values first.
pub fn decode_scalar(raw: &Value, ty: &NamedType) -> Result<NativeValue, CodecError> {
    match ty.root_kind() {
        RootKind::Boolean => raw.as_bool().map(NativeValue::Boolean).ok_or_else(|| CodecError::WireShape {
            expected: "boolean",
            found: wire_kind(raw),
        }),
        RootKind::Data => {
            let bytes = decode_hex(hex_text(raw, "hex string")?)?;
            check_length(ty, bytes.len())?;
            Ok(NativeValue::Data(bytes))
        }
        RootKind::Quantity => Ok(NativeValue::Quantity(Quantity::from_hex(hex_text(raw, "hex string")?)?)),
        RootKind::Object => Err(CodecError::Object {
            type_name: ty.name().to_string(),
            reason: "objects decode through the object codec table".to_string(),
        }),
    }
}

/// Encode a native value as a scalar-rooted type.
pub fn encode_scalar(value: &NativeValue, ty: &NamedType) -> Result<Value, CodecError> {
    match (ty.root_kind(), value) {
        (RootKind::Boolean, NativeValue::Boolean(b)) => Ok(Value::Bool(*b)),
        (RootKind::Data, NativeValue::Data(bytes)) => {
            check_length(ty, bytes.len())?;
            Ok(Value::String(encode_hex(bytes)))
        }
        (RootKind::Quantity, NativeValue::Quantity(q)) => Ok(Value::String(q.to_hex())),
        (declared, value) => Err(CodecError::Kind {
            declared,
            found: value.kind(),
        }),
    }
}

fn check_length(ty: &NamedType, actual: usize) -> Result<(), CodecError> {
    match ty.length_constraint() {
        LengthConstraint::Exact(expected) if expected != actual => Err(CodecError::Length { expected, actual }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arpc_schema::{InMemorySchemaLoader, RootTypes, TypeResolver};
    use serde_json::json;
    use std::sync::Arc;

    fn roots() -> RootTypes {
        RootTypes::builtin().unwrap()
    }

    fn data32() -> NamedType {
        let loader = InMemorySchemaLoader::new().with_document(
            "derived.json",
            json!({"definitions": {"DATA32": {"allOf": [
                {"$ref": "root.json#/definitions/DATA"},
                {"minLength": 66, "maxLength": 66}
            ]}}}),
        );
        TypeResolver::new(Arc::new(loader), Arc::new(roots()))
            .resolve_named(&json!({"$ref": "derived.json#/definitions/DATA32"}))
            .unwrap()
    }

    #[test]
    fn decodes_each_scalar_root() {
        let roots = roots();
        assert_eq!(decode_scalar(&json!(true), roots.boolean()).unwrap().as_bool(), Some(true));
        assert_eq!(
            decode_scalar(&json!("0xfe00f212f0"), roots.data()).unwrap().as_data(),
            Some(&[0xfe, 0x00, 0xf2, 0x12, 0xf0][..])
        );
        assert_eq!(
            decode_scalar(&json!("0x0100"), roots.quantity()).unwrap().as_quantity(),
            Some(&Quantity::from(256u64))
        );
    }

    #[test]
    fn wrong_wire_shape_is_reported() {
        let roots = roots();
        let err = decode_scalar(&json!("true"), roots.boolean()).unwrap_err();
        assert_eq!(err, CodecError::WireShape { expected: "boolean", found: "string".into() });
        assert!(decode_scalar(&json!(5), roots.data()).is_err());
    }

    #[test]
    fn data_length_is_enforced_both_ways() {
        let ty = data32();
        assert_eq!(
            decode_scalar(&json!("0x10"), &ty).unwrap_err(),
            CodecError::Length { expected: 32, actual: 1 }
        );
        let ok = encode_scalar(&NativeValue::Data(vec![0xab; 32]), &ty).unwrap();
        assert_eq!(ok, json!(format!("0x{}", "ab".repeat(32))));
        assert!(encode_scalar(&NativeValue::Data(vec![0xab; 31]), &ty).is_err());
    }

    #[test]
    fn encode_rejects_kind_mismatch() {
        let roots = roots();
        let err = encode_scalar(&NativeValue::Boolean(true), roots.data()).unwrap_err();
        assert_eq!(err, CodecError::Kind { declared: RootKind::Data, found: RootKind::Boolean });
        assert_eq!(encode_scalar(&Quantity::zero().into(), roots.quantity()).unwrap(), json!("0x00"));
    }
}
