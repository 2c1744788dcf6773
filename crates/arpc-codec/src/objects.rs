//! # Object Codecs
//!
//! OBJECT-rooted types decode into host types chosen by the embedding
//! application. An [`ObjectCodec`] converts between the wire object and
//! one host type; an [`ObjectCodecTable`] maps schema type names to
//! codecs, with an optional fallback for names not registered.
//!
//! Two ready-made codecs cover most uses: [`ObjectCodec::serde`] for any
//! `Serialize + DeserializeOwned` host type, and [`ObjectCodec::record`]
//! which decodes into a schema-driven [`Record`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arpc_schema::{Field, NamedType};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CodecError;
use crate::scalar::{decode_scalar, encode_scalar};
use crate::value::{ObjectValue, Record};

type DecodeFn = dyn Fn(&Value, &[Field]) -> Result<Box<dyn Any + Send + Sync>, CodecError> + Send + Sync;
type EncodeFn = dyn Fn(&(dyn Any + Send + Sync), &[Field]) -> Result<Value, CodecError> + Send + Sync;

/// Converts one object type between wire and host form.
#[derive(Clone)]
pub struct ObjectCodec {
    decode: Arc<DecodeFn>,
    encode: Arc<EncodeFn>,
    host_type: &'static str,
}

impl ObjectCodec {
    /// Codec from a pair of functions over host type `T`.
    ///
    /// Both functions receive the object type's fields in declaration order.
    pub fn new<T, D, E>(decode: D, encode: E) -> Self
    where
        T: Any + Send + Sync,
        D: Fn(&Value, &[Field]) -> Result<T, CodecError> + Send + Sync + 'static,
        E: Fn(&T, &[Field]) -> Result<Value, CodecError> + Send + Sync + 'static,
    {
        let host_type = std::any::type_name::<T>();
        Self {
            decode: Arc::new(move |raw: &Value, fields: &[Field]| {
                decode(raw, fields).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
            }),
            encode: Arc::new(move |any: &(dyn Any + Send + Sync), fields: &[Field]| {
                let value = any.downcast_ref::<T>().ok_or(CodecError::HostType {
                    type_name: String::new(),
                    expected: host_type,
                    found: "another type",
                })?;
                encode(value, fields)
            }),
            host_type,
        }
    }

    /// Codec for a host type with serde support.
    pub fn serde<T>() -> Self
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        Self::new::<T, _, _>(
            |raw, _| {
                serde_json::from_value::<T>(raw.clone()).map_err(|e| CodecError::Object {
                    type_name: std::any::type_name::<T>().to_string(),
                    reason: e.to_string(),
                })
            },
            |value, _| {
                serde_json::to_value(value).map_err(|e| CodecError::Object {
                    type_name: std::any::type_name::<T>().to_string(),
                    reason: e.to_string(),
                })
            },
        )
    }

    /// Codec that decodes into a [`Record`] following the declared fields.
    ///
    /// Absent fields are left out of the record; members not declared as
    /// fields are ignored (schema validation rejects them when the type
    /// sets `additionalProperties: false`).
    pub fn record() -> Self {
        Self::new::<Record, _, _>(
            |raw, fields| {
                let mut record = Record::new();
                for field in fields {
                    if let Some(value) = raw.get(field.name()) {
                        record.insert(field.name(), decode_scalar(value, field.ty())?);
                    }
                }
                Ok(record)
            },
            |record, fields| {
                let mut map = Map::new();
                for field in fields {
                    if let Some(value) = record.get(field.name()) {
                        map.insert(field.name().to_string(), encode_scalar(value, field.ty())?);
                    }
                }
                if let Some((extra, _)) = record.iter().find(|(name, _)| !fields.iter().any(|f| f.name() == *name)) {
                    return Err(CodecError::Object {
                        type_name: "Record".to_string(),
                        reason: format!("'{extra}' is not a declared field"),
                    });
                }
                Ok(Value::Object(map))
            },
        )
    }

    pub fn host_type(&self) -> &'static str {
        self.host_type
    }
}

impl fmt::Debug for ObjectCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectCodec").field("host_type", &self.host_type).finish()
    }
}

/// Object codecs by schema type name.
#[derive(Clone, Default, Debug)]
pub struct ObjectCodecTable {
    codecs: HashMap<String, ObjectCodec>,
    fallback: Option<ObjectCodec>,
}

impl ObjectCodecTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table that decodes every object type into a [`Record`].
    pub fn records() -> Self {
        Self::new().with_fallback(ObjectCodec::record())
    }

    pub fn with(mut self, type_name: impl Into<String>, codec: ObjectCodec) -> Self {
        self.register(type_name, codec);
        self
    }

    pub fn register(&mut self, type_name: impl Into<String>, codec: ObjectCodec) {
        self.codecs.insert(type_name.into(), codec);
    }

    /// Codec used for object types without a registered codec.
    pub fn with_fallback(mut self, codec: ObjectCodec) -> Self {
        self.fallback = Some(codec);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&ObjectCodec> {
        self.codecs.get(type_name).or(self.fallback.as_ref())
    }

    /// Decode a wire object of type `ty`.
    pub fn decode(&self, ty: &NamedType, raw: &Value) -> Result<ObjectValue, CodecError> {
        let codec = self
            .get(ty.name())
            .ok_or_else(|| CodecError::UnknownObjectType(ty.name().to_string()))?;
        let inner = (codec.decode)(raw, ty.fields())?;
        Ok(ObjectValue::from_boxed(ty.name(), inner, codec.host_type))
    }

    /// Encode an object value as type `ty`.
    pub fn encode(&self, ty: &NamedType, value: &ObjectValue) -> Result<Value, CodecError> {
        let codec = self
            .get(ty.name())
            .ok_or_else(|| CodecError::UnknownObjectType(ty.name().to_string()))?;
        (codec.encode)(value.inner(), ty.fields()).map_err(|e| match e {
            CodecError::HostType { expected, .. } => CodecError::HostType {
                type_name: ty.name().to_string(),
                expected,
                found: value.host_type(),
            },
            other => other,
        })
    }
}
