//! # Native Values
//!
//! Decoded parameters and results to encode. The variant always matches
//! the root of the declared type: BOOLEAN is `bool`, DATA is a byte
//! buffer, QUANTITY is a [`Quantity`] and OBJECT is an [`ObjectValue`]
//! holding whatever host type the object codec produced.

use std::any::Any;
use std::fmt;

use arpc_schema::RootKind;

use crate::hex::encode_hex;
use crate::quantity::Quantity;

#[derive(Debug)]
pub enum NativeValue {
    Boolean(bool),
    Data(Vec<u8>),
    Quantity(Quantity),
    Object(ObjectValue),
}

impl NativeValue {
    pub fn kind(&self) -> RootKind {
        match self {
            Self::Boolean(_) => RootKind::Boolean,
            Self::Data(_) => RootKind::Data,
            Self::Quantity(_) => RootKind::Quantity,
            Self::Object(_) => RootKind::Object,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            Self::Data(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            Self::Quantity(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Data(bytes) => f.write_str(&encode_hex(bytes)),
            Self::Quantity(q) => write!(f, "{q}"),
            Self::Object(o) => write!(f, "{}{{..}}", o.type_name()),
        }
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Vec<u8>> for NativeValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Data(value)
    }
}

impl From<Quantity> for NativeValue {
    fn from(value: Quantity) -> Self {
        Self::Quantity(value)
    }
}

impl From<ObjectValue> for NativeValue {
    fn from(value: ObjectValue) -> Self {
        Self::Object(value)
    }
}

/// An object decoded into a host type, tagged with its schema type name.
pub struct ObjectValue {
    type_name: String,
    inner: Box<dyn Any + Send + Sync>,
    host_type: &'static str,
}

impl ObjectValue {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            inner: Box::new(value),
            host_type: std::any::type_name::<T>(),
        }
    }

    pub(crate) fn from_boxed(type_name: &str, inner: Box<dyn Any + Send + Sync>, host_type: &'static str) -> Self {
        Self {
            type_name: type_name.to_string(),
            inner,
            host_type,
        }
    }

    /// Schema type name, e.g. `BlockTemplate`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Rust type name of the held value.
    pub fn host_type(&self) -> &'static str {
        self.host_type
    }

    pub(crate) fn inner(&self) -> &(dyn Any + Send + Sync) {
        self.inner.as_ref()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Take the host value out, or get `self` back if `T` is the wrong type.
    pub fn into_inner<T: Any>(self) -> Result<T, Self> {
        let Self {
            type_name,
            inner,
            host_type,
        } = self;
        match inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self {
                type_name,
                inner,
                host_type,
            }),
        }
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectValue")
            .field("type_name", &self.type_name)
            .field("host_type", &self.host_type)
            .finish()
    }
}

/// Schema-driven object representation: scalar field values by name, in
/// field declaration order. Used when no dedicated host type is registered.
#[derive(Debug, Default)]
pub struct Record {
    fields: Vec<(String, NativeValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append or replace a field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<NativeValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<NativeValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&NativeValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NativeValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Seal(u8);

    #[test]
    fn variant_matches_root_kind() {
        assert_eq!(NativeValue::from(true).kind(), RootKind::Boolean);
        assert_eq!(NativeValue::from(vec![1u8]).kind(), RootKind::Data);
        assert_eq!(NativeValue::from(Quantity::from(3u64)).kind(), RootKind::Quantity);
        assert_eq!(NativeValue::from(ObjectValue::new("Seal", Seal(1))).kind(), RootKind::Object);
    }

    #[test]
    fn accessors_reject_other_variants() {
        let v = NativeValue::Data(vec![0xee]);
        assert_eq!(v.as_data(), Some(&[0xee][..]));
        assert_eq!(v.as_bool(), None);
        assert!(v.as_quantity().is_none());
        assert_eq!(v.to_string(), "0xee");
    }

    #[test]
    fn object_value_downcasts() {
        let obj = ObjectValue::new("Seal", Seal(7));
        assert_eq!(obj.type_name(), "Seal");
        assert!(obj.is::<Seal>());
        assert_eq!(obj.downcast_ref::<Seal>(), Some(&Seal(7)));
        assert!(obj.downcast_ref::<String>().is_none());
        let obj = obj.into_inner::<String>().unwrap_err();
        assert_eq!(obj.into_inner::<Seal>().unwrap(), Seal(7));
    }

    #[test]
    fn record_keeps_insertion_order_and_replaces() {
        let record = Record::new()
            .with("b", true)
            .with("a", vec![1u8])
            .with("b", false);
        let names: Vec<&str> = record.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(record.get("b").and_then(NativeValue::as_bool), Some(false));
        assert_eq!(record.len(), 2);
    }
}
