//! # Root Types
//!
//! The four terminal types, read from the `root.json` definition document.
//! [`root_document`] is the built-in copy of that document; directory
//! loaders read the one on disk, which must match it.

use serde_json::{json, Value};

use crate::error::SchemaError;
use crate::types::{NamedType, ResolvedType, RootKind};

/// File name under which the root definitions are referenced.
pub const ROOT_DOCUMENT_NAME: &str = "root.json";

/// The built-in root definition document.
pub fn root_document() -> Value {
    json!({
        "$comment": "Root types of the RPC type system. Every named type terminates at one of these.",
        "definitions": {
            "BOOLEAN": {
                "type": "boolean"
            },
            "DATA": {
                "description": "Opaque byte string, hex encoded with a 0x prefix.",
                "type": "string",
                "pattern": "^0x[0-9a-fA-F]*$"
            },
            "QUANTITY": {
                "description": "Unsigned integer of arbitrary precision, big-endian hex with a 0x prefix.",
                "type": "string",
                "pattern": "^0x[0-9a-fA-F]+$"
            },
            "OBJECT": {
                "type": "object"
            }
        }
    })
}

/// The four root types, each bound to its canonical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootTypes {
    boolean: NamedType,
    data: NamedType,
    quantity: NamedType,
    object: NamedType,
}

impl RootTypes {
    /// Read the root definitions out of a `root.json`-shaped document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Malformed`] if any of the four definitions
    /// is missing.
    pub fn from_document(document: &Value) -> Result<Self, SchemaError> {
        let root = |kind: RootKind| -> Result<NamedType, SchemaError> {
            let definition = document
                .get("definitions")
                .and_then(|defs| defs.get(kind.name()))
                .ok_or_else(|| {
                    SchemaError::Malformed(format!("{ROOT_DOCUMENT_NAME} does not define {}", kind.name()))
                })?;
            Ok(NamedType::new(kind.name(), ResolvedType::root(kind, definition.clone())))
        };
        Ok(Self {
            boolean: root(RootKind::Boolean)?,
            data: root(RootKind::Data)?,
            quantity: root(RootKind::Quantity)?,
            object: root(RootKind::Object)?,
        })
    }

    /// Root types built from [`root_document`].
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_document(&root_document())
    }

    pub fn get(&self, kind: RootKind) -> &NamedType {
        match kind {
            RootKind::Boolean => &self.boolean,
            RootKind::Data => &self.data,
            RootKind::Quantity => &self.quantity,
            RootKind::Object => &self.object,
        }
    }

    pub fn boolean(&self) -> &NamedType {
        &self.boolean
    }

    pub fn data(&self) -> &NamedType {
        &self.data
    }

    pub fn quantity(&self) -> &NamedType {
        &self.quantity
    }

    pub fn object(&self) -> &NamedType {
        &self.object
    }
}
