//! # Type Resolution
//!
//! Turns a schema node into a [`ResolvedType`] whose derivation chain ends
//! at one of the four roots. Only a restricted subset of JSON Schema is
//! admitted:
//!
//! - `{"type":"boolean"}` and `$ref`s to BOOLEAN, DATA or QUANTITY resolve
//!   directly to the root type.
//! - `{"type":"object","properties":{...}}` reached through a `$ref`
//!   becomes a named object type. Every property must be a `$ref` or a
//!   base shorthand and must not itself be OBJECT-rooted.
//! - `{"allOf":[base, constraint]}` derives from `base` and carries
//!   `constraint` as the extra restriction.
//!
//! Anything else is a [`SchemaError::Restriction`] (a construct the IDL
//! forbids) or a [`SchemaError::Malformed`] (no recognizable keyword).
//! Every type reached through a `$ref` is recorded in the shared
//! [`TypeRegistry`].

use std::sync::Arc;

use serde_json::Value;

use crate::error::SchemaError;
use crate::loader::TypeDefinitionLoader;
use crate::registry::TypeRegistry;
use crate::roots::RootTypes;
use crate::schema_ref::SchemaRef;
use crate::types::{Field, NamedType, ResolvedType, RootKind};

/// Reference chains deeper than this are treated as cycles.
const MAX_REFERENCE_DEPTH: usize = 32;

#[derive(Clone)]
pub struct TypeResolver {
    loader: Arc<dyn TypeDefinitionLoader>,
    roots: Arc<RootTypes>,
    registry: Arc<TypeRegistry>,
}

impl TypeResolver {
    /// A resolver with a fresh registry.
    pub fn new(loader: Arc<dyn TypeDefinitionLoader>, roots: Arc<RootTypes>) -> Self {
        Self {
            loader,
            roots,
            registry: Arc::new(TypeRegistry::new()),
        }
    }

    /// Share `registry` with other resolvers of the same schema set.
    pub fn with_registry(mut self, registry: Arc<TypeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn roots(&self) -> &RootTypes {
        &self.roots
    }

    /// Resolve any admissible schema node.
    pub fn resolve(&self, node: &Value) -> Result<ResolvedType, SchemaError> {
        self.resolve_node(node, None, 0)
    }

    /// Resolve a node that carries a name: a base shorthand or a `$ref`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Restriction`] for inline schemas.
    pub fn resolve_named(&self, node: &Value) -> Result<NamedType, SchemaError> {
        if let Some(root) = self.base_type(node)? {
            return Ok(root.clone());
        }
        match SchemaRef::from_node(node)? {
            Some(reference) => self.resolve_reference(&reference, 0),
            None => Err(SchemaError::Restriction(format!(
                "only a $ref or a base type can be used here, found {node}"
            ))),
        }
    }

    fn resolve_node(&self, node: &Value, name: Option<&str>, depth: usize) -> Result<ResolvedType, SchemaError> {
        if depth > MAX_REFERENCE_DEPTH {
            return Err(SchemaError::Malformed(format!(
                "reference chain exceeds {MAX_REFERENCE_DEPTH} levels; is it cyclic?"
            )));
        }
        let map = node
            .as_object()
            .ok_or_else(|| SchemaError::Malformed(format!("schema must be a JSON object, found {node}")))?;

        if let Some(root) = self.base_type(node)? {
            return Ok(root.ty().clone());
        }

        if let Some(ty) = map.get("type") {
            let ty = ty
                .as_str()
                .ok_or_else(|| SchemaError::Malformed(format!("'type' must be a string, found {ty}")))?;
            return match ty {
                "object" => match name {
                    Some(name) => self.resolve_object(name, node, depth),
                    None => Err(SchemaError::Restriction(
                        "object types must be named: declare them in a definition document and use $ref".to_string(),
                    )),
                },
                "array" => Err(SchemaError::Restriction("array types are not supported".to_string())),
                other => Err(SchemaError::Restriction(format!(
                    "type '{other}' is not supported; use BOOLEAN, DATA, QUANTITY or a named object"
                ))),
            };
        }

        if let Some(reference) = SchemaRef::from_node(node)? {
            return Ok(self.resolve_reference(&reference, depth)?.into_resolved());
        }

        if map.contains_key("allOf") {
            return self.resolve_all_of(node, depth);
        }

        Err(SchemaError::Malformed(format!(
            "expected 'type', '$ref' or 'allOf' in schema {node}"
        )))
    }

    /// Root type for `{"type":"boolean"}` and `$ref`s to non-object roots.
    fn base_type(&self, node: &Value) -> Result<Option<&NamedType>, SchemaError> {
        if node.get("type").and_then(Value::as_str) == Some("boolean") {
            return Ok(Some(self.roots.boolean()));
        }
        let Some(reference) = SchemaRef::from_node(node)? else {
            return Ok(None);
        };
        match RootKind::from_name(reference.type_name()) {
            Some(RootKind::Object) => Err(SchemaError::Restriction(format!(
                "'{reference}' cannot be referenced directly; declare a named object type"
            ))),
            Some(kind) => Ok(Some(self.roots.get(kind))),
            None => Ok(None),
        }
    }

    fn resolve_reference(&self, reference: &SchemaRef, depth: usize) -> Result<NamedType, SchemaError> {
        let definition = self.loader.load(reference)?;
        let resolved = self.resolve_node(&definition, Some(reference.type_name()), depth + 1)?;
        let named = NamedType::new(reference.type_name(), resolved);
        self.registry.put(&named)?;
        tracing::trace!(type_name = named.name(), root = %named.root_kind(), "resolved reference");
        Ok(named)
    }

    fn resolve_all_of(&self, node: &Value, depth: usize) -> Result<ResolvedType, SchemaError> {
        let entries = node["allOf"]
            .as_array()
            .ok_or_else(|| SchemaError::Malformed("'allOf' must be an array".to_string()))?;
        if entries.len() != 2 {
            return Err(SchemaError::Restriction(format!(
                "allOf must have exactly two elements, found {}",
                entries.len()
            )));
        }
        let is_base = |entry: &Value| entry.get("type").is_some() || entry.get("$ref").is_some();
        let (base, constraint) = match (is_base(&entries[0]), is_base(&entries[1])) {
            (true, false) => (&entries[0], &entries[1]),
            (false, true) => (&entries[1], &entries[0]),
            (true, true) => {
                return Err(SchemaError::Restriction(
                    "only one allOf element may declare 'type' or '$ref'".to_string(),
                ))
            }
            (false, false) => {
                return Err(SchemaError::Restriction(
                    "one allOf element must declare the base with 'type' or '$ref'".to_string(),
                ))
            }
        };
        if constraint.get("allOf").is_some() {
            return Err(SchemaError::Restriction("nested allOf is not supported".to_string()));
        }
        let base = self.resolve_node(base, None, depth + 1)?;
        Ok(ResolvedType::derived(node.clone(), base, constraint.clone()))
    }

    fn resolve_object(&self, name: &str, node: &Value, depth: usize) -> Result<ResolvedType, SchemaError> {
        let properties = node.get("properties").ok_or_else(|| {
            SchemaError::Restriction(format!("object type '{name}' must declare its properties"))
        })?;
        let properties = properties
            .as_object()
            .ok_or_else(|| SchemaError::Malformed(format!("'properties' of '{name}' must be an object")))?;

        let mut fields = Vec::with_capacity(properties.len());
        for (property, schema) in properties {
            let ty = self.resolve_field(name, property, schema, depth)?;
            fields.push(Field::new(property.as_str(), ty, schema.clone()));
        }
        Ok(ResolvedType::object(node.clone(), self.roots.object().ty().clone(), fields))
    }

    fn resolve_field(&self, owner: &str, property: &str, schema: &Value, depth: usize) -> Result<NamedType, SchemaError> {
        if let Some(root) = self.base_type(schema)? {
            return Ok(root.clone());
        }
        if schema.get("type").and_then(Value::as_str) == Some("object") {
            return Err(SchemaError::Restriction(format!(
                "property '{property}' of '{owner}' is an inline object; objects must be named"
            )));
        }
        let Some(reference) = SchemaRef::from_node(schema)? else {
            return Err(SchemaError::Restriction(format!(
                "property '{property}' of '{owner}' must be a $ref or a base type"
            )));
        };
        let named = self.resolve_reference(&reference, depth + 1)?;
        if named.root_kind() == RootKind::Object {
            return Err(SchemaError::Restriction(format!(
                "property '{property}' of '{owner}' is an object; nested objects are not supported"
            )));
        }
        Ok(named)
    }
}
