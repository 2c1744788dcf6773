//! # Error Usages
//!
//! A method's error schema lists the domain errors it may raise. The node
//! is either a single `$ref` to an error definition or an `anyOf` of such
//! refs. An error definition fixes its code and message as constants:
//!
//! ```json
//! {"type":"object","properties":{"code":{"const":10001},"message":{"const":"Unauthorized"}}}
//! ```
//!
//! A `description` next to the `$ref` is the reason this method raises it.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaError;
use crate::loader::TypeDefinitionLoader;
use crate::schema_ref::SchemaRef;

/// A domain error definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDescriptor {
    name: String,
    code: i64,
    message: String,
}

impl ErrorDescriptor {
    pub fn new(name: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code,
            message: message.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One declared use of an error by a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorUsage {
    descriptor: ErrorDescriptor,
    reason: Option<String>,
}

impl ErrorUsage {
    pub fn new(descriptor: ErrorDescriptor, reason: Option<String>) -> Self {
        Self { descriptor, reason }
    }

    pub fn descriptor(&self) -> &ErrorDescriptor {
        &self.descriptor
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

#[derive(Clone)]
pub struct ErrorResolver {
    loader: Arc<dyn TypeDefinitionLoader>,
}

impl ErrorResolver {
    pub fn new(loader: Arc<dyn TypeDefinitionLoader>) -> Self {
        Self { loader }
    }

    /// Resolve a method's error schema into its usages, in declaration order.
    ///
    /// An absent, `null` or empty node declares no errors.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Restriction`] for nested `anyOf` or anything other
    /// than refs; [`SchemaError::Malformed`] for broken refs or error
    /// definitions without constant `code`/`message`.
    pub fn resolve(&self, node: Option<&Value>) -> Result<Vec<ErrorUsage>, SchemaError> {
        let node = match node {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(map)) if map.is_empty() => return Ok(Vec::new()),
            Some(node) => node,
        };

        if let Some(any_of) = node.get("anyOf") {
            let entries = any_of
                .as_array()
                .ok_or_else(|| SchemaError::Malformed("'anyOf' must be an array".to_string()))?;
            return entries
                .iter()
                .map(|entry| {
                    if entry.get("anyOf").is_some() {
                        return Err(SchemaError::Restriction("nested anyOf is not supported".to_string()));
                    }
                    self.usage(entry)
                })
                .collect();
        }

        Ok(vec![self.usage(node)?])
    }

    /// Load the error definition a reference points at.
    pub fn descriptor(&self, reference: &SchemaRef) -> Result<ErrorDescriptor, SchemaError> {
        let definition = self.loader.load(reference)?;
        let constant = |property: &str| {
            definition
                .get("properties")
                .and_then(|p| p.get(property))
                .and_then(|p| p.get("const"))
                .ok_or_else(|| {
                    SchemaError::Malformed(format!("error '{reference}' has no constant '{property}'"))
                })
        };
        let code = constant("code")?
            .as_i64()
            .ok_or_else(|| SchemaError::Malformed(format!("error '{reference}' code must be an integer")))?;
        let message = constant("message")?
            .as_str()
            .ok_or_else(|| SchemaError::Malformed(format!("error '{reference}' message must be a string")))?;
        Ok(ErrorDescriptor::new(reference.type_name(), code, message))
    }

    fn usage(&self, node: &Value) -> Result<ErrorUsage, SchemaError> {
        let reference = SchemaRef::from_node(node)?.ok_or_else(|| {
            SchemaError::Restriction(format!("error usages must be $refs to error definitions, found {node}"))
        })?;
        let reason = node.get("description").and_then(Value::as_str).map(str::to_string);
        Ok(ErrorUsage::new(self.descriptor(&reference)?, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::InMemorySchemaLoader;
    use serde_json::json;

    fn resolver() -> ErrorResolver {
        let error = |code: i64, message: &str| {
            json!({"type": "object", "properties": {"code": {"const": code}, "message": {"const": message}}})
        };
        let loader = InMemorySchemaLoader::new().with_document(
            "errors.json",
            json!({"definitions": {
                "Unauthorized": error(10001, "Unauthorized"),
                "NotFound": error(10002, "Not found"),
                "NoCode": {"type": "object", "properties": {"message": {"const": "x"}}}
            }}),
        );
        ErrorResolver::new(Arc::new(loader))
    }

    #[test]
    fn empty_nodes_declare_no_errors() {
        let r = resolver();
        assert!(r.resolve(None).unwrap().is_empty());
        assert!(r.resolve(Some(&Value::Null)).unwrap().is_empty());
        assert!(r.resolve(Some(&json!({}))).unwrap().is_empty());
    }

    #[test]
    fn single_ref_with_reason() {
        let r = resolver();
        let usages = r
            .resolve(Some(&json!({
                "$ref": "errors.json#/definitions/Unauthorized",
                "description": "key not allowed"
            })))
            .unwrap();
        assert_eq!(
            usages,
            vec![ErrorUsage::new(
                ErrorDescriptor::new("Unauthorized", 10001, "Unauthorized"),
                Some("key not allowed".to_string())
            )]
        );
    }

    #[test]
    fn any_of_keeps_order() {
        let r = resolver();
        let usages = r
            .resolve(Some(&json!({"anyOf": [
                {"$ref": "errors.json#/definitions/NotFound"},
                {"$ref": "errors.json#/definitions/Unauthorized"}
            ]})))
            .unwrap();
        let codes: Vec<i64> = usages.iter().map(|u| u.descriptor().code()).collect();
        assert_eq!(codes, vec![10002, 10001]);
        assert_eq!(usages[0].reason(), None);
    }

    #[test]
    fn nested_any_of_is_a_restriction() {
        let r = resolver();
        let err = r
            .resolve(Some(&json!({"anyOf": [{"anyOf": [{"$ref": "errors.json#/definitions/NotFound"}]}]})))
            .unwrap_err();
        assert!(err.is_restriction());
    }

    #[test]
    fn definitions_need_constant_code() {
        let r = resolver();
        let err = r
            .resolve(Some(&json!({"$ref": "errors.json#/definitions/NoCode"})))
            .unwrap_err();
        assert!(err.is_malformed());
    }
}
