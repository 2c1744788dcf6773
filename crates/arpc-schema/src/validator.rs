//! # Schema Validation
//!
//! Validates wire values against method parameter and result schemas
//! (Draft 2020-12) using the `jsonschema` crate.
//!
//! ## Schema Resolution
//!
//! Method schemas reference type definitions with relative `$ref`s such as
//! `derived.json#/definitions/DATA32`. These resolve against the default
//! base URI to `json-schema:///derived.json`; the local retriever maps the
//! last path segment back to a document of the [`TypeDefinitionLoader`].
//! No reference is ever fetched over the network and an unknown document
//! fails the build of the validator.
//!
//! Compiled validators are cached per schema node, so each distinct
//! parameter or result schema is compiled once.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use jsonschema::{Retrieve, Uri, ValidationOptions, Validator};
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::loader::TypeDefinitionLoader;

/// Resolves `$ref` documents through a [`TypeDefinitionLoader`].
struct LocalSchemaRetriever {
    loader: Arc<dyn TypeDefinitionLoader>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        let document = self.loader.document(filename)?;
        Ok(document.as_ref().clone())
    }
}

/// Error during schema validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The value did not conform to the schema.
    #[error("validation failed against schema {schema}:\n{violations}")]
    ValidationFailed {
        /// Compact text of the schema node validated against.
        schema: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },

    /// The schema could not be compiled (invalid keyword, unresolvable `$ref`).
    #[error("validator build error for schema {schema}: {reason}")]
    ValidatorBuildError {
        /// Compact text of the schema node.
        schema: String,
        /// Reason the validator could not be built.
        reason: String,
    },
}

impl SchemaValidationError {
    pub fn violations(&self) -> Option<&ValidationViolations> {
        match self {
            Self::ValidationFailed { violations, .. } => Some(violations),
            Self::ValidatorBuildError { .. } => None,
        }
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer path to the violating value in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A schema validator backed by the `jsonschema` crate.
///
/// `Send + Sync`; compiled validators are shared across threads.
pub struct SchemaValidator {
    loader: Arc<dyn TypeDefinitionLoader>,
    /// Compiled validators keyed by the compact text of their schema node.
    compiled: RwLock<HashMap<String, Arc<Validator>>>,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("compiled", &self.compiled.read().len())
            .finish()
    }
}

impl SchemaValidator {
    pub fn new(loader: Arc<dyn TypeDefinitionLoader>) -> Self {
        Self {
            loader,
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// Number of distinct schemas compiled so far.
    pub fn compiled_count(&self) -> usize {
        self.compiled.read().len()
    }

    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(LocalSchemaRetriever {
            loader: Arc::clone(&self.loader),
        });
        opts
    }

    /// Compiled validator for `schema`, built on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::ValidatorBuildError`] if the schema
    /// does not compile or references a document the loader cannot serve.
    pub fn build_validator(&self, schema: &Value) -> Result<Arc<Validator>, SchemaValidationError> {
        let key = schema.to_string();
        if let Some(hit) = self.compiled.read().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let validator = self
            .build_options()
            .build(schema)
            .map_err(|e| SchemaValidationError::ValidatorBuildError {
                schema: key.clone(),
                reason: e.to_string(),
            })?;
        let mut compiled = self.compiled.write();
        Ok(Arc::clone(compiled.entry(key).or_insert_with(|| Arc::new(validator))))
    }

    /// Validate `instance` against `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::ValidationFailed`] with structured
    /// violation details if the value is invalid.
    pub fn validate(&self, schema: &Value, instance: &Value) -> Result<(), SchemaValidationError> {
        let validator = self.build_validator(schema)?;

        let errors: Vec<Violation> = validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema: schema.to_string(),
                violations: ValidationViolations { violations: errors },
            })
        }
    }

    /// Whether `instance` conforms to `schema`.
    ///
    /// # Errors
    ///
    /// Only when the schema itself cannot be compiled.
    pub fn is_valid(&self, schema: &Value, instance: &Value) -> Result<bool, SchemaValidationError> {
        Ok(self.build_validator(schema)?.is_valid(instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::InMemorySchemaLoader;
    use serde_json::json;

    fn validator() -> SchemaValidator {
        let loader = InMemorySchemaLoader::new().with_document(
            "derived.json",
            json!({"definitions": {"DATA32": {"allOf": [
                {"$ref": "root.json#/definitions/DATA"},
                {"minLength": 66, "maxLength": 66}
            ]}}}),
        );
        SchemaValidator::new(Arc::new(loader))
    }

    #[test]
    fn validates_against_root_refs() {
        let v = validator();
        let data = json!({"$ref": "root.json#/definitions/DATA"});
        assert!(v.is_valid(&data, &json!("0xfe00")).unwrap());
        assert!(v.is_valid(&data, &json!("0x")).unwrap());
        assert!(!v.is_valid(&data, &json!("fe00")).unwrap());
        assert!(!v.is_valid(&data, &json!(12)).unwrap());
    }

    #[test]
    fn resolves_refs_across_documents() {
        let v = validator();
        let data32 = json!({"$ref": "derived.json#/definitions/DATA32"});
        let hash = format!("0x{}", "ab".repeat(32));
        assert!(v.validate(&data32, &json!(hash)).is_ok());
        let err = v.validate(&data32, &json!("0x10")).unwrap_err();
        let violations = err.violations().unwrap();
        assert!(!violations.is_empty());
        assert!(err.to_string().contains("(root)"));
    }

    #[test]
    fn compiled_validators_are_cached() {
        let v = validator();
        let boolean = json!({"type": "boolean"});
        let first = v.build_validator(&boolean).unwrap();
        let second = v.build_validator(&boolean).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(v.compiled_count(), 1);
    }

    #[test]
    fn unknown_document_fails_to_build() {
        let v = validator();
        let err = v
            .build_validator(&json!({"$ref": "missing.json#/definitions/X"}))
            .unwrap_err();
        assert!(matches!(err, SchemaValidationError::ValidatorBuildError { .. }));
    }

    #[test]
    fn data_field_violation_names_its_member() {
        let v = validator();
        let schema = json!({
            "type": "object",
            "properties": {"headerHash": {"$ref": "derived.json#/definitions/DATA32"}}
        });
        let err = v.validate(&schema, &json!({"headerHash": "0x10"})).unwrap_err();
        let violations = err.violations().unwrap().violations();
        assert!(!violations.is_empty());
        assert!(violations.iter().all(|x| x.instance_path == "/headerHash"));
        assert!(violations[0].to_string().starts_with("  /headerHash: "));
    }

    #[test]
    fn empty_quantity_is_reported_at_the_root() {
        let v = validator();
        let quantity = json!({"$ref": "root.json#/definitions/QUANTITY"});
        let err = v.validate(&quantity, &json!("0x")).unwrap_err();
        let first = &err.violations().unwrap().violations()[0];
        assert!(first.instance_path.is_empty());
        assert!(first.to_string().starts_with("  (root): "), "{first}");
    }
}
