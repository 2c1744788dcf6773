//! # Method Catalog
//!
//! Resolved signatures per method: parameter types from the request
//! schema's `items`, the result type, and the declared error usages. Each
//! part is resolved on first use and cached; [`MethodCatalog::warm_up`]
//! resolves everything up front so that broken schemas surface at startup
//! instead of on the first request.

use std::collections::HashMap;
use std::sync::Arc;

use arpc_schema::{
    ErrorResolver, ErrorUsage, MethodSchemaLoader, NamedType, SchemaError, SchemaValidationError, SchemaValidator,
    TypeResolver,
};
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

/// A schema node together with the type it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedSchema {
    schema: Value,
    ty: NamedType,
}

impl TypedSchema {
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn ty(&self) -> &NamedType {
        &self.ty
    }
}

/// Everything known about one method.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    pub name: String,
    pub params: Arc<[TypedSchema]>,
    pub result: Arc<TypedSchema>,
    pub errors: Arc<[ErrorUsage]>,
}

/// Outcome of [`MethodCatalog::warm_up`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmupReport {
    pub methods: Vec<String>,
    pub named_types: usize,
    pub validators: usize,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("method '{method}': {source}")]
    Schema {
        method: String,
        #[source]
        source: SchemaError,
    },

    #[error("method '{method}': {source}")]
    Validator {
        method: String,
        #[source]
        source: SchemaValidationError,
    },
}

pub struct MethodCatalog {
    methods: Arc<dyn MethodSchemaLoader>,
    resolver: TypeResolver,
    errors: ErrorResolver,
    validator: Arc<SchemaValidator>,
    requests: RwLock<HashMap<String, Arc<[TypedSchema]>>>,
    responses: RwLock<HashMap<String, Arc<TypedSchema>>>,
    error_usages: RwLock<HashMap<String, Arc<[ErrorUsage]>>>,
}

impl std::fmt::Debug for MethodCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodCatalog")
            .field("requests", &self.requests.read().len())
            .field("responses", &self.responses.read().len())
            .field("named_types", &self.resolver.registry().len())
            .finish()
    }
}

impl MethodCatalog {
    pub fn new(
        methods: Arc<dyn MethodSchemaLoader>,
        resolver: TypeResolver,
        errors: ErrorResolver,
        validator: Arc<SchemaValidator>,
    ) -> Self {
        Self {
            methods,
            resolver,
            errors,
            validator,
            requests: RwLock::new(HashMap::new()),
            responses: RwLock::new(HashMap::new()),
            error_usages: RwLock::new(HashMap::new()),
        }
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub fn validator(&self) -> &Arc<SchemaValidator> {
        &self.validator
    }

    /// Declared parameters of `method`, in order.
    pub fn request(&self, method: &str) -> Result<Arc<[TypedSchema]>, CatalogError> {
        if let Some(hit) = self.requests.read().get(method) {
            return Ok(Arc::clone(hit));
        }
        let schema = self
            .methods
            .request(method)
            .map_err(|source| schema_error(method, source))?
            .ok_or_else(|| CatalogError::MethodNotFound(method.to_string()))?;
        let items = schema.get("items").and_then(Value::as_array).ok_or_else(|| {
            schema_error(
                method,
                SchemaError::Malformed("request schema must declare an 'items' array".to_string()),
            )
        })?;
        let params = items
            .iter()
            .map(|item| self.typed(method, item))
            .collect::<Result<Vec<_>, _>>()?;
        let params: Arc<[TypedSchema]> = params.into();
        let mut cache = self.requests.write();
        Ok(Arc::clone(cache.entry(method.to_string()).or_insert(params)))
    }

    /// Declared result of `method`.
    pub fn response(&self, method: &str) -> Result<Arc<TypedSchema>, CatalogError> {
        if let Some(hit) = self.responses.read().get(method) {
            return Ok(Arc::clone(hit));
        }
        let schema = self
            .methods
            .response(method)
            .map_err(|source| schema_error(method, source))?
            .ok_or_else(|| CatalogError::MethodNotFound(method.to_string()))?;
        let result = Arc::new(self.typed(method, &schema)?);
        let mut cache = self.responses.write();
        Ok(Arc::clone(cache.entry(method.to_string()).or_insert(result)))
    }

    /// Declared error usages of `method`; empty when it declares none.
    pub fn errors(&self, method: &str) -> Result<Arc<[ErrorUsage]>, CatalogError> {
        if let Some(hit) = self.error_usages.read().get(method) {
            return Ok(Arc::clone(hit));
        }
        let node = self.methods.error(method).map_err(|source| schema_error(method, source))?;
        let usages: Arc<[ErrorUsage]> = self
            .errors
            .resolve(node.as_ref())
            .map_err(|source| schema_error(method, source))?
            .into();
        let mut cache = self.error_usages.write();
        Ok(Arc::clone(cache.entry(method.to_string()).or_insert(usages)))
    }

    pub fn signature(&self, method: &str) -> Result<MethodSignature, CatalogError> {
        Ok(MethodSignature {
            name: method.to_string(),
            params: self.request(method)?,
            result: self.response(method)?,
            errors: self.errors(method)?,
        })
    }

    /// Method names the schema set serves.
    pub fn method_names(&self) -> Result<Vec<String>, SchemaError> {
        self.methods.methods()
    }

    /// Resolve every method's signature and compile its validators.
    ///
    /// Stops at the first method that fails to resolve.
    pub fn warm_up(&self) -> Result<WarmupReport, CatalogError> {
        let methods = self.methods.methods().map_err(|source| schema_error("*", source))?;
        for method in &methods {
            let signature = self.signature(method)?;
            for schema in signature.params.iter().chain(std::iter::once(signature.result.as_ref())) {
                self.validator
                    .build_validator(schema.schema())
                    .map_err(|source| CatalogError::Validator {
                        method: method.clone(),
                        source,
                    })?;
            }
            tracing::debug!(method = %method, params = signature.params.len(), errors = signature.errors.len(), "method ready");
        }
        let report = WarmupReport {
            named_types: self.resolver.registry().len(),
            validators: self.validator.compiled_count(),
            methods,
        };
        tracing::info!(
            methods = report.methods.len(),
            named_types = report.named_types,
            validators = report.validators,
            "method catalog warmed up"
        );
        Ok(report)
    }

    fn typed(&self, method: &str, schema: &Value) -> Result<TypedSchema, CatalogError> {
        let ty = self
            .resolver
            .resolve_named(schema)
            .map_err(|source| schema_error(method, source))?;
        Ok(TypedSchema {
            schema: schema.clone(),
            ty,
        })
    }
}

fn schema_error(method: &str, source: SchemaError) -> CatalogError {
    CatalogError::Schema {
        method: method.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arpc_schema::{InMemorySchemaLoader, RootKind, RootTypes, TypeDefinitionLoader};
    use serde_json::json;

    fn catalog(loader: InMemorySchemaLoader) -> MethodCatalog {
        let loader = Arc::new(loader);
        let types: Arc<dyn TypeDefinitionLoader> = loader.clone();
        let resolver = TypeResolver::new(types.clone(), Arc::new(RootTypes::builtin().unwrap()));
        MethodCatalog::new(
            loader,
            resolver,
            ErrorResolver::new(types.clone()),
            Arc::new(SchemaValidator::new(types)),
        )
    }

    fn errors_document() -> Value {
        json!({"definitions": {"Unauthorized": {"type": "object", "properties": {
            "code": {"const": 10001}, "message": {"const": "Unauthorized"}
        }}}})
    }

    #[test]
    fn resolves_and_caches_signatures() {
        let c = catalog(
            InMemorySchemaLoader::new()
                .with_document("errors.json", errors_document())
                .with_method(
                    "submitseed",
                    vec![
                        json!({"$ref": "root.json#/definitions/DATA"}),
                        json!({"$ref": "root.json#/definitions/QUANTITY"}),
                    ],
                    json!({"type": "boolean"}),
                )
                .with_method_errors("submitseed", json!({"$ref": "errors.json#/definitions/Unauthorized"})),
        );
        let signature = c.signature("submitseed").unwrap();
        let kinds: Vec<RootKind> = signature.params.iter().map(|p| p.ty().root_kind()).collect();
        assert_eq!(kinds, vec![RootKind::Data, RootKind::Quantity]);
        assert_eq!(signature.result.ty().root_kind(), RootKind::Boolean);
        assert_eq!(signature.errors[0].descriptor().code(), 10001);

        let again = c.request("submitseed").unwrap();
        assert!(Arc::ptr_eq(&signature.params, &again));
    }

    #[test]
    fn unknown_method_is_not_found() {
        let c = catalog(InMemorySchemaLoader::new());
        assert!(matches!(c.request("nope"), Err(CatalogError::MethodNotFound(m)) if m == "nope"));
        assert!(matches!(c.response("nope"), Err(CatalogError::MethodNotFound(_))));
        assert!(c.errors("nope").unwrap().is_empty());
    }

    #[test]
    fn inline_parameter_schema_is_a_schema_error() {
        let c = catalog(InMemorySchemaLoader::new().with_method(
            "bad",
            vec![json!({"type": "array"})],
            json!({"type": "boolean"}),
        ));
        match c.request("bad") {
            Err(CatalogError::Schema { method, source }) => {
                assert_eq!(method, "bad");
                assert!(source.is_restriction());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn warm_up_reports_counts() {
        let c = catalog(
            InMemorySchemaLoader::new()
                .with_method("a", vec![json!({"type": "boolean"})], json!({"type": "boolean"}))
                .with_method("b", vec![], json!({"$ref": "root.json#/definitions/DATA"})),
        );
        let report = c.warm_up().unwrap();
        assert_eq!(report.methods, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(report.named_types, 0);
        assert_eq!(report.validators, 2);
    }
}
