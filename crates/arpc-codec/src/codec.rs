//! # Codec
//!
//! Single entry point wiring a schema set to a decoder and an encoder.
//! All parts share one [`TypeRegistry`](arpc_schema::TypeRegistry), one
//! validator cache and one method catalog.

use std::path::Path;
use std::sync::Arc;

use arpc_schema::{
    DirectorySchemaLoader, ErrorResolver, MethodSchemaLoader, RootTypes, SchemaError, SchemaValidator,
    TypeDefinitionLoader, TypeResolver, ROOT_DOCUMENT_NAME,
};

use crate::catalog::{CatalogError, MethodCatalog, MethodSignature, WarmupReport};
use crate::decoder::RequestDecoder;
use crate::encoder::ResponseEncoder;
use crate::envelope::DecodedRequest;
use crate::error::RpcError;
use crate::objects::ObjectCodecTable;
use crate::value::NativeValue;

pub struct Codec {
    catalog: Arc<MethodCatalog>,
    decoder: RequestDecoder,
    encoder: ResponseEncoder,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").field("catalog", &self.catalog).finish()
    }
}

impl Codec {
    /// Builder over one loader serving both type definitions and methods.
    pub fn builder<L>(loader: Arc<L>) -> CodecBuilder
    where
        L: TypeDefinitionLoader + MethodSchemaLoader + 'static,
    {
        let types: Arc<dyn TypeDefinitionLoader> = loader.clone();
        CodecBuilder::new(types, loader)
    }

    /// Codec over a schema directory, with root types read from its
    /// `type/root.json`.
    pub fn from_schema_dir(dir: impl AsRef<Path>, objects: ObjectCodecTable) -> Result<Self, SchemaError> {
        let loader = Arc::new(DirectorySchemaLoader::new(dir)?);
        let roots = RootTypes::from_document(&*loader.document(ROOT_DOCUMENT_NAME)?)?;
        Self::builder(loader).roots(roots).objects(objects).build()
    }

    pub fn catalog(&self) -> &MethodCatalog {
        &self.catalog
    }

    pub fn signature(&self, method: &str) -> Result<MethodSignature, CatalogError> {
        self.catalog.signature(method)
    }

    pub fn warm_up(&self) -> Result<WarmupReport, CatalogError> {
        self.catalog.warm_up()
    }

    pub fn decode_request(&self, raw: &str) -> Result<DecodedRequest, RpcError> {
        self.decoder.decode_request(raw)
    }

    pub fn encode_response(&self, id: Option<&str>, result: &NativeValue, method: &str) -> Result<String, RpcError> {
        self.encoder.encode_response(id, result, method)
    }

    pub fn encode_error(&self, id: Option<&str>, error: &RpcError) -> String {
        self.encoder.encode_error(id, error)
    }

    /// The domain error `name` as declared by `method`.
    ///
    /// `Ok(None)` when the method does not declare it; an error schema that
    /// fails to resolve is reported as such.
    pub fn domain_error(&self, method: &str, name: &str, data: Option<String>) -> Result<Option<RpcError>, CatalogError> {
        let usages = self.catalog.errors(method)?;
        Ok(usages
            .iter()
            .find(|usage| usage.descriptor().name() == name)
            .map(|usage| RpcError::domain(usage.descriptor(), data)))
    }
}

pub struct CodecBuilder {
    types: Arc<dyn TypeDefinitionLoader>,
    methods: Arc<dyn MethodSchemaLoader>,
    roots: Option<RootTypes>,
    objects: ObjectCodecTable,
}

impl CodecBuilder {
    pub fn new(types: Arc<dyn TypeDefinitionLoader>, methods: Arc<dyn MethodSchemaLoader>) -> Self {
        Self {
            types,
            methods,
            roots: None,
            objects: ObjectCodecTable::records(),
        }
    }

    /// Root types to resolve against; the built-in ones by default.
    pub fn roots(mut self, roots: RootTypes) -> Self {
        self.roots = Some(roots);
        self
    }

    /// Object codecs; every object decodes to a `Record` by default.
    pub fn objects(mut self, objects: ObjectCodecTable) -> Self {
        self.objects = objects;
        self
    }

    pub fn build(self) -> Result<Codec, SchemaError> {
        let roots = match self.roots {
            Some(roots) => roots,
            None => RootTypes::builtin()?,
        };
        let resolver = TypeResolver::new(Arc::clone(&self.types), Arc::new(roots));
        let catalog = Arc::new(MethodCatalog::new(
            self.methods,
            resolver,
            ErrorResolver::new(Arc::clone(&self.types)),
            Arc::new(SchemaValidator::new(self.types)),
        ));
        let objects = Arc::new(self.objects);
        Ok(Codec {
            decoder: RequestDecoder::new(Arc::clone(&catalog), Arc::clone(&objects)),
            encoder: ResponseEncoder::new(Arc::clone(&catalog), objects),
            catalog,
        })
    }
}
