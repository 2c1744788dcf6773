//! # Schema Loading
//!
//! Two narrow capabilities feed resolution: fetching type definition
//! documents by file name ([`TypeDefinitionLoader`]) and fetching the
//! request/response/error schemas of a method ([`MethodSchemaLoader`]).
//!
//! [`DirectorySchemaLoader`] serves both from a schema directory laid out
//! as:
//!
//! ```text
//! <dir>/type/<file>.json          type definition documents
//! <dir>/<method>.request.json     params: {"type":"array","items":[...]}
//! <dir>/<method>.response.json    result schema
//! <dir>/<method>.error.json       optional error usages
//! <dir>/methods.txt               optional method list
//! ```
//!
//! [`InMemorySchemaLoader`] serves the same from values held in memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::SchemaError;
use crate::roots::{root_document, ROOT_DOCUMENT_NAME};
use crate::schema_ref::SchemaRef;

/// Subdirectory holding type definition documents.
pub const TYPE_DIR: &str = "type";
/// Optional file listing method names, one per line.
pub const METHOD_LIST: &str = "methods.txt";

const REQUEST_SUFFIX: &str = ".request.json";
const RESPONSE_SUFFIX: &str = ".response.json";
const ERROR_SUFFIX: &str = ".error.json";

/// Source of type definition documents.
pub trait TypeDefinitionLoader: Send + Sync {
    /// Fetch a whole definition document by file name (`derived.json`).
    fn document(&self, file: &str) -> Result<Arc<Value>, SchemaError>;

    /// Fetch the node a reference points at.
    fn load(&self, reference: &SchemaRef) -> Result<Value, SchemaError> {
        let document = self.document(reference.file())?;
        reference.dereference(&document).cloned()
    }
}

/// Source of per-method schemas. `Ok(None)` means the method (or, for
/// [`MethodSchemaLoader::error`], its error schema) does not exist.
pub trait MethodSchemaLoader: Send + Sync {
    fn request(&self, method: &str) -> Result<Option<Value>, SchemaError>;
    fn response(&self, method: &str) -> Result<Option<Value>, SchemaError>;
    fn error(&self, method: &str) -> Result<Option<Value>, SchemaError>;
    /// Every method this loader can serve.
    fn methods(&self) -> Result<Vec<String>, SchemaError>;
}

/// Method names come off the wire; only plain names may reach the filesystem.
fn is_plain_method_name(method: &str) -> bool {
    !method.is_empty()
        && !method.starts_with('.')
        && method
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn parse_document(name: &str, content: &str) -> Result<Value, SchemaError> {
    serde_json::from_str(content).map_err(|e| SchemaError::Load {
        document: name.to_string(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Loads schemas from a directory, caching every parsed document.
#[derive(Debug)]
pub struct DirectorySchemaLoader {
    root: PathBuf,
    cache: RwLock<HashMap<PathBuf, Arc<Value>>>,
}

impl DirectorySchemaLoader {
    /// # Errors
    ///
    /// Returns [`SchemaError::Load`] if `root` is not a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(SchemaError::Load {
                document: root.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }
        Ok(Self {
            root,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of documents parsed so far.
    pub fn cached_documents(&self) -> usize {
        self.cache.read().len()
    }

    /// Read and parse `path`, or `Ok(None)` if it does not exist.
    fn read_cached(&self, path: PathBuf) -> Result<Option<Arc<Value>>, SchemaError> {
        if let Some(hit) = self.cache.read().get(&path) {
            return Ok(Some(Arc::clone(hit)));
        }
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value = Arc::new(parse_document(&path.display().to_string(), &content)?);
        tracing::debug!(path = %path.display(), "loaded schema document");
        let mut cache = self.cache.write();
        Ok(Some(Arc::clone(cache.entry(path).or_insert(value))))
    }

    fn method_file(&self, method: &str, suffix: &str) -> Result<Option<Value>, SchemaError> {
        if !is_plain_method_name(method) {
            return Ok(None);
        }
        let path = self.root.join(format!("{method}{suffix}"));
        Ok(self.read_cached(path)?.map(|v| v.as_ref().clone()))
    }
}

impl TypeDefinitionLoader for DirectorySchemaLoader {
    fn document(&self, file: &str) -> Result<Arc<Value>, SchemaError> {
        if file.contains(['/', '\\']) || file.starts_with('.') {
            return Err(SchemaError::Load {
                document: file.to_string(),
                reason: "definition documents must be plain file names".to_string(),
            });
        }
        let path = self.root.join(TYPE_DIR).join(file);
        self.read_cached(path)?.ok_or_else(|| SchemaError::Load {
            document: file.to_string(),
            reason: format!("not found under {}", self.root.join(TYPE_DIR).display()),
        })
    }
}

impl MethodSchemaLoader for DirectorySchemaLoader {
    fn request(&self, method: &str) -> Result<Option<Value>, SchemaError> {
        self.method_file(method, REQUEST_SUFFIX)
    }

    fn response(&self, method: &str) -> Result<Option<Value>, SchemaError> {
        self.method_file(method, RESPONSE_SUFFIX)
    }

    fn error(&self, method: &str) -> Result<Option<Value>, SchemaError> {
        self.method_file(method, ERROR_SUFFIX)
    }

    /// Lines of `methods.txt` (blank lines and `#` comments skipped), or,
    /// without that file, every `<method>.request.json` in sorted order.
    fn methods(&self) -> Result<Vec<String>, SchemaError> {
        match std::fs::read_to_string(self.root.join(METHOD_LIST)) {
            Ok(list) => Ok(list
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let mut methods = Vec::new();
                for entry in std::fs::read_dir(&self.root)? {
                    let entry = entry?;
                    if let Some(name) = entry.file_name().to_str() {
                        if let Some(method) = name.strip_suffix(REQUEST_SUFFIX) {
                            methods.push(method.to_string());
                        }
                    }
                }
                methods.sort();
                Ok(methods)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Schemas for one method held by [`InMemorySchemaLoader`].
#[derive(Debug, Clone)]
struct MethodSchemas {
    request: Value,
    response: Value,
    error: Option<Value>,
}

/// Loader over in-memory values, seeded with the built-in `root.json`.
#[derive(Debug, Clone)]
pub struct InMemorySchemaLoader {
    documents: HashMap<String, Arc<Value>>,
    methods: Vec<String>,
    schemas: HashMap<String, MethodSchemas>,
}

impl Default for InMemorySchemaLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySchemaLoader {
    pub fn new() -> Self {
        let mut documents = HashMap::new();
        documents.insert(ROOT_DOCUMENT_NAME.to_string(), Arc::new(root_document()));
        Self {
            documents,
            methods: Vec::new(),
            schemas: HashMap::new(),
        }
    }

    /// Add or replace a definition document.
    pub fn with_document(mut self, file: impl Into<String>, document: Value) -> Self {
        self.documents.insert(file.into(), Arc::new(document));
        self
    }

    /// Add a method. `params` are the `items` of its request schema.
    pub fn with_method(mut self, method: impl Into<String>, params: Vec<Value>, response: Value) -> Self {
        let method = method.into();
        if !self.schemas.contains_key(&method) {
            self.methods.push(method.clone());
        }
        let request = serde_json::json!({"type": "array", "items": params});
        self.schemas.insert(
            method,
            MethodSchemas {
                request,
                response,
                error: None,
            },
        );
        self
    }

    /// Attach an error schema to a method added with [`Self::with_method`].
    pub fn with_method_errors(mut self, method: &str, error: Value) -> Self {
        if let Some(schemas) = self.schemas.get_mut(method) {
            schemas.error = Some(error);
        }
        self
    }
}

impl TypeDefinitionLoader for InMemorySchemaLoader {
    fn document(&self, file: &str) -> Result<Arc<Value>, SchemaError> {
        self.documents.get(file).cloned().ok_or_else(|| SchemaError::Load {
            document: file.to_string(),
            reason: "no such definition document".to_string(),
        })
    }
}

impl MethodSchemaLoader for InMemorySchemaLoader {
    fn request(&self, method: &str) -> Result<Option<Value>, SchemaError> {
        Ok(self.schemas.get(method).map(|s| s.request.clone()))
    }

    fn response(&self, method: &str) -> Result<Option<Value>, SchemaError> {
        Ok(self.schemas.get(method).map(|s| s.response.clone()))
    }

    fn error(&self, method: &str) -> Result<Option<Value>, SchemaError> {
        Ok(self.schemas.get(method).and_then(|s| s.error.clone()))
    }

    fn methods(&self) -> Result<Vec<String>, SchemaError> {
        Ok(self.methods.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn directory_loader_reads_and_caches_documents() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "type/root.json", &root_document().to_string());
        let loader = DirectorySchemaLoader::new(tmp.path()).unwrap();

        let first = loader.document("root.json").unwrap();
        let second = loader.document("root.json").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.cached_documents(), 1);

        let r = SchemaRef::parse("root.json#/definitions/BOOLEAN").unwrap();
        assert_eq!(loader.load(&r).unwrap(), json!({"type": "boolean"}));
    }

    #[test]
    fn directory_loader_reports_missing_and_invalid_documents() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "type/broken.json", "{ not json");
        let loader = DirectorySchemaLoader::new(tmp.path()).unwrap();

        assert!(matches!(loader.document("absent.json"), Err(SchemaError::Load { .. })));
        assert!(matches!(loader.document("broken.json"), Err(SchemaError::Load { .. })));
        assert!(loader.document("../secrets.json").is_err());
    }

    #[test]
    fn directory_loader_serves_method_files() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "ping.request.json", r#"{"type":"array","items":[]}"#);
        write(tmp.path(), "ping.response.json", r#"{"type":"boolean"}"#);
        let loader = DirectorySchemaLoader::new(tmp.path()).unwrap();

        assert!(loader.request("ping").unwrap().is_some());
        assert_eq!(loader.response("ping").unwrap(), Some(json!({"type": "boolean"})));
        assert_eq!(loader.error("ping").unwrap(), None);
        assert_eq!(loader.request("pong").unwrap(), None);
        assert_eq!(loader.request("../ping").unwrap(), None);
        assert_eq!(loader.methods().unwrap(), vec!["ping".to_string()]);
    }

    #[test]
    fn method_list_file_takes_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "methods.txt", "# served\nb\n\na\n");
        let loader = DirectorySchemaLoader::new(tmp.path()).unwrap();
        assert_eq!(loader.methods().unwrap(), vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn non_directory_root_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("file");
        std::fs::write(&file, "").unwrap();
        assert!(DirectorySchemaLoader::new(&file).is_err());
    }

    #[test]
    fn in_memory_loader_is_seeded_with_roots() {
        let loader = InMemorySchemaLoader::new()
            .with_method("ping", vec![], json!({"type": "boolean"}))
            .with_method_errors("ping", json!({}));
        assert!(loader.document(ROOT_DOCUMENT_NAME).is_ok());
        assert_eq!(
            loader.request("ping").unwrap(),
            Some(json!({"type": "array", "items": []}))
        );
        assert_eq!(loader.error("ping").unwrap(), Some(json!({})));
        assert_eq!(loader.methods().unwrap(), vec!["ping".to_string()]);
    }
}
