//! # arpc-schema — Restricted IDL over JSON Schema
//!
//! Method parameter, result and error schemas are written in JSON Schema,
//! but only a small subset is admitted: every type is a root type
//! (BOOLEAN, DATA, QUANTITY, OBJECT), a named object of scalar fields, or
//! an `allOf` derivation of another type. This crate turns such schemas
//! into a typed IR that a codec can dispatch on.
//!
//! ## Resolution (`resolver`)
//!
//! [`TypeResolver`] resolves a schema node to a [`ResolvedType`], loading
//! referenced definition documents through a [`TypeDefinitionLoader`] and
//! recording every named type in a shared [`TypeRegistry`].
//! [`ErrorResolver`] turns a method's error schema into [`ErrorUsage`]s.
//!
//! ## Validation (`validator`)
//!
//! [`SchemaValidator`] validates wire values against the same schemas,
//! resolving cross-document `$ref`s locally.
//!
//! ## Crate Policy
//!
//! - Resolution failures are definition-time errors ([`SchemaError`]);
//!   they never describe a client's request.
//! - A type name binds to exactly one definition per registry.
//! - No schema is fetched over the network.

pub mod error;
pub mod error_resolver;
pub mod loader;
pub mod registry;
pub mod resolver;
pub mod roots;
pub mod schema_ref;
pub mod types;
pub mod validator;

pub use error::SchemaError;
pub use error_resolver::{ErrorDescriptor, ErrorResolver, ErrorUsage};
pub use loader::{DirectorySchemaLoader, InMemorySchemaLoader, MethodSchemaLoader, TypeDefinitionLoader};
pub use registry::TypeRegistry;
pub use resolver::TypeResolver;
pub use roots::{root_document, RootTypes, ROOT_DOCUMENT_NAME};
pub use schema_ref::SchemaRef;
pub use types::{Field, LengthConstraint, NamedType, ResolvedType, RootKind, Shape};
pub use validator::{SchemaValidationError, SchemaValidator, ValidationViolations, Violation};
