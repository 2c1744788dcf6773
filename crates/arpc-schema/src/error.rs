//! # Schema Errors
//!
//! Definition-time failures raised while turning schema documents into
//! the typed IR. A schema set that produces any of these is broken and
//! must be fixed before it can serve requests.

use thiserror::Error;

/// Error raised while loading or resolving type definitions.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema is missing a required keyword, has the wrong JSON shape,
    /// or contains a reference that cannot be dereferenced.
    #[error("malformed schema: {0}")]
    Malformed(String),

    /// The schema is valid JSON Schema but uses a construct the IDL
    /// does not admit (arrays, inline objects, nested `anyOf`, ...).
    #[error("schema restriction: {0}")]
    Restriction(String),

    /// A type name was resolved twice to two different definitions.
    #[error("naming conflict: type '{name}' is already bound to {existing}, cannot rebind to {attempted}")]
    NamingConflict {
        /// The contested type name.
        name: String,
        /// Definition already registered under `name`.
        existing: String,
        /// Definition that attempted to claim `name`.
        attempted: String,
    },

    /// A schema document could not be found or parsed.
    #[error("schema load error for '{document}': {reason}")]
    Load {
        /// Document file name or path.
        document: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// IO error reading a schema document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// True for errors caused by a construct the IDL forbids.
    pub fn is_restriction(&self) -> bool {
        matches!(self, Self::Restriction(_))
    }

    /// True for errors caused by schema documents that are structurally
    /// broken or missing.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::Load { .. } | Self::Io(_))
    }

    /// True when the error is a type-name collision.
    pub fn is_naming_conflict(&self) -> bool {
        matches!(self, Self::NamingConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_disjoint() {
        let restriction = SchemaError::Restriction("array".into());
        let malformed = SchemaError::Malformed("missing type".into());
        let conflict = SchemaError::NamingConflict {
            name: "DATA32".into(),
            existing: "{}".into(),
            attempted: "{}".into(),
        };
        let load = SchemaError::Load {
            document: "derived.json".into(),
            reason: "not found".into(),
        };

        assert!(restriction.is_restriction() && !restriction.is_malformed());
        assert!(malformed.is_malformed() && !malformed.is_restriction());
        assert!(conflict.is_naming_conflict() && !conflict.is_malformed());
        assert!(load.is_malformed());
    }

    #[test]
    fn naming_conflict_message_names_the_type() {
        let err = SchemaError::NamingConflict {
            name: "BlockTemplate".into(),
            existing: "a".into(),
            attempted: "b".into(),
        };
        assert!(err.to_string().contains("'BlockTemplate'"));
    }
}
