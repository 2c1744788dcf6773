//! # Schema References
//!
//! A `$ref` string of the form `file.json#/path/to/Name`. The part before
//! `#` names a type definition document, the fragment is a JSON pointer
//! into it, and the last fragment segment is the type name.

use std::fmt;

use serde_json::Value;

use crate::error::SchemaError;

/// A parsed `$ref` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRef {
    value: String,
    hash: usize,
    name: String,
}

impl SchemaRef {
    /// Parse a reference string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Malformed`] if the reference has no file part,
    /// no `#` fragment, or an empty trailing segment (no type name).
    pub fn parse(value: impl Into<String>) -> Result<Self, SchemaError> {
        let value = value.into();
        let hash = value
            .find('#')
            .ok_or_else(|| SchemaError::Malformed(format!("reference '{value}' has no '#' fragment")))?;
        if hash == 0 {
            return Err(SchemaError::Malformed(format!(
                "reference '{value}' does not name a definition document"
            )));
        }
        let last = value[hash + 1..].rsplit('/').next().unwrap_or_default();
        if last.is_empty() {
            return Err(SchemaError::Malformed(format!(
                "reference '{value}' does not end in a type name"
            )));
        }
        let name = unescape(last);
        Ok(Self { value, hash, name })
    }

    /// Read the `$ref` keyword of a schema node, if present.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Malformed`] if `$ref` is present but not a
    /// string, or if the string does not parse.
    pub fn from_node(node: &Value) -> Result<Option<Self>, SchemaError> {
        match node.get("$ref") {
            None => Ok(None),
            Some(Value::String(s)) => Self::parse(s.as_str()).map(Some),
            Some(other) => Err(SchemaError::Malformed(format!("'$ref' must be a string, found {other}"))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The definition document, e.g. `derived.json`.
    pub fn file(&self) -> &str {
        &self.value[..self.hash]
    }

    /// The JSON pointer after `#`, e.g. `/definitions/DATA32`.
    pub fn fragment(&self) -> &str {
        &self.value[self.hash + 1..]
    }

    /// Fragment segments with JSON pointer escapes undone.
    pub fn fragment_parts(&self) -> Vec<String> {
        self.fragment()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(unescape)
            .collect()
    }

    /// The referenced type name: the last fragment segment, unescaped.
    pub fn type_name(&self) -> &str {
        &self.name
    }

    /// Walk the fragment through `document` and return the node it names.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Malformed`] ("broken reference") if any segment
    /// is missing.
    pub fn dereference<'a>(&self, document: &'a Value) -> Result<&'a Value, SchemaError> {
        let mut node = document;
        for part in self.fragment_parts() {
            let next = match node {
                Value::Object(map) => map.get(&part),
                Value::Array(items) => part.parse::<usize>().ok().and_then(|ix| items.get(ix)),
                _ => None,
            };
            node = next.ok_or_else(|| {
                SchemaError::Malformed(format!("broken reference '{}': no '{part}' segment", self.value))
            })?;
        }
        Ok(node)
    }
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_file_fragment_and_name() {
        let r = SchemaRef::parse("derived.json#/definitions/DATA32").unwrap();
        assert_eq!(r.file(), "derived.json");
        assert_eq!(r.fragment(), "/definitions/DATA32");
        assert_eq!(r.fragment_parts(), vec!["definitions", "DATA32"]);
        assert_eq!(r.type_name(), "DATA32");
        assert_eq!(r.to_string(), "derived.json#/definitions/DATA32");
    }

    #[test]
    fn rejects_references_without_a_type_name() {
        assert!(SchemaRef::parse("derived.json").unwrap_err().is_malformed());
        assert!(SchemaRef::parse("#/definitions/X").unwrap_err().is_malformed());
        assert!(SchemaRef::parse("derived.json#/definitions/").unwrap_err().is_malformed());
    }

    #[test]
    fn reads_ref_keyword_from_node() {
        assert!(SchemaRef::from_node(&json!({"type": "boolean"})).unwrap().is_none());
        let r = SchemaRef::from_node(&json!({"$ref": "root.json#/definitions/DATA"}))
            .unwrap()
            .unwrap();
        assert_eq!(r.type_name(), "DATA");
        assert!(SchemaRef::from_node(&json!({"$ref": 7})).is_err());
    }

    #[test]
    fn dereferences_into_document() {
        let doc = json!({"definitions": {"A": {"type": "boolean"}}});
        let r = SchemaRef::parse("x.json#/definitions/A").unwrap();
        assert_eq!(r.dereference(&doc).unwrap(), &json!({"type": "boolean"}));
    }

    #[test]
    fn broken_reference_is_malformed() {
        let doc = json!({"definitions": {}});
        let r = SchemaRef::parse("x.json#/definitions/Missing").unwrap();
        let err = r.dereference(&doc).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("broken reference"));
    }

    #[test]
    fn pointer_escapes_are_decoded() {
        let doc = json!({"definitions": {"a/b": {"type": "boolean"}}});
        let r = SchemaRef::parse("x.json#/definitions/a~1b").unwrap();
        assert!(r.dereference(&doc).is_ok());
        assert_eq!(r.type_name(), "a/b");
        assert_eq!(SchemaRef::parse("x.json#/definitions/t~0x").unwrap().type_name(), "t~x");
    }
}
