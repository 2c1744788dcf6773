//! # Type Registry
//!
//! Name-to-type index shared by everything resolved against one schema
//! set. A name is bound on first registration; re-registering the same
//! definition is a no-op and re-registering a different one is a
//! [`SchemaError::NamingConflict`].

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::SchemaError;
use crate::types::{NamedType, ResolvedType};

#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<String, ResolvedType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `ty.name()` to `ty.ty()`.
    ///
    /// The check and the insert happen under one write lock, so two
    /// concurrent registrations of different shapes cannot both succeed.
    pub fn put(&self, ty: &NamedType) -> Result<(), SchemaError> {
        let mut guard = self.types.write();
        match guard.get(ty.name()) {
            Some(existing) if existing == ty.ty() => Ok(()),
            Some(existing) => Err(SchemaError::NamingConflict {
                name: ty.name().to_string(),
                existing: existing.definition().to_string(),
                attempted: ty.ty().definition().to_string(),
            }),
            None => {
                guard.insert(ty.name().to_string(), ty.ty().clone());
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<ResolvedType> {
        self.types.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }
}
