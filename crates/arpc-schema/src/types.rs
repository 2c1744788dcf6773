//! # Resolved Type IR
//!
//! The output of type resolution. Every [`ResolvedType`] is a chain of
//! derivations that ends at exactly one of the four root types. Derived
//! types carry the constraint they add on top of their base; object types
//! carry their ordered field list.

use std::fmt;

use serde_json::Value;

/// The four root types of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKind {
    Boolean,
    Data,
    Quantity,
    Object,
}

impl RootKind {
    pub const ALL: [RootKind; 4] = [Self::Boolean, Self::Data, Self::Quantity, Self::Object];

    /// Canonical definition name of the root type in `root.json`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Data => "DATA",
            Self::Quantity => "QUANTITY",
            Self::Object => "OBJECT",
        }
    }

    /// Look up a root by its definition name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte-length restriction of a DATA-rooted type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthConstraint {
    Unbounded,
    /// Exactly this many bytes.
    Exact(usize),
}

impl LengthConstraint {
    pub fn admits(self, len: usize) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Exact(n) => n == len,
        }
    }
}

/// How a value of a resolved type is represented on the native side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape<'a> {
    Boolean,
    Data(LengthConstraint),
    Quantity,
    Object(&'a [Field]),
}

/// A type after resolution.
///
/// Invariants: `root_of()` is always one of the four roots; `fields` is
/// non-empty only when the root is OBJECT; a type with a `constraint`
/// always has a `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    definition: Value,
    base: Option<Box<ResolvedType>>,
    constraint: Option<Value>,
    fields: Vec<Field>,
    root: RootKind,
}

impl ResolvedType {
    pub(crate) fn root(kind: RootKind, definition: Value) -> Self {
        Self {
            definition,
            base: None,
            constraint: None,
            fields: Vec::new(),
            root: kind,
        }
    }

    /// A type that narrows `base` with an extra constraint node (`allOf`).
    pub(crate) fn derived(definition: Value, base: ResolvedType, constraint: Value) -> Self {
        Self {
            definition,
            root: base.root,
            fields: base.fields.clone(),
            constraint: Some(constraint),
            base: Some(Box::new(base)),
        }
    }

    /// A named object type derived from the OBJECT root.
    pub(crate) fn object(definition: Value, object_root: ResolvedType, fields: Vec<Field>) -> Self {
        Self {
            definition,
            root: RootKind::Object,
            constraint: None,
            base: Some(Box::new(object_root)),
            fields,
        }
    }

    /// The schema node this type was resolved from.
    pub fn definition(&self) -> &Value {
        &self.definition
    }

    pub fn base(&self) -> Option<&ResolvedType> {
        self.base.as_deref()
    }

    pub fn constraint(&self) -> Option<&Value> {
        self.constraint.as_ref()
    }

    /// Ordered fields; empty unless the type is OBJECT-rooted.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_root(&self) -> bool {
        self.base.is_none()
    }

    /// Follow `base` links to the root type.
    pub fn root_of(&self) -> &ResolvedType {
        let mut ty = self;
        while let Some(base) = ty.base() {
            ty = base;
        }
        ty
    }

    pub fn root_kind(&self) -> RootKind {
        self.root
    }

    /// Exact byte length, taken from the nearest constraint in the chain
    /// whose `minLength` equals its `maxLength`.
    ///
    /// Lengths in the schema count hex characters including `0x`, so a
    /// 66-character string is 32 bytes.
    pub fn length_constraint(&self) -> LengthConstraint {
        let mut ty = Some(self);
        while let Some(current) = ty {
            if let Some(constraint) = current.constraint() {
                let min = constraint.get("minLength").and_then(Value::as_u64);
                let max = constraint.get("maxLength").and_then(Value::as_u64);
                if let (Some(min), Some(max)) = (min, max) {
                    if min == max && min >= 2 && (min - 2) % 2 == 0 {
                        return LengthConstraint::Exact(((min - 2) / 2) as usize);
                    }
                }
            }
            ty = current.base();
        }
        LengthConstraint::Unbounded
    }

    pub fn shape(&self) -> Shape<'_> {
        match self.root {
            RootKind::Boolean => Shape::Boolean,
            RootKind::Data => Shape::Data(self.length_constraint()),
            RootKind::Quantity => Shape::Quantity,
            RootKind::Object => Shape::Object(&self.fields),
        }
    }
}

/// A resolved type bound to the name it was referenced by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedType {
    name: String,
    ty: ResolvedType,
}

impl NamedType {
    pub fn new(name: impl Into<String>, ty: ResolvedType) -> Self {
        Self { name: name.into(), ty }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ResolvedType {
        &self.ty
    }

    pub fn into_resolved(self) -> ResolvedType {
        self.ty
    }

    pub fn root_kind(&self) -> RootKind {
        self.ty.root_kind()
    }

    pub fn fields(&self) -> &[Field] {
        self.ty.fields()
    }

    pub fn length_constraint(&self) -> LengthConstraint {
        self.ty.length_constraint()
    }
}

impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty.is_root() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.ty.root_kind())
        }
    }
}

/// One property of an object type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    ty: NamedType,
    definition: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: NamedType, definition: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            definition,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &NamedType {
        &self.ty
    }

    /// The property's schema node as written in the object definition.
    pub fn definition(&self) -> &Value {
        &self.definition
    }

    pub fn description(&self) -> Option<&str> {
        self.definition.get("description").and_then(Value::as_str)
    }
}
