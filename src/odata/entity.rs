//! Entity descriptions used by the query-option layer.
//!
//! An [`EdmEntity`] declares its structural properties (with their EDM kind)
//! and its navigation properties. `$filter`, `$orderby`, `$select` and
//! `$expand` are bound against these declarations before anything is
//! evaluated, so an unknown property is rejected even on an empty collection.

use std::cmp::Ordering;

use serde::Serialize;

/// EDM kind of a structural property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Int32,
    Boolean,
    String,
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyKind::Int32 => write!(f, "Edm.Int32"),
            PropertyKind::Boolean => write!(f, "Edm.Boolean"),
            PropertyKind::String => write!(f, "Edm.String"),
        }
    }
}

/// A declared structural property.
#[derive(Debug, Clone, Copy)]
pub struct Property {
    pub name: &'static str,
    pub kind: PropertyKind,
}

impl Property {
    pub const fn new(name: &'static str, kind: PropertyKind) -> Self {
        Self { name, kind }
    }
}

/// A declared navigation property and the navigation properties of its target.
#[derive(Debug, Clone, Copy)]
pub struct Navigation {
    pub name: &'static str,
    pub target: &'static [Navigation],
}

impl Navigation {
    pub const fn new(name: &'static str, target: &'static [Navigation]) -> Self {
        Self { name, target }
    }
}

/// Runtime value of a structural property.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
}

impl Primitive {
    pub fn kind(&self) -> Option<PropertyKind> {
        match self {
            Primitive::Null => None,
            Primitive::Bool(_) => Some(PropertyKind::Boolean),
            Primitive::Int(_) => Some(PropertyKind::Int32),
            Primitive::String(_) => Some(PropertyKind::String),
        }
    }

    /// Ordering between two values of the same kind. Null sorts first;
    /// values of different kinds are unordered.
    pub fn compare(&self, other: &Primitive) -> Option<Ordering> {
        match (self, other) {
            (Primitive::Null, Primitive::Null) => Some(Ordering::Equal),
            (Primitive::Null, _) => Some(Ordering::Less),
            (_, Primitive::Null) => Some(Ordering::Greater),
            (Primitive::Bool(a), Primitive::Bool(b)) => Some(a.cmp(b)),
            (Primitive::Int(a), Primitive::Int(b)) => Some(a.cmp(b)),
            (Primitive::String(a), Primitive::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// An entity type exposed through the query-option layer.
pub trait EdmEntity: Serialize {
    /// Unqualified EDM type name, e.g. `Book`.
    const TYPE_NAME: &'static str;

    /// Structural properties that can be filtered, ordered and selected.
    const PROPERTIES: &'static [Property];

    /// Navigation properties; omitted from payloads unless expanded.
    const NAVIGATION: &'static [Navigation];

    /// Value of a structural property, `None` when the name is not declared.
    fn property(&self, name: &str) -> Option<Primitive>;

    fn property_kind(name: &str) -> Option<PropertyKind> {
        Self::PROPERTIES
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.kind)
    }
}
