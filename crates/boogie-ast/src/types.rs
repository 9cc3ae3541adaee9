// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Boogie types
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    /// Mathematical booleans
    Bool,
    /// Unbounded mathematical integers
    Int,
    /// Bitvector of the given width
    Bv(u32),
    /// Map from one type to another, e.g. `[address_t]int`
    Map { key: Box<Type>, value: Box<Type> },
    /// A type declared in the program (type alias or opaque type)
    Named(String),
}

impl Type {
    pub fn map(key: Type, value: Type) -> Self {
        Type::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Type::Named(name.into())
    }

    pub fn is_bv(&self) -> bool {
        matches!(self, Type::Bv(_))
    }

    /// Width of a bitvector type, `None` for any other type.
    pub fn bv_width(&self) -> Option<u32> {
        match self {
            Type::Bv(width) => Some(*width),
            _ => None,
        }
    }

    /// Returns the value type of a map, `None` for any other type.
    pub fn map_value(&self) -> Option<&Type> {
        match self {
            Type::Map { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Bv(width) => write!(f, "bv{}", width),
            Type::Map { key, value } => write!(f, "[{}]{}", key, value),
            Type::Named(name) => write!(f, "{}", name),
        }
    }
}
