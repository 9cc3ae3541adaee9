// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::NodeId;
use itertools::Itertools;
use num::{BigInt, Num};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a reference-typed value lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLocation {
    /// Storage reference, e.g. a state variable or a member of one
    Storage,
    /// Local variable declared `storage`, aliasing existing storage
    StoragePointer,
    Memory,
    CallData,
}

impl DataLocation {
    pub fn is_storage(&self) -> bool {
        matches!(self, DataLocation::Storage | DataLocation::StoragePointer)
    }
}

/// Members of the built-in `msg`, `block` and `tx` objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagicKind {
    Message,
    Block,
    Transaction,
}

/// Type annotation of an expression or declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolType {
    Address {
        #[serde(default)]
        payable: bool,
    },
    Bool,
    Integer {
        bits: u32,
        signed: bool,
    },
    /// Compile-time constant number, e.g. the type of the literal `5`
    RationalConst {
        value: String,
    },
    FixedBytes {
        size: u32,
    },
    String {
        location: DataLocation,
    },
    StringLiteral {
        value: String,
    },
    Array {
        base: Box<SolType>,
        location: DataLocation,
        #[serde(default)]
        length: Option<u64>,
    },
    Mapping {
        key: Box<SolType>,
        value: Box<SolType>,
    },
    Struct {
        def: NodeId,
        name: String,
        location: DataLocation,
    },
    Enum {
        def: NodeId,
        name: String,
    },
    Contract {
        def: NodeId,
        name: String,
        #[serde(default)]
        is_library: bool,
    },
    Tuple {
        components: Vec<SolType>,
    },
    Magic {
        kind: MagicKind,
    },
    Function {
        params: Vec<SolType>,
        returns: Vec<SolType>,
    },
    /// Type of an expression naming a type, e.g. `E` in `E.A` or `uint8` in `uint8(x)`
    TypeType {
        actual: Box<SolType>,
    },
    Modifier,
}

impl SolType {
    pub fn uint(bits: u32) -> Self {
        SolType::Integer { bits, signed: false }
    }

    pub fn int(bits: u32) -> Self {
        SolType::Integer { bits, signed: true }
    }

    pub fn address() -> Self {
        SolType::Address { payable: false }
    }

    pub fn rational(value: impl Into<BigInt>) -> Self {
        SolType::RationalConst {
            value: value.into().to_string(),
        }
    }

    pub fn array(base: SolType, location: DataLocation) -> Self {
        SolType::Array {
            base: Box::new(base),
            location,
            length: None,
        }
    }

    pub fn mapping(key: SolType, value: SolType) -> Self {
        SolType::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn tuple(components: Vec<SolType>) -> Self {
        SolType::Tuple { components }
    }

    pub fn type_of(actual: SolType) -> Self {
        SolType::TypeType {
            actual: Box::new(actual),
        }
    }

    /// Fixed-width integer types (`uintN`, `intN`), whose values are bounded by their width.
    pub fn is_bit_precise(&self) -> bool {
        matches!(self, SolType::Integer { .. })
    }

    /// Bit width of an integer type, 0 for anything else.
    pub fn bits(&self) -> u32 {
        match self {
            SolType::Integer { bits, .. } => *bits,
            _ => 0,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, SolType::Integer { signed: true, .. })
    }

    /// Value of a compile-time constant number. Accepts decimal and `0x` prefixed hex.
    pub fn rational_value(&self) -> Option<BigInt> {
        match self {
            SolType::RationalConst { value } => parse_number(value),
            _ => None,
        }
    }

    pub fn is_rational(&self) -> bool {
        matches!(self, SolType::RationalConst { .. })
    }

    pub fn is_address(&self) -> bool {
        matches!(self, SolType::Address { .. })
    }

    pub fn data_location(&self) -> Option<DataLocation> {
        match self {
            SolType::String { location }
            | SolType::Array { location, .. }
            | SolType::Struct { location, .. } => Some(*location),
            _ => None,
        }
    }

    /// Unwraps a `TypeType`, returning the type it names.
    pub fn named_type(&self) -> Option<&SolType> {
        match self {
            SolType::TypeType { actual } => Some(actual),
            _ => None,
        }
    }

    /// Components of a tuple type; any other type is a single component.
    pub fn components(&self) -> Vec<SolType> {
        match self {
            SolType::Tuple { components } => components.clone(),
            other => vec![other.clone()],
        }
    }
}

/// Parses a decimal or hex number literal, ignoring `_` separators.
pub fn parse_number(text: &str) -> Option<BigInt> {
    let text = text.replace('_', "");
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, text),
    };
    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => BigInt::from_str_radix(hex, 16).ok()?,
        None => BigInt::from_str_radix(&digits, 10).ok()?,
    };
    Some(if negative { -value } else { value })
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataLocation::Storage => write!(f, "storage ref"),
            DataLocation::StoragePointer => write!(f, "storage pointer"),
            DataLocation::Memory => write!(f, "memory"),
            DataLocation::CallData => write!(f, "calldata"),
        }
    }
}

impl fmt::Display for SolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolType::Address { payable } => {
                write!(f, "{}", if *payable { "address payable" } else { "address" })
            }
            SolType::Bool => write!(f, "bool"),
            SolType::Integer { bits, signed } => {
                write!(f, "{}int{}", if *signed { "" } else { "u" }, bits)
            }
            SolType::RationalConst { value } => write!(f, "int_const {}", value),
            SolType::FixedBytes { size } => write!(f, "bytes{}", size),
            SolType::String { location } => write!(f, "string {}", location),
            SolType::StringLiteral { value } => write!(f, "literal_string \"{}\"", value),
            SolType::Array {
                base,
                location,
                length,
            } => match length {
                Some(n) => write!(f, "{}[{}] {}", base, n, location),
                None => write!(f, "{}[] {}", base, location),
            },
            SolType::Mapping { key, value } => write!(f, "mapping({} => {})", key, value),
            SolType::Struct { name, location, .. } => write!(f, "struct {} {}", name, location),
            SolType::Enum { name, .. } => write!(f, "enum {}", name),
            SolType::Contract {
                name, is_library, ..
            } => write!(f, "{} {}", if *is_library { "library" } else { "contract" }, name),
            SolType::Tuple { components } => write!(f, "tuple({})", components.iter().join(",")),
            SolType::Magic { kind } => match kind {
                MagicKind::Message => write!(f, "msg"),
                MagicKind::Block => write!(f, "block"),
                MagicKind::Transaction => write!(f, "tx"),
            },
            SolType::Function { params, returns } => write!(
                f,
                "function ({}) returns ({})",
                params.iter().join(","),
                returns.iter().join(",")
            ),
            SolType::TypeType { actual } => write!(f, "type({})", actual),
            SolType::Modifier => write!(f, "modifier"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_parsing() {
        assert_eq!(parse_number("1_000"), Some(BigInt::from(1000)));
        assert_eq!(parse_number("0xff"), Some(BigInt::from(255)));
        assert_eq!(parse_number("-7"), Some(BigInt::from(-7)));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(SolType::uint(8).to_string(), "uint8");
        assert_eq!(SolType::int(256).to_string(), "int256");
        assert_eq!(
            SolType::mapping(SolType::address(), SolType::uint(256)).to_string(),
            "mapping(address => uint256)"
        );
        assert_eq!(
            SolType::tuple(vec![SolType::Bool, SolType::uint(8)]).to_string(),
            "tuple(bool,uint8)"
        );
    }
}
