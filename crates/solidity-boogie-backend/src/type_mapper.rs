// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Solidity types to Boogie types, and their default values.

use crate::{context::BoogieContext, diagnostics::DiagnosticKind, names};
use boogie_ast::{Expr, ExprRef, Type};
use solidity_ast::{DataLocation, SolType, SourceLocation};

impl<'env> BoogieContext<'env> {
    /// Boogie type of values of `ty`. Types without a representation are reported at `loc` and
    /// mapped to a sentinel type.
    pub fn map_type(&mut self, ty: &SolType, loc: &SourceLocation) -> Type {
        match ty {
            SolType::Address { .. } | SolType::Contract { .. } => self.address_type(),
            SolType::String { .. } | SolType::StringLiteral { .. } => {
                Type::named(names::STRING_TYPE)
            }
            SolType::Bool => Type::Bool,
            // fixed at the use site, when the literal is converted to its target type
            SolType::RationalConst { .. } => Type::named(names::INT_CONST_TYPE),
            SolType::Integer { bits, .. } => self.int_type(*bits),
            SolType::Enum { .. } => self.int_type(8),
            SolType::Array { base, .. } => {
                let element = self.map_type(base, loc);
                Type::map(self.int_type(256), element)
            }
            SolType::Mapping { key, value } => {
                let key = self.map_type(key, loc);
                let value = self.map_type(value, loc);
                Type::map(key, value)
            }
            SolType::FixedBytes { size: 1 } => self.int_type(8),
            SolType::FixedBytes { .. } => Type::map(self.int_type(256), self.int_type(8)),
            SolType::Struct {
                def,
                name,
                location,
            } => Type::named(names::struct_type_name(name, *def, *location)),
            SolType::Tuple { .. } => {
                self.report_error(DiagnosticKind::TypeMapping, loc, "Tuples are not supported");
                Type::named(names::ERR_TYPE)
            }
            other => {
                let text = other.to_string();
                let head = text.split(' ').next().unwrap_or_default();
                self.report_error(
                    DiagnosticKind::TypeMapping,
                    loc,
                    format!("Unsupported type: '{}'", head),
                );
                Type::named(names::ERR_TYPE)
            }
        }
    }

    /// Value a variable of type `ty` holds before its first assignment, `None` when there is
    /// no scalar default.
    pub fn default_value(&self, ty: &SolType) -> Option<ExprRef> {
        match ty {
            SolType::Integer { bits, .. } => Some(self.int_lit(0, *bits)),
            SolType::Enum { .. } | SolType::FixedBytes { size: 1 } => Some(self.int_lit(0, 8)),
            SolType::Bool => Some(Expr::bool(false)),
            SolType::Address { .. } | SolType::Contract { .. } => {
                Some(Expr::id(names::ZERO_ADDRESS))
            }
            _ => None,
        }
    }

    /// Type of the shadow holding the lengths of the arrays inside a value of type `ty`: a
    /// number for arrays, a map for mappings to arrays.
    pub fn length_shadow_type(&mut self, ty: &SolType, loc: &SourceLocation) -> Option<Type> {
        match ty {
            SolType::Array { .. } => Some(self.int_type(256)),
            SolType::Mapping { key, value } => {
                let inner = self.length_shadow_type(value, loc)?;
                let key = self.map_type(key, loc);
                Some(Type::map(key, inner))
            }
            _ => None,
        }
    }
}

/// The type of a value of `ty` once stored at `location`. Struct and array members inherit
/// the location of their container.
pub fn relocated(ty: &SolType, location: DataLocation) -> SolType {
    match ty {
        SolType::Struct { def, name, .. } => SolType::Struct {
            def: *def,
            name: name.clone(),
            location,
        },
        SolType::Array { base, length, .. } => SolType::Array {
            base: Box::new(relocated(base, location)),
            location,
            length: *length,
        },
        SolType::String { .. } => SolType::String { location },
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Encoding;
    use solidity_ast::{MagicKind, SourceModel};

    #[test]
    fn integer_types_follow_encoding() {
        let model = SourceModel::default();
        let loc = SourceLocation::default();
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Bv, false);
        assert_eq!(ctx.map_type(&SolType::uint(8), &loc), Type::Bv(8));
        assert_eq!(
            ctx.map_type(&SolType::array(SolType::int(16), DataLocation::Storage), &loc)
                .to_string(),
            "[bv256]bv16"
        );
        assert_eq!(
            ctx.map_type(&SolType::FixedBytes { size: 4 }, &loc).to_string(),
            "[bv256]bv8"
        );
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Mod, false);
        assert_eq!(
            ctx.map_type(&SolType::mapping(SolType::address(), SolType::uint(256)), &loc)
                .to_string(),
            "[address_t]int"
        );
        assert_eq!(ctx.map_type(&SolType::rational(3), &loc).to_string(), "int_const");
        assert!(!ctx.diagnostics().has_errors());
    }

    #[test]
    fn unsupported_types_yield_sentinel() {
        let model = SourceModel::default();
        let loc = SourceLocation::default();
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let tuple = SolType::tuple(vec![SolType::Bool, SolType::Bool]);
        assert_eq!(ctx.map_type(&tuple, &loc), Type::named(names::ERR_TYPE));
        let magic = SolType::Magic {
            kind: MagicKind::Transaction,
        };
        assert_eq!(ctx.map_type(&magic, &loc), Type::named(names::ERR_TYPE));
        let messages: Vec<_> = ctx
            .diagnostics()
            .errors_of_kind(DiagnosticKind::TypeMapping)
            .map(|d| d.message.clone())
            .collect();
        assert_eq!(messages, vec!["Tuples are not supported", "Unsupported type: 'tx'"]);
    }

    #[test]
    fn length_shadows_follow_mappings() {
        let model = SourceModel::default();
        let loc = SourceLocation::default();
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Bv, false);
        let array = SolType::array(SolType::uint(8), DataLocation::Storage);
        assert_eq!(ctx.length_shadow_type(&array, &loc), Some(Type::Bv(256)));
        let nested = SolType::mapping(SolType::address(), array);
        assert_eq!(
            ctx.length_shadow_type(&nested, &loc).unwrap().to_string(),
            "[address_t]bv256"
        );
        assert_eq!(ctx.length_shadow_type(&SolType::Bool, &loc), None);
    }

    #[test]
    fn struct_members_take_container_location() {
        let member = SolType::Struct {
            def: 3,
            name: "S".to_string(),
            location: DataLocation::StoragePointer,
        };
        assert_eq!(
            relocated(&member, DataLocation::Memory),
            SolType::Struct {
                def: 3,
                name: "S".to_string(),
                location: DataLocation::Memory
            }
        );
    }
}
