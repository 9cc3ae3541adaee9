// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Struct assignment and construction.
//!
//! Structs are references into per-location member maps. Assigning between memory structs, or
//! binding a storage pointer to storage, copies the reference. Every other assignment copies the
//! members one by one, allocating a fresh memory struct when the destination lives in memory.

use super::{ExpressionTranslator, Lowered, SideEffects};
use crate::{
    error::{Result, TranslationError},
    names,
    type_mapper::relocated,
};
use boogie_ast::{Expr, ExprRef, Stmt, Type};
use solidity_ast::{DataLocation, Expression, NodeId, SolType, SourceLocation};

fn struct_parts(ty: &SolType) -> Option<(NodeId, &str, DataLocation)> {
    match ty {
        SolType::Struct {
            def,
            name,
            location,
        } => Some((*def, name, *location)),
        _ => None,
    }
}

impl<'a, 'env> ExpressionTranslator<'a, 'env> {
    /// Assigns the struct `value` of type `rhs_type` to the lvalue `target` of type `lhs_type`.
    pub(crate) fn copy_struct(
        &mut self,
        target: ExprRef,
        lhs_type: &SolType,
        value: ExprRef,
        rhs_type: &SolType,
        loc: &SourceLocation,
        fx: &mut SideEffects,
    ) -> Result<()> {
        let (Some((def, name, lhs_loc)), Some((_, _, rhs_loc))) =
            (struct_parts(lhs_type), struct_parts(rhs_type))
        else {
            return Err(TranslationError::invariant(
                loc,
                format!("Struct assignment between '{}' and '{}'", lhs_type, rhs_type),
            ));
        };

        let by_reference = (lhs_loc == DataLocation::Memory && rhs_loc == DataLocation::Memory)
            || (lhs_loc == DataLocation::StoragePointer && rhs_loc.is_storage());
        if by_reference {
            self.assign_ir(target, value, loc, fx);
            return Ok(());
        }

        let destination = if lhs_loc.is_storage() {
            target
        } else {
            let fresh = self.allocate_struct(def, name, loc, fx);
            self.assign_ir(target, fresh.clone(), loc, fx);
            fresh
        };
        self.copy_members(def, destination, lhs_loc, value, rhs_loc, loc, fx)
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_members(
        &mut self,
        def: NodeId,
        destination: ExprRef,
        lhs_loc: DataLocation,
        source: ExprRef,
        rhs_loc: DataLocation,
        loc: &SourceLocation,
        fx: &mut SideEffects,
    ) -> Result<()> {
        let model = self.ctx.model();
        let Some(definition) = model.struct_definition(def) else {
            return Err(TranslationError::invariant(
                loc,
                format!("Struct definition {} is not available", def),
            ));
        };
        for member in &definition.members {
            let lhs_member = Expr::select(
                Expr::id(names::member_map_name(&member.name, member.id, lhs_loc)),
                destination.clone(),
            );
            let rhs_member = Expr::select(
                Expr::id(names::member_map_name(&member.name, member.id, rhs_loc)),
                source.clone(),
            );
            match &member.ty {
                SolType::Struct { .. } => {
                    let lhs_type = relocated(&member.ty, lhs_loc);
                    let rhs_type = relocated(&member.ty, rhs_loc);
                    self.copy_struct(lhs_member, &lhs_type, rhs_member, &rhs_type, loc, fx)?;
                }
                SolType::Array { .. } | SolType::Mapping { .. } => {
                    self.ctx.report_unsupported(
                        loc,
                        format!("Copying struct member '{}' of type '{}' is not supported", member.name, member.ty),
                    );
                }
                _ => self.assign_ir(lhs_member, rhs_member, loc, fx),
            }
        }
        Ok(())
    }

    /// A fresh memory struct, distinct from all allocated so far
    fn allocate_struct(&mut self, def: NodeId, name: &str, loc: &SourceLocation, fx: &mut SideEffects) -> ExprRef {
        let fresh = format!("struct_alloc#{}", self.ctx.fresh_id());
        let ty = Type::named(names::struct_type_name(name, def, DataLocation::Memory));
        self.declare_local(&fresh, ty, fx);
        let alloc = Expr::id(names::alloc_map_name(name, def));
        fx.stmts.push(Stmt::Havoc(vec![fresh.clone()]));
        fx.stmts.push(Stmt::assume(Expr::not(Expr::select(
            alloc.clone(),
            Expr::id(&fresh),
        ))));
        self.assign_ir(
            alloc.clone(),
            Expr::update(alloc, Expr::id(&fresh), Expr::bool(true)),
            loc,
            fx,
        );
        Expr::id(fresh)
    }

    /// `S(a, b)` allocates a memory struct and initializes its members in order. Mappings have
    /// no constructor argument.
    pub(crate) fn construct_struct(
        &mut self,
        expr: &Expression,
        args: &[Expression],
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let loc = &expr.loc;
        let Some((def, name, _)) = struct_parts(&expr.ty) else {
            return Err(TranslationError::invariant(
                loc,
                format!("Struct constructor of type '{}'", expr.ty),
            ));
        };
        let model = self.ctx.model();
        let Some(definition) = model.struct_definition(def) else {
            return Err(TranslationError::invariant(
                loc,
                format!("Struct definition {} is not available", def),
            ));
        };
        let members: Vec<_> = definition
            .members
            .iter()
            .filter(|m| !matches!(m.ty, SolType::Mapping { .. }))
            .collect();
        if members.len() != args.len() {
            return Err(TranslationError::arity(
                loc,
                name,
                "one per non-mapping member",
                args.len(),
            ));
        }

        let fresh = self.allocate_struct(def, name, loc, fx);
        for (member, arg) in members.into_iter().zip(args) {
            let target = Expr::select(
                Expr::id(names::member_map_name(&member.name, member.id, DataLocation::Memory)),
                fresh.clone(),
            );
            let value = self.lower(arg, fx)?.expr;
            match &member.ty {
                SolType::Struct { .. } => {
                    let member_type = relocated(&member.ty, DataLocation::Memory);
                    self.copy_struct(target, &member_type, value, &arg.ty, loc, fx)?;
                }
                _ => {
                    let value = self.coerce(value, &arg.ty, &member.ty, loc)?;
                    self.assign_ir(target, value, loc, fx);
                }
            }
        }
        Ok(Lowered::plain(fresh))
    }
}

#[cfg(test)]
mod tests {
    use crate::{context::BoogieContext, options::Encoding, translation::ExpressionTranslator};
    use boogie_ast::{Decl, Type};
    use solidity_ast::{AstBuilder, ContractNode, DataLocation, SolType, SourceModel};

    fn struct_type(def: i64, location: DataLocation) -> SolType {
        SolType::Struct {
            def,
            name: "S".to_string(),
            location,
        }
    }

    #[test]
    fn storage_to_memory_copies_members() {
        let mut b = AstBuilder::new("A.sol");
        let x = b.local_var("x", SolType::uint(8));
        let def = b.struct_def("S", vec![x.clone()]);
        let s = b.state_var("s", struct_type(def.id, DataLocation::Storage));
        let m = b.local_var("m", struct_type(def.id, DataLocation::Memory));
        let body = b.block(vec![]);
        let f = b.function("f", vec![m.clone()], vec![], body);
        let contract = b.contract(
            "A",
            vec![
                ContractNode::Struct(def.clone()),
                ContractNode::StateVariable(s.clone()),
                ContractNode::Function(f),
            ],
        );
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);

        let lhs = b.ident(&m);
        let rhs = b.ident(&s);
        let assignment = b.assign(lhs, rhs);
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let converted = ExpressionTranslator::new(&mut ctx).convert(&assignment).unwrap();
        let stmts: Vec<String> = converted.stmts.iter().map(|s| s.to_string()).collect();
        let alloc = format!("alloc_S#{}", def.id);
        assert_eq!(
            stmts,
            vec![
                "havoc struct_alloc#0;\n".to_string(),
                format!("assume !({}[struct_alloc#0]);\n", alloc),
                format!("{0} := {0}[struct_alloc#0 := true];\n", alloc),
                format!("m#{} := struct_alloc#0;\n", m.id),
                format!(
                    "x#{0}#memory := x#{0}#memory[struct_alloc#0 := x#{0}#storage[s#{1}[__this]]];\n",
                    x.id, s.id
                ),
            ]
        );
        assert!(!ctx.diagnostics().has_errors());
    }

    #[test]
    fn tuple_assignment_copies_storage_struct_into_fresh_memory() {
        let mut b = AstBuilder::new("A.sol");
        let x = b.local_var("x", SolType::uint(8));
        let def = b.struct_def("S", vec![x.clone()]);
        let s = b.state_var("s", struct_type(def.id, DataLocation::Storage));
        let m = b.local_var("m", struct_type(def.id, DataLocation::Memory));
        let k = b.local_var("k", SolType::uint(8));
        let body = b.block(vec![]);
        let f = b.function("f", vec![m.clone(), k.clone()], vec![], body);
        let contract = b.contract(
            "A",
            vec![
                ContractNode::Struct(def.clone()),
                ContractNode::StateVariable(s.clone()),
                ContractNode::Function(f),
            ],
        );
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);

        // (m, k) = (s, 5)
        let targets = vec![b.ident(&m), b.ident(&k)];
        let targets = b.tuple(targets);
        let values = vec![b.ident(&s), b.number(5)];
        let values = b.tuple(values);
        let assignment = b.assign(targets, values);
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let converted = ExpressionTranslator::new(&mut ctx).convert(&assignment).unwrap();

        let temp = format!("tmp#{}#0", assignment.id);
        assert!(converted.decls.contains(&Decl::variable(
            &temp,
            Type::named(format!("struct_storage_S#{}", def.id))
        )));
        let stmts: Vec<String> = converted.stmts.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            stmts,
            vec![
                format!("{} := s#{}[__this];\n", temp, s.id),
                format!("tmp#{}#1 := 5;\n", assignment.id),
                "havoc struct_alloc#0;\n".to_string(),
                format!("assume !(alloc_S#{}[struct_alloc#0]);\n", def.id),
                format!("alloc_S#{0} := alloc_S#{0}[struct_alloc#0 := true];\n", def.id),
                format!("m#{} := struct_alloc#0;\n", m.id),
                format!(
                    "x#{0}#memory := x#{0}#memory[struct_alloc#0 := x#{0}#storage[{1}]];\n",
                    x.id, temp
                ),
                format!("k#{} := tmp#{}#1;\n", k.id, assignment.id),
            ]
        );
        assert!(!ctx.diagnostics().has_errors());
    }

    #[test]
    fn memory_to_memory_copies_reference() {
        let mut b = AstBuilder::new("A.sol");
        let x = b.local_var("x", SolType::Bool);
        let def = b.struct_def("S", vec![x]);
        let m1 = b.local_var("m1", struct_type(def.id, DataLocation::Memory));
        let m2 = b.local_var("m2", struct_type(def.id, DataLocation::Memory));
        let body = b.block(vec![]);
        let f = b.function("f", vec![m1.clone(), m2.clone()], vec![], body);
        let contract = b.contract(
            "A",
            vec![ContractNode::Struct(def), ContractNode::Function(f)],
        );
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);

        let lhs = b.ident(&m1);
        let rhs = b.ident(&m2);
        let assignment = b.assign(lhs, rhs);
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let converted = ExpressionTranslator::new(&mut ctx).convert(&assignment).unwrap();
        assert_eq!(converted.stmts.len(), 1);
        assert_eq!(
            converted.stmts[0].to_string(),
            format!("m1#{} := m2#{};\n", m1.id, m2.id)
        );
    }
}
