// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Contract translation: state, types and procedures of each contract
//!
//! State variables become maps from contract addresses to values, so that one Boogie program
//! can talk about many instances of a contract. Every function becomes a procedure whose first
//! three parameters are the receiving instance, the sender and the attached ether. Contract
//! invariants are checked on entry and exit of every public function and established by the
//! constructor.

use super::{expression_translator::length_shadow, ExpressionTranslator, StatementTranslator};
use crate::{
    context::{BoogieContext, DocTagExpr},
    diagnostics::DiagnosticKind,
    error::Result,
    helpers, names,
    type_mapper::relocated,
};
use boogie_ast::{Attr, Binding, Block, Decl, Expr, ExprRef, Procedure, Specification, Stmt, Type};
use itertools::Itertools;
use log::{debug, info};
use solidity_ast::{
    BinaryOperator, ContractDefinition, ContractKind, ContractNode, DataLocation, DocTag,
    EnumDefinition, FunctionDefinition, FunctionKind, SolType, SourceLocation, SourceUnitNode,
    StructDefinition, VariableDeclaration,
};

/// Turns the documentation tags of a contract into expressions.
///
/// Parsing the tag text needs a Solidity front end, which lives outside of this crate.
pub trait DocTagResolver {
    fn resolve(&self, contract: &ContractDefinition, tag: &DocTag) -> Option<solidity_ast::Expression>;
}

/// Uses the expressions shipped with the tags in the AST.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedDocTags;

impl DocTagResolver for EmbeddedDocTags {
    fn resolve(&self, _contract: &ContractDefinition, tag: &DocTag) -> Option<solidity_ast::Expression> {
        tag.expr.clone()
    }
}

/// Translates every source unit of the model into the program of `ctx`.
pub fn translate_model(ctx: &mut BoogieContext, resolver: &dyn DocTagResolver) -> Result<()> {
    let prelude = helpers::prelude_decls(ctx);
    ctx.add_decls(prelude);

    let model = ctx.model();
    for unit in model.units() {
        info!("translating source unit `{}`", unit.path);
        ctx.add_decl(Decl::comment("", format!("------- Source: {} -------", unit.path)));
        for node in &unit.nodes {
            match node {
                SourceUnitNode::Pragma(pragma) => ctx.add_decl(Decl::comment(
                    "",
                    format!("Pragma: {}", pragma.literals.join("")),
                )),
                SourceUnitNode::Contract(contract) => {
                    ContractTranslator::new(ctx, resolver).translate(contract)?
                }
                SourceUnitNode::Unsupported(node) => ctx.report_warning(
                    &node.loc,
                    format!("Ignored source unit node of kind {}", node.kind),
                ),
            }
        }
    }
    Ok(())
}

pub struct ContractTranslator<'a, 'env> {
    ctx: &'a mut BoogieContext<'env>,
    resolver: &'a dyn DocTagResolver,
}

impl<'a, 'env> ContractTranslator<'a, 'env> {
    pub fn new(ctx: &'a mut BoogieContext<'env>, resolver: &'a dyn DocTagResolver) -> Self {
        Self { ctx, resolver }
    }

    /// Emits the declarations of one contract. The constructor comes last, once all sum
    /// shadows it has to reset are known.
    pub fn translate(&mut self, contract: &ContractDefinition) -> Result<()> {
        info!("translating contract `{}`", contract.name);
        self.ctx.enter_contract();
        self.ctx.add_decl(Decl::comment(
            "",
            format!("------- Contract: {} -------", contract.name),
        ));
        if !contract.base_contracts.is_empty() {
            self.ctx.add_decl(Decl::comment(
                "",
                format!("Inherits from: {}", contract.base_contracts.join(", ")),
            ));
        }

        self.translate_invariants(contract)?;

        for node in &contract.nodes {
            match node {
                ContractNode::StateVariable(var) => self.translate_state_variable(var),
                ContractNode::Struct(def) => self.translate_struct(def),
                ContractNode::Enum(def) => self.translate_enum(def),
                ContractNode::Event(event) => self
                    .ctx
                    .add_decl(Decl::comment("", format!("Event: {}", event.name))),
                ContractNode::UsingFor(directive) => {
                    let target = directive
                        .type_name
                        .as_ref()
                        .map_or_else(|| "*".to_string(), |ty| ty.to_string());
                    self.ctx.add_decl(Decl::comment(
                        "",
                        format!("Using {} for {}", directive.library, target),
                    ));
                }
                // inlined into the functions using them
                ContractNode::Modifier(_) => {}
                ContractNode::Function(fun) if fun.kind == FunctionKind::Constructor => {}
                ContractNode::Function(fun) => self.translate_function(contract, fun)?,
                ContractNode::Unsupported(node) => self.ctx.report_warning(
                    &node.loc,
                    format!("Ignored contract node of kind {}", node.kind),
                ),
            }
        }

        match contract.constructor() {
            Some(constructor) => self.translate_function(contract, constructor)?,
            None if contract.kind == ContractKind::Contract => {
                self.translate_default_constructor(contract)?
            }
            None => {}
        }

        for sum in self.ctx.take_undeclared_sums() {
            let ty = Type::map(self.ctx.address_type(), self.ctx.int_type(256));
            self.ctx.add_decl(Decl::variable(sum, ty));
        }
        Ok(())
    }

    // ========================================================================
    // Invariants
    // ========================================================================

    fn translate_invariants(&mut self, contract: &ContractDefinition) -> Result<()> {
        for tag in &contract.invariants {
            let Some(expr) = self.resolver.resolve(contract, tag) else {
                self.ctx.report_error(
                    DiagnosticKind::UnsupportedConstruct,
                    &contract.loc,
                    format!("Invariant '{}' could not be resolved", tag.text),
                );
                continue;
            };
            let converted = ExpressionTranslator::new(self.ctx).convert(&expr)?;
            if converted.has_side_effects() {
                self.ctx.report_unsupported(
                    &expr.loc,
                    format!("Invariant '{}' has side effects", tag.text),
                );
                continue;
            }
            debug!("invariant `{}` of `{}`", tag.text, contract.name);
            self.ctx.add_decls(converted.constants);
            self.ctx.add_invariant(DocTagExpr {
                text: tag.text.clone(),
                expr: converted.expr,
                tccs: converted.tccs,
            });
        }
        Ok(())
    }

    fn invariant_specs(&self, loc: &SourceLocation, when: &str) -> Vec<Specification> {
        self.ctx
            .invariants()
            .iter()
            .map(|invariant| {
                Specification::new(
                    invariant.expr.clone(),
                    names::loc_attrs(
                        loc,
                        format!(
                            "State variable invariant '{}' might not hold {}.",
                            invariant.text, when
                        ),
                    ),
                )
            })
            .collect()
    }

    fn invariant_tccs(&self) -> Vec<Specification> {
        self.ctx
            .invariants()
            .iter()
            .flat_map(|invariant| invariant.tccs.iter().cloned())
            .unique_by(|tcc| tcc.to_string())
            .map(|tcc| Specification::new(tcc, vec![]))
            .collect()
    }

    // ========================================================================
    // State and types
    // ========================================================================

    fn translate_state_variable(&mut self, var: &VariableDeclaration) {
        // constants are inlined at their uses
        if var.is_constant {
            return;
        }
        let name = names::map_decl_name(&var.name, var.id);
        let ty = self.ctx.map_type(&var.ty, &var.loc);
        let address = self.ctx.address_type();
        self.ctx
            .add_decl(Decl::variable(&name, Type::map(address.clone(), ty)));
        if let Some(length) = self.ctx.length_shadow_type(&var.ty, &var.loc) {
            self.ctx.add_decl(Decl::variable(
                names::length_name(&name),
                Type::map(address, length),
            ));
        }
    }

    /// A struct is an opaque reference type per data location, with one map per member.
    fn translate_struct(&mut self, def: &StructDefinition) {
        self.ctx
            .add_decl(Decl::comment("", format!("Struct: {}", def.name)));
        for location in [DataLocation::Storage, DataLocation::Memory] {
            self.ctx.add_decl(Decl::opaque_type(names::struct_type_name(
                &def.name, def.id, location,
            )));
        }
        let memory_type = Type::named(names::struct_type_name(&def.name, def.id, DataLocation::Memory));
        self.ctx.add_decl(Decl::variable(
            names::alloc_map_name(&def.name, def.id),
            Type::map(memory_type, Type::Bool),
        ));

        for member in &def.members {
            for location in [DataLocation::Storage, DataLocation::Memory] {
                let reference = Type::named(names::struct_type_name(&def.name, def.id, location));
                let member_type = relocated(&member.ty, location);
                let value = self.ctx.map_type(&member_type, &member.loc);
                let map = names::member_map_name(&member.name, member.id, location);
                self.ctx
                    .add_decl(Decl::variable(&map, Type::map(reference.clone(), value)));
                if let Some(length) = self.ctx.length_shadow_type(&member.ty, &member.loc) {
                    self.ctx.add_decl(Decl::variable(
                        names::length_name(&map),
                        Type::map(reference, length),
                    ));
                }
            }
        }
    }

    fn translate_enum(&mut self, def: &EnumDefinition) {
        let members = def.members.iter().map(|m| m.name.as_str()).join(", ");
        self.ctx.add_decl(Decl::comment(
            "",
            format!("Enum: {} {{{}}} mapped to {}", def.name, members, self.ctx.int_type(8)),
        ));
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn common_params(&self) -> Vec<Binding> {
        vec![
            Binding::new(names::THIS, self.ctx.address_type()),
            Binding::new(names::MSG_SENDER, self.ctx.address_type()),
            Binding::new(names::MSG_VALUE, self.ctx.balance_type()),
        ]
    }

    fn display_name(contract: &ContractDefinition, fun: &FunctionDefinition) -> String {
        let name = match fun.kind {
            FunctionKind::Constructor => "[constructor]",
            FunctionKind::Fallback if fun.name.is_empty() => "[fallback]",
            _ => fun.name.as_str(),
        };
        format!("{}::{}", contract.name, name)
    }

    fn translate_function(&mut self, contract: &ContractDefinition, fun: &FunctionDefinition) -> Result<()> {
        let name = names::procedure_name(&fun.name, fun.id, fun.kind, contract.id);
        debug!("translating function `{}` as `{}`", fun.name, name);
        let is_constructor = fun.kind == FunctionKind::Constructor;

        let mut params = self.common_params();
        for param in &fun.params {
            let param_name = names::map_decl_name(&param.name, param.id);
            let ty = self.ctx.map_type(&param.ty, &param.loc);
            params.push(Binding::new(&param_name, ty));
            if matches!(param.ty, SolType::Array { .. }) {
                params.push(Binding::new(
                    names::length_name(&param_name),
                    self.ctx.int_type(256),
                ));
            }
        }
        let mut returns = vec![];
        let mut return_vars = vec![];
        for ret in &fun.returns {
            let ret_name = names::map_decl_name(&ret.name, ret.id);
            let ty = self.ctx.map_type(&ret.ty, &ret.loc);
            returns.push(Binding::new(&ret_name, ty));
            if matches!(ret.ty, SolType::Array { .. }) {
                returns.push(Binding::new(
                    names::length_name(&ret_name),
                    self.ctx.int_type(256),
                ));
            }
            return_vars.push((Expr::id(ret_name), ret.ty.clone()));
        }

        let mut requires = vec![];
        let mut ensures = vec![];
        if is_constructor {
            ensures = self.invariant_specs(&fun.loc, "at end of function");
        } else if fun.visibility.is_public() {
            requires = self.invariant_specs(&fun.loc, "when entering function");
            requires.extend(self.invariant_tccs());
            ensures = self.invariant_specs(&fun.loc, "at end of function");
        }

        let mut attrs = names::loc_attrs(&fun.loc, Self::display_name(contract, fun));
        if !fun.visibility.is_public() && !is_constructor {
            attrs.push(Attr::inline(1));
        }

        let blocks = match &fun.body {
            Some(_) => {
                let mut st = StatementTranslator::new(self.ctx, return_vars.clone());
                for (var, ty) in &return_vars {
                    if let Some(default) = st.context().default_value(ty) {
                        st.push(Stmt::assign(var.clone(), default));
                    }
                    if let (SolType::Array { .. }, Some(length)) = (ty, length_shadow(var)) {
                        let zero = st.context().int_lit(0, 256);
                        st.push(Stmt::assign(length, zero));
                    }
                }
                if is_constructor {
                    initialize_state(&mut st, contract)?;
                }
                st.translate_function_body(fun)?;
                let (locals, body) = st.finish();
                let mut stmts = vec![];
                if fun.is_payable() {
                    stmts.push(self.credit_msg_value(&fun.loc));
                }
                if is_constructor {
                    stmts.extend(self.reset_sums());
                }
                stmts.extend(body);
                Some((locals, Block::new(stmts)))
            }
            None => None,
        };

        let (locals, blocks) = match blocks {
            Some((locals, block)) => (locals, vec![block]),
            None => (vec![], vec![]),
        };
        let procedure = Procedure {
            params,
            returns,
            locals,
            requires,
            ensures,
            blocks,
            ..Default::default()
        };
        self.ctx
            .add_decl(Decl::procedure(name, procedure).with_attrs(attrs));
        Ok(())
    }

    /// Contracts without a constructor still initialize their state on creation.
    fn translate_default_constructor(&mut self, contract: &ContractDefinition) -> Result<()> {
        let name = names::constructor_name(contract.id);
        debug!("synthesizing default constructor `{}`", name);
        let ensures = self.invariant_specs(&contract.loc, "at end of function");
        let attrs = names::loc_attrs(
            &contract.loc,
            format!("{}::[implicit_constructor]", contract.name),
        );

        let mut st = StatementTranslator::new(self.ctx, vec![]);
        initialize_state(&mut st, contract)?;
        let (locals, body) = st.finish();
        let mut stmts = self.reset_sums();
        stmts.extend(body);

        let procedure = Procedure {
            params: self.common_params(),
            locals,
            ensures,
            blocks: vec![Block::new(stmts)],
            ..Default::default()
        };
        self.ctx
            .add_decl(Decl::procedure(name, procedure).with_attrs(attrs));
        Ok(())
    }

    /// `__balance[__this] += __msg_value`
    fn credit_msg_value(&mut self, loc: &SourceLocation) -> Stmt {
        let this = self.ctx.this_expr();
        let balance = self.ctx.balance_of(this.clone());
        let credited = self
            .ctx
            .encode_binary(
                BinaryOperator::Add,
                balance,
                Expr::id(names::MSG_VALUE),
                256,
                false,
                loc,
            )
            .expr;
        Stmt::assign(
            Expr::id(names::BALANCE),
            Expr::update(Expr::id(names::BALANCE), this, credited),
        )
    }

    fn reset_sums(&mut self) -> Vec<Stmt> {
        let this = self.ctx.this_expr();
        let zero = self.ctx.int_lit(0, 256);
        self.ctx
            .sum_shadows()
            .into_iter()
            .map(|sum| {
                Stmt::assign(
                    Expr::id(&sum),
                    Expr::update(Expr::id(&sum), this.clone(), zero.clone()),
                )
            })
            .collect()
    }
}

/// `x[__this] := v` for a state variable map `x`
fn store(map: &str, this: ExprRef, value: ExprRef) -> Stmt {
    Stmt::assign(Expr::id(map), Expr::update(Expr::id(map), this, value))
}

/// Gives every state variable its initial value: the initializer when there is one, the
/// default of its type otherwise. Arrays start out empty.
fn initialize_state(st: &mut StatementTranslator, contract: &ContractDefinition) -> Result<()> {
    for var in contract.state_variables().filter(|var| !var.is_constant) {
        let name = names::map_decl_name(&var.name, var.id);
        let this = st.context().this_expr();
        match &var.value {
            Some(_) if matches!(var.ty, SolType::Struct { .. }) => st.context().report_unsupported(
                &var.loc,
                format!("Initializer of struct state variable '{}' is not supported", var.name),
            ),
            Some(init) => {
                let value = st.convert_as(init, &var.ty)?;
                st.push(store(&name, this.clone(), value));
            }
            None => {
                if let Some(default) = st.context().default_value(&var.ty) {
                    st.push(store(&name, this.clone(), default));
                }
            }
        }
        if matches!(var.ty, SolType::Array { .. }) {
            let zero = st.context().int_lit(0, 256);
            st.push(store(&names::length_name(&name), this, zero));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Encoding;
    use solidity_ast::{AstBuilder, SourceModel, StatementKind, Visibility};

    fn translate(model: &SourceModel, encoding: Encoding) -> (String, BoogieContext<'_>) {
        let mut ctx = BoogieContext::with_encoding(model, encoding, false);
        translate_model(&mut ctx, &EmbeddedDocTags).unwrap();
        (ctx.program().to_string(), ctx)
    }

    #[test]
    fn state_variables_are_maps_over_addresses() {
        let mut b = AstBuilder::new("A.sol");
        let x = b.state_var("x", SolType::uint(8));
        let arr = b.state_var("arr", SolType::array(SolType::Bool, DataLocation::Storage));
        let contract = b.contract(
            "A",
            vec![
                ContractNode::StateVariable(x.clone()),
                ContractNode::StateVariable(arr.clone()),
            ],
        );
        let unit = b.source_unit(vec![contract.clone()]);
        let model = SourceModel::new(vec![unit]);
        let (text, ctx) = translate(&model, Encoding::Bv);

        assert!(text.contains(&format!("var x#{}: [address_t]bv8;", x.id)));
        assert!(text.contains(&format!("var arr#{}: [address_t][bv256]bool;", arr.id)));
        assert!(text.contains(&format!("var arr#{}#length: [address_t]bv256;", arr.id)));
        assert!(text.contains("// ------- Contract: A -------"));

        // the implicit constructor initializes both
        let constructor = ctx
            .program()
            .find_decl(&names::constructor_name(contract.id))
            .unwrap()
            .to_string();
        assert!(constructor.contains(&format!("x#{0} := x#{0}[__this := 0bv8];", x.id)));
        assert!(constructor.contains(&format!(
            "arr#{0}#length := arr#{0}#length[__this := 0bv256];",
            arr.id
        )));
    }

    #[test]
    fn public_functions_check_invariants() {
        let mut b = AstBuilder::new("A.sol");
        let x = b.state_var("x", SolType::uint(8));
        let lhs = b.ident(&x);
        let zero = b.number(0);
        let positive = b.binary(BinaryOperator::Gte, lhs, zero);
        let body = b.block(vec![]);
        let f = b.function("f", vec![], vec![], body);
        let body = b.block(vec![]);
        let mut g = b.function("g", vec![], vec![], body);
        g.visibility = Visibility::Private;
        let mut contract = b.contract(
            "A",
            vec![
                ContractNode::StateVariable(x.clone()),
                ContractNode::Function(f.clone()),
                ContractNode::Function(g.clone()),
            ],
        );
        contract.invariants.push(DocTag {
            text: "x >= 0".to_string(),
            expr: Some(positive),
        });
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);
        let (_, ctx) = translate(&model, Encoding::Mod);

        let f_decl = ctx.program().find_decl(&format!("f#{}", f.id)).unwrap().to_string();
        assert!(f_decl.starts_with(&format!(
            "procedure {{:sourceloc \"A.sol\", 1, 1}} {{:message \"A::f\"}} f#{}(__this: address_t, __msg_sender: address_t, __msg_value: int)\n",
            f.id
        )));
        assert!(f_decl.contains(
            "{:message \"State variable invariant 'x >= 0' might not hold when entering function.\"}"
        ));
        assert!(f_decl.contains(
            "{:message \"State variable invariant 'x >= 0' might not hold at end of function.\"}"
        ));
        // range of the state variable is assumed on entry
        assert!(f_decl.contains(&format!("requires ((0 <= x#{0}[__this]) && (x#{0}[__this] < 256));", x.id)));

        let g_decl = ctx.program().find_decl(&format!("g#{}", g.id)).unwrap().to_string();
        assert!(g_decl.contains("{:inline 1}"));
        assert!(!g_decl.contains("requires"));
        assert!(!ctx.diagnostics().has_errors());
    }

    #[test]
    fn parameters_follow_common_prefix() {
        let mut b = AstBuilder::new("A.sol");
        let a = b.param("a", SolType::array(SolType::uint(256), DataLocation::Memory));
        let r = b.param("", SolType::Bool);
        let body = b.block(vec![]);
        let mut f = b.function("f", vec![a.clone()], vec![r.clone()], body);
        f.state_mutability = solidity_ast::StateMutability::Payable;
        let contract = b.contract("A", vec![ContractNode::Function(f.clone())]);
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);
        let (_, ctx) = translate(&model, Encoding::Int);

        let procedure = ctx
            .program()
            .find_decl(&format!("f#{}", f.id))
            .and_then(|decl| decl.as_procedure())
            .unwrap();
        let params: Vec<_> = procedure.params.iter().map(|p| p.name.clone()).collect();
        assert_eq!(
            params,
            vec![
                "__this".to_string(),
                "__msg_sender".to_string(),
                "__msg_value".to_string(),
                format!("a#{}", a.id),
                format!("a#{}#length", a.id),
            ]
        );
        assert_eq!(procedure.returns[0].name, format!("#{}", r.id));
        let stmts: Vec<String> = procedure.blocks[0].stmts.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            stmts[0],
            "__balance := __balance[__this := (__balance[__this] + __msg_value)];\n"
        );
        assert_eq!(stmts[1], format!("#{} := false;\n", r.id));
    }

    #[test]
    fn structs_declare_member_maps_per_location() {
        let mut b = AstBuilder::new("A.sol");
        let m = b.local_var("m", SolType::uint(8));
        let def = b.struct_def("S", vec![m.clone()]);
        let contract = b.contract("A", vec![ContractNode::Struct(def.clone())]);
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);
        let (text, _) = translate(&model, Encoding::Int);

        for expected in [
            format!("type struct_storage_S#{};", def.id),
            format!("type struct_memory_S#{};", def.id),
            format!("var alloc_S#{0}: [struct_memory_S#{0}]bool;", def.id),
            format!("var m#{0}#storage: [struct_storage_S#{1}]int;", m.id, def.id),
            format!("var m#{0}#memory: [struct_memory_S#{1}]int;", m.id, def.id),
        ] {
            assert!(text.contains(&expected), "missing `{}` in\n{}", expected, text);
        }
    }

    #[test]
    fn sums_are_declared_and_reset() {
        let mut b = AstBuilder::new("A.sol");
        let balances = b.state_var(
            "balances",
            SolType::mapping(SolType::address(), SolType::uint(256)),
        );
        let total = b.state_var("total", SolType::uint(256));
        let sum = b.builtin(names::VERIFIER_SUM);
        let collection = b.ident(&balances);
        let sum_call = b.call(sum, vec![collection], SolType::uint(256));
        let total_ref = b.ident(&total);
        let equal = b.binary(BinaryOperator::Eq, sum_call, total_ref);
        let body = b.block(vec![]);
        let constructor = b.constructor(vec![], body);
        let mut contract = b.contract(
            "A",
            vec![
                ContractNode::StateVariable(balances.clone()),
                ContractNode::StateVariable(total.clone()),
                ContractNode::Function(constructor),
            ],
        );
        contract.invariants.push(DocTag {
            text: "__verifier_sum(balances) == total".to_string(),
            expr: Some(equal),
        });
        let unit = b.source_unit(vec![contract.clone()]);
        let model = SourceModel::new(vec![unit]);
        let (text, ctx) = translate(&model, Encoding::Int);

        let sum_name = format!("balances#{}#sum", balances.id);
        assert_eq!(ctx.program().count_decls(&sum_name), 1);
        assert!(text.contains(&format!("var {}: [address_t]int;", sum_name)));
        let constructor = ctx
            .program()
            .find_decl(&names::constructor_name(contract.id))
            .unwrap()
            .to_string();
        assert!(constructor.contains(&format!("{0} := {0}[__this := 0];", sum_name)));
        assert!(constructor.contains("might not hold at end of function."));
    }

    #[test]
    fn unsupported_nodes_only_warn() {
        let mut b = AstBuilder::new("A.sol");
        let asm = b.stmt(StatementKind::InlineAssembly);
        let body = b.block(vec![asm]);
        let f = b.function("f", vec![], vec![], body);
        let contract = b.contract(
            "A",
            vec![
                ContractNode::Function(f),
                ContractNode::Unsupported(solidity_ast::UnsupportedNode {
                    id: 99,
                    loc: SourceLocation::default(),
                    kind: "ErrorDefinition".to_string(),
                }),
            ],
        );
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);
        let (_, ctx) = translate(&model, Encoding::Int);
        assert_eq!(ctx.diagnostics().warning_count(), 1);
        assert_eq!(
            ctx.diagnostics()
                .errors_of_kind(DiagnosticKind::UnsupportedConstruct)
                .count(),
            1
        );
    }
}
