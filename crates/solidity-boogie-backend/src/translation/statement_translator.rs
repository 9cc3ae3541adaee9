// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Statement translation from function and modifier bodies to Boogie statements
//!
//! Boogie needs all locals of a procedure declared upfront, so locals are collected while the
//! body is translated and returned next to the statements. Modifiers are inlined: the body of
//! each modifier is emitted in place, with its placeholder replaced by the next modifier, and
//! the function body innermost.

use super::{
    expression_translator::length_shadow, ConvertedExpression, ExpressionTranslator, SideEffects,
};
use crate::{
    context::BoogieContext,
    error::{Result, TranslationError},
    names,
};
use boogie_ast::{Block as BoogieBlock, Decl, Expr, ExprRef, Stmt};
use log::debug;
use solidity_ast::{
    Block, Expression, FunctionDefinition, SolType, SourceLocation, Statement, StatementKind,
    VariableDeclaration,
};

/// The function whose modifiers are being inlined and the modifier a placeholder continues with
#[derive(Clone, Copy)]
struct Inlining<'f> {
    function: &'f FunctionDefinition,
    level: usize,
}

pub struct StatementTranslator<'a, 'env> {
    ctx: &'a mut BoogieContext<'env>,
    locals: Vec<Decl>,
    stmts: Vec<Stmt>,
    /// Return variables of the function with their types
    returns: Vec<(ExprRef, SolType)>,
    return_label: String,
    next_label: usize,
}

impl<'a, 'env> StatementTranslator<'a, 'env> {
    pub fn new(ctx: &'a mut BoogieContext<'env>, returns: Vec<(ExprRef, SolType)>) -> Self {
        Self {
            ctx,
            locals: vec![],
            stmts: vec![],
            returns,
            return_label: names::return_label(0),
            next_label: 0,
        }
    }

    /// Statements emitted so far, and the locals they use
    pub fn finish(self) -> (Vec<Decl>, Vec<Stmt>) {
        (self.locals, self.stmts)
    }

    pub fn context(&mut self) -> &mut BoogieContext<'env> {
        self.ctx
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    /// Declares a local once. Names come from AST node ids, which repeat when a modifier
    /// inlines the function body more than once.
    pub fn declare_local(&mut self, decl: Decl) {
        if !self.locals.iter().any(|local| local.name == decl.name) {
            self.locals.push(decl);
        }
    }

    /// Translates the body of `function` with its modifiers inlined.
    pub fn translate_function_body(&mut self, function: &FunctionDefinition) -> Result<()> {
        let Some(body) = &function.body else {
            return Ok(());
        };
        if function.modifiers.is_empty() {
            let label = self.fresh_label();
            let outer = std::mem::replace(&mut self.return_label, label.clone());
            self.translate_block(body, None)?;
            self.stmts.push(Stmt::Label(label));
            self.return_label = outer;
            return Ok(());
        }
        self.inline_modifier(Inlining { function, level: 0 })
    }

    fn fresh_label(&mut self) -> String {
        let label = names::return_label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Emits the modifier at `inlining.level`, or the function body once all are inlined.
    fn inline_modifier(&mut self, inlining: Inlining) -> Result<()> {
        let function = inlining.function;
        let label = self.fresh_label();
        let outer = std::mem::replace(&mut self.return_label, label.clone());

        let Some(invocation) = function.modifiers.get(inlining.level) else {
            if let Some(body) = &function.body {
                self.stmts.push(Stmt::comment("Function body starts here"));
                self.translate_block(body, None)?;
                self.stmts.push(Stmt::Label(label));
                self.stmts.push(Stmt::comment("Function body ends here"));
            }
            self.return_label = outer;
            return Ok(());
        };

        let model = self.ctx.model();
        let Some(modifier) = invocation
            .referenced_declaration
            .and_then(|id| model.modifier(id))
        else {
            self.ctx
                .report_unsupported(&invocation.loc, "Unsupported modifier invocation");
            self.return_label = outer;
            return Ok(());
        };
        let duplicated = function.modifiers[..inlining.level]
            .iter()
            .any(|earlier| earlier.referenced_declaration == Some(modifier.id));
        if duplicated {
            self.ctx
                .report_unsupported(&function.loc, "Duplicated modifiers are not supported");
        }
        debug!("inlining modifier `{}` into `{}`", modifier.name, function.name);

        self.stmts.push(Stmt::comment(format!(
            "Inlined modifier {} starts here",
            modifier.name
        )));
        if modifier.params.len() != invocation.arguments.len() {
            return Err(TranslationError::invariant(
                &invocation.loc,
                format!(
                    "Modifier `{}` invoked with {} arguments, expected {}",
                    modifier.name,
                    invocation.arguments.len(),
                    modifier.params.len()
                ),
            ));
        }
        for (param, arg) in modifier.params.iter().zip(&invocation.arguments) {
            let name = names::map_decl_name(&param.name, param.id);
            let ty = self.ctx.map_type(&param.ty, &param.loc);
            self.declare_local(Decl::variable(&name, ty));
            let value = self.convert_as(arg, &param.ty)?;
            self.stmts.push(Stmt::assign(Expr::id(name), value));
        }
        self.translate_block(&modifier.body, Some(inlining))?;
        self.stmts.push(Stmt::Label(label));
        self.stmts.push(Stmt::comment(format!(
            "Inlined modifier {} ends here",
            modifier.name
        )));
        self.return_label = outer;
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Emits the side effects of a converted expression and returns its value.
    fn splice(&mut self, converted: ConvertedExpression) -> ExprRef {
        for constant in converted.constants {
            if self.ctx.program().find_decl(&constant.name).is_none() {
                self.ctx.add_decl(constant);
            }
        }
        for decl in converted.decls {
            self.declare_local(decl);
        }
        self.stmts.extend(converted.stmts);
        converted.expr
    }

    pub fn convert(&mut self, expr: &Expression) -> Result<ExprRef> {
        let converted = ExpressionTranslator::new(self.ctx).convert(expr)?;
        Ok(self.splice(converted))
    }

    pub fn convert_as(&mut self, expr: &Expression, ty: &SolType) -> Result<ExprRef> {
        let converted = ExpressionTranslator::new(self.ctx).convert_as(expr, ty)?;
        Ok(self.splice(converted))
    }

    /// Translates `f` into a separate list of statements, for nested blocks.
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<Vec<Stmt>> {
        let outer = std::mem::take(&mut self.stmts);
        let result = f(self);
        let inner = std::mem::replace(&mut self.stmts, outer);
        result.map(|()| inner)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn translate_block(&mut self, block: &Block, inlining: Option<Inlining>) -> Result<()> {
        for stmt in &block.statements {
            self.translate_statement(stmt, inlining)?;
        }
        Ok(())
    }

    fn translate_statement(&mut self, stmt: &Statement, inlining: Option<Inlining>) -> Result<()> {
        let loc = &stmt.loc;
        match &stmt.kind {
            StatementKind::Block(block) => self.translate_block(block, inlining)?,
            StatementKind::If {
                condition,
                true_body,
                false_body,
            } => {
                let cond = self.convert(condition)?;
                let then_stmts = self.nested(|t| t.translate_statement(true_body, inlining))?;
                match false_body {
                    Some(false_body) => {
                        let else_stmts =
                            self.nested(|t| t.translate_statement(false_body, inlining))?;
                        self.stmts.push(Stmt::if_else(
                            cond,
                            BoogieBlock::new(then_stmts),
                            BoogieBlock::new(else_stmts),
                        ));
                    }
                    None => self
                        .stmts
                        .push(Stmt::if_then(cond, BoogieBlock::new(then_stmts))),
                }
            }
            StatementKind::While { condition, body } => {
                self.translate_loop(condition, None, body, inlining)?
            }
            StatementKind::For {
                init,
                condition,
                loop_expression,
                body,
            } => {
                self.stmts.push(Stmt::comment(
                    "The following while loop was mapped from a for loop",
                ));
                if let Some(init) = init {
                    self.translate_statement(init, inlining)?;
                }
                match condition {
                    Some(condition) => {
                        self.translate_loop(condition, loop_expression.as_deref(), body, inlining)?
                    }
                    None => self.translate_endless_loop(loop_expression.as_deref(), body, inlining)?,
                }
            }
            StatementKind::Continue => {
                self.ctx
                    .report_unsupported(loc, "Continue statement is not supported");
            }
            StatementKind::Break => self.stmts.push(Stmt::Break),
            StatementKind::Return { expression } => self.translate_return(expression.as_ref(), loc)?,
            StatementKind::Throw => self.stmts.push(Stmt::assume(Expr::bool(false))),
            StatementKind::Emit { .. } => self.ctx.report_warning(loc, "Ignored emit statement"),
            StatementKind::VariableDeclaration {
                declarations,
                initial_value,
            } => self.translate_var_decl(declarations, initial_value.as_ref(), loc)?,
            StatementKind::Expression(expr) => self.translate_expression_stmt(stmt, expr)?,
            StatementKind::Placeholder => match inlining {
                Some(inlining) => self.inline_modifier(Inlining {
                    level: inlining.level + 1,
                    ..inlining
                })?,
                None => self
                    .ctx
                    .report_unsupported(loc, "Placeholder outside of a modifier"),
            },
            StatementKind::InlineAssembly => {
                self.ctx
                    .report_unsupported(loc, "Inline assembly is not supported")
            }
            StatementKind::Unsupported { kind } => {
                self.ctx
                    .report_warning(loc, format!("Ignored statement of kind {}", kind))
            }
        }
        Ok(())
    }

    /// `while (c) s`. The side effects of `c` are evaluated before the loop and again at the
    /// end of each iteration, after the loop expression of a `for`.
    fn translate_loop(
        &mut self,
        condition: &Expression,
        loop_expression: Option<&Statement>,
        body: &Statement,
        inlining: Option<Inlining>,
    ) -> Result<()> {
        let converted = ExpressionTranslator::new(self.ctx).convert(condition)?;
        let reevaluation = converted.stmts.clone();
        let cond = self.splice(converted);
        let body_stmts = self.nested(|t| {
            t.translate_statement(body, inlining)?;
            if let Some(step) = loop_expression {
                t.translate_statement(step, inlining)?;
            }
            t.stmts.extend(reevaluation);
            Ok(())
        })?;
        self.stmts.push(Stmt::While {
            cond,
            invariants: vec![],
            body: BoogieBlock::new(body_stmts),
        });
        Ok(())
    }

    fn translate_endless_loop(
        &mut self,
        loop_expression: Option<&Statement>,
        body: &Statement,
        inlining: Option<Inlining>,
    ) -> Result<()> {
        let body_stmts = self.nested(|t| {
            t.translate_statement(body, inlining)?;
            if let Some(step) = loop_expression {
                t.translate_statement(step, inlining)?;
            }
            Ok(())
        })?;
        self.stmts.push(Stmt::While {
            cond: Expr::bool(true),
            invariants: vec![],
            body: BoogieBlock::new(body_stmts),
        });
        Ok(())
    }

    fn translate_return(&mut self, expression: Option<&Expression>, loc: &SourceLocation) -> Result<()> {
        if let Some(expression) = expression {
            let returns = self.returns.clone();
            let value = match returns.as_slice() {
                [(_, ty)] => self.convert_as(expression, ty)?,
                _ => self.convert(expression)?,
            };
            let values = Expr::tuple_elements(&value);
            if values.len() != returns.len() {
                return Err(TranslationError::invariant(
                    loc,
                    format!(
                        "Returning {} values from a function with {} return values",
                        values.len(),
                        returns.len()
                    ),
                ));
            }
            let value_types = expression.ty.components();
            let mut lhs = vec![];
            let mut rhs = vec![];
            for (i, ((var, ty), value)) in returns.iter().zip(values).enumerate() {
                let value = match value_types.get(i) {
                    Some(from) if returns.len() > 1 => {
                        self.ctx.implicit_conversion(value, from, ty, loc)?
                    }
                    _ => value,
                };
                if let (SolType::Array { .. }, Some(length), Some(value_length)) =
                    (ty, length_shadow(var), length_shadow(&value))
                {
                    lhs.push(length);
                    rhs.push(value_length);
                }
                lhs.push(var.clone());
                rhs.push(value);
            }
            self.stmts.push(Stmt::assign_many(lhs, rhs));
        }
        self.stmts.push(Stmt::goto(self.return_label.clone()));
        Ok(())
    }

    /// Declares a local for a variable, with a length shadow for arrays.
    fn declare_variable(&mut self, var: &VariableDeclaration) -> String {
        let name = names::map_decl_name(&var.name, var.id);
        let ty = self.ctx.map_type(&var.ty, &var.loc);
        self.declare_local(Decl::variable(&name, ty));
        if matches!(var.ty, SolType::Array { .. }) {
            let length_type = self.ctx.int_type(256);
            self.declare_local(Decl::variable(names::length_name(&name), length_type));
        }
        name
    }

    fn translate_var_decl(
        &mut self,
        declarations: &[Option<VariableDeclaration>],
        initial_value: Option<&Expression>,
        loc: &SourceLocation,
    ) -> Result<()> {
        let targets: Vec<_> = declarations
            .iter()
            .map(|decl| decl.as_ref().map(|var| (var, self.declare_variable(var))))
            .collect();
        let Some(init) = initial_value else {
            for (var, name) in targets.into_iter().flatten() {
                if let Some(default) = self.ctx.default_value(&var.ty) {
                    self.stmts.push(Stmt::assign(Expr::id(&name), default));
                }
                if matches!(var.ty, SolType::Array { .. }) {
                    let zero = self.ctx.int_lit(0, 256);
                    self.stmts
                        .push(Stmt::assign(Expr::id(names::length_name(&name)), zero));
                }
            }
            return Ok(());
        };

        if let [Some((var, name))] = targets.as_slice() {
            let target = Expr::id(name);
            if matches!(var.ty, SolType::Struct { .. }) {
                let mut translator = ExpressionTranslator::new(self.ctx);
                let mut fx = SideEffects::default();
                let value = translator.lower(init, &mut fx)?.expr;
                translator.copy_struct(target, &var.ty, value, &init.ty, loc, &mut fx)?;
                self.splice(ConvertedExpression::new(Expr::tuple(vec![]), fx));
            } else {
                let value = self.convert_as(init, &var.ty)?;
                if let (SolType::Array { .. }, Some(value_length)) = (&var.ty, length_shadow(&value)) {
                    self.stmts
                        .push(Stmt::assign(Expr::id(names::length_name(name)), value_length));
                }
                self.stmts.push(Stmt::assign(target, value));
            }
            return Ok(());
        }

        // `(T a, , T b) = e`
        let value = self.convert(init)?;
        let values = Expr::tuple_elements(&value);
        if values.len() != targets.len() {
            return Err(TranslationError::invariant(
                loc,
                format!(
                    "Declaring {} variables from {} values",
                    targets.len(),
                    values.len()
                ),
            ));
        }
        let value_types = init.ty.components();
        let mut lhs = vec![];
        let mut rhs = vec![];
        for (i, (target, value)) in targets.into_iter().zip(values).enumerate() {
            let Some((var, name)) = target else { continue };
            let value = match value_types.get(i) {
                Some(from) => self.ctx.implicit_conversion(value, from, &var.ty, loc)?,
                None => value,
            };
            lhs.push(Expr::id(name));
            rhs.push(value);
        }
        if !lhs.is_empty() {
            self.stmts.push(Stmt::assign_many(lhs, rhs));
        }
        Ok(())
    }

    /// Expressions evaluated for their side effects only. Pure ones are still assigned to a
    /// temporary, so that checks on their evaluation apply.
    fn translate_expression_stmt(&mut self, stmt: &Statement, expr: &Expression) -> Result<()> {
        let converted = ExpressionTranslator::new(self.ctx).convert(expr)?;
        if converted.has_side_effects() {
            self.splice(converted);
            return Ok(());
        }
        let temp = format!("tmpVar#{}", stmt.id);
        let ty = self.ctx.map_type(&expr.ty, &expr.loc);
        self.declare_local(Decl::variable(&temp, ty));
        let value = self.splice(converted);
        self.stmts.push(Stmt::assign(Expr::id(temp), value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Encoding;
    use solidity_ast::{AstBuilder, BinaryOperator, ContractNode, SourceModel};

    fn render(stmts: &[Stmt]) -> Vec<String> {
        stmts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn require_lowers_to_single_assume() {
        let mut b = AstBuilder::new("A.sol");
        let x = b.param("x", SolType::uint(8));
        let mut body_stmts = vec![];
        for with_message in [false, true] {
            let lhs = b.ident(&x);
            let zero = b.number(0);
            let cond = b.binary(BinaryOperator::Gt, lhs, zero);
            let mut args = vec![cond];
            if with_message {
                args.push(b.string_lit("msg"));
            }
            let callee = b.builtin("require");
            let call = b.call(callee, args, SolType::tuple(vec![]));
            body_stmts.push(b.expr_stmt(call));
        }
        let body = b.block(body_stmts);
        let f = b.function("f", vec![x.clone()], vec![], body);
        let contract = b.contract("A", vec![ContractNode::Function(f.clone())]);
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);

        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let mut translator = StatementTranslator::new(&mut ctx, vec![]);
        translator.translate_function_body(&f).unwrap();
        let (locals, stmts) = translator.finish();
        let assume = format!("assume (x#{} > 0);\n", x.id);
        assert_eq!(render(&stmts), vec![assume.clone(), assume, "$return0:\n".to_string()]);
        assert!(locals.is_empty());
    }

    #[test]
    fn return_jumps_to_label() {
        let mut b = AstBuilder::new("A.sol");
        let r = b.param("r", SolType::Bool);
        let value = b.bool_lit(true);
        let ret = b.return_stmt(Some(value));
        let body = b.block(vec![ret]);
        let f = b.function("f", vec![], vec![r.clone()], body);
        let contract = b.contract("A", vec![ContractNode::Function(f.clone())]);
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);

        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let returns = vec![(Expr::id(format!("r#{}", r.id)), SolType::Bool)];
        let mut translator = StatementTranslator::new(&mut ctx, returns);
        translator.translate_function_body(&f).unwrap();
        let (_, stmts) = translator.finish();
        assert_eq!(
            render(&stmts),
            vec![
                format!("r#{} := true;\n", r.id),
                "goto $return0;\n".to_string(),
                "$return0:\n".to_string()
            ]
        );
    }

    #[test]
    fn modifiers_are_inlined_around_body() {
        let mut b = AstBuilder::new("A.sol");
        let placeholder = b.stmt(StatementKind::Placeholder);
        let modifier_body = b.block(vec![placeholder]);
        let modifier = b.modifier("onlyOwner", vec![], modifier_body);
        let throw = b.stmt(StatementKind::Throw);
        let body = b.block(vec![throw]);
        let mut f = b.function("f", vec![], vec![], body);
        let invocation = b.modifier_invocation(&modifier, vec![]);
        f.modifiers.push(invocation);
        let contract = b.contract(
            "A",
            vec![ContractNode::Modifier(modifier), ContractNode::Function(f.clone())],
        );
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);

        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let mut translator = StatementTranslator::new(&mut ctx, vec![]);
        translator.translate_function_body(&f).unwrap();
        let (_, stmts) = translator.finish();
        assert_eq!(
            render(&stmts),
            vec![
                "// Inlined modifier onlyOwner starts here\n",
                "// Function body starts here\n",
                "assume false;\n",
                "$return1:\n",
                "// Function body ends here\n",
                "$return0:\n",
                "// Inlined modifier onlyOwner ends here\n",
            ]
        );
    }

    #[test]
    fn body_inlined_twice_declares_its_temporaries_once() {
        let mut b = AstBuilder::new("A.sol");
        let first = b.stmt(StatementKind::Placeholder);
        let second = b.stmt(StatementKind::Placeholder);
        let modifier_body = b.block(vec![first, second]);
        let modifier = b.modifier("twice", vec![], modifier_body);
        let x = b.param("x", SolType::uint(8));
        let target = b.ident(&x);
        let increment = b.unary(solidity_ast::UnaryOperator::Inc, false, target);
        let read = b.ident(&x);
        let increment_stmt = b.expr_stmt(increment.clone());
        let read_stmt = b.expr_stmt(read);
        let body = b.block(vec![increment_stmt, read_stmt.clone()]);
        let mut f = b.function("f", vec![x.clone()], vec![], body);
        let invocation = b.modifier_invocation(&modifier, vec![]);
        f.modifiers.push(invocation);
        let contract = b.contract(
            "A",
            vec![ContractNode::Modifier(modifier), ContractNode::Function(f.clone())],
        );
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);

        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let mut translator = StatementTranslator::new(&mut ctx, vec![]);
        translator.translate_function_body(&f).unwrap();
        let (locals, stmts) = translator.finish();

        let names: Vec<&str> = locals.iter().map(|l| l.name.as_str()).collect();
        let inc = format!("inc#{}", increment.id);
        let tmp = format!("tmpVar#{}", read_stmt.id);
        assert_eq!(names, vec![inc.as_str(), tmp.as_str()]);
        let copies = render(&stmts)
            .iter()
            .filter(|s| s.starts_with(&format!("{} := ", inc)))
            .count();
        assert_eq!(copies, 2);
    }

    #[test]
    fn continue_is_unsupported() {
        let model = SourceModel::default();
        let mut b = AstBuilder::new("A.sol");
        let stmt = b.stmt(StatementKind::Continue);
        let body = b.block(vec![stmt]);
        let f = b.function("f", vec![], vec![], body);
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let mut translator = StatementTranslator::new(&mut ctx, vec![]);
        translator.translate_function_body(&f).unwrap();
        assert_eq!(ctx.diagnostics().error_count(), 1);
    }
}
