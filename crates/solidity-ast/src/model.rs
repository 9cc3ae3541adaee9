// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Declaration index over a set of source units.

use crate::ast::*;
use crate::types::SolType;
use crate::NodeId;
use log::debug;
use std::collections::BTreeMap;

/// Ids of built-in declarations, negative as in the compiler's global scope.
pub mod magic {
    use crate::NodeId;

    pub const ASSERT: NodeId = -1;
    pub const REQUIRE: NodeId = -2;
    pub const REVERT: NodeId = -3;
    pub const THIS: NodeId = -4;
    pub const NOW: NodeId = -5;
    pub const MSG: NodeId = -6;
    pub const BLOCK: NodeId = -7;
    pub const TX: NodeId = -8;

    /// Names of the built-in declarations, in id order.
    pub const NAMES: [(NodeId, &str); 8] = [
        (ASSERT, "assert"),
        (REQUIRE, "require"),
        (REVERT, "revert"),
        (THIS, "this"),
        (NOW, "now"),
        (MSG, "msg"),
        (BLOCK, "block"),
        (TX, "tx"),
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: ContractKind,
}

/// Signature of a function together with the contract declaring it
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: FunctionKind,
    pub visibility: Visibility,
    pub contract: ContractInfo,
    pub params: Vec<VariableDeclaration>,
    pub returns: Vec<VariableDeclaration>,
}

impl FunctionInfo {
    pub fn in_library(&self) -> bool {
        self.contract.kind == ContractKind::Library
    }
}

/// Anything a name can refer to
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Variable(VariableDeclaration),
    Function(FunctionInfo),
    Modifier(ModifierDefinition),
    Contract(ContractInfo),
    Struct(StructDefinition),
    Enum(EnumDefinition),
    EnumValue {
        id: NodeId,
        name: String,
        enum_id: NodeId,
        ordinal: usize,
    },
    Event(EventDefinition),
    Magic {
        id: NodeId,
        name: String,
    },
}

impl Declaration {
    pub fn id(&self) -> NodeId {
        match self {
            Declaration::Variable(var) => var.id,
            Declaration::Function(fun) => fun.id,
            Declaration::Modifier(modifier) => modifier.id,
            Declaration::Contract(contract) => contract.id,
            Declaration::Struct(def) => def.id,
            Declaration::Enum(def) => def.id,
            Declaration::EnumValue { id, .. } => *id,
            Declaration::Event(event) => event.id,
            Declaration::Magic { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Declaration::Variable(var) => &var.name,
            Declaration::Function(fun) => &fun.name,
            Declaration::Modifier(modifier) => &modifier.name,
            Declaration::Contract(contract) => &contract.name,
            Declaration::Struct(def) => &def.name,
            Declaration::Enum(def) => &def.name,
            Declaration::EnumValue { name, .. } => name,
            Declaration::Event(event) => &event.name,
            Declaration::Magic { name, .. } => name,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableDeclaration> {
        match self {
            Declaration::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionInfo> {
        match self {
            Declaration::Function(fun) => Some(fun),
            _ => None,
        }
    }
}

/// The source units of one translation run with all their declarations indexed by id
#[derive(Debug, Clone, Default)]
pub struct SourceModel {
    units: Vec<SourceUnit>,
    declarations: BTreeMap<NodeId, Declaration>,
}

impl SourceModel {
    pub fn new(units: Vec<SourceUnit>) -> Self {
        let mut model = Self {
            units: vec![],
            declarations: BTreeMap::new(),
        };
        for (id, name) in magic::NAMES {
            model.declarations.insert(
                id,
                Declaration::Magic {
                    id,
                    name: name.to_string(),
                },
            );
        }
        for unit in &units {
            model.index_unit(unit);
        }
        debug!(
            "indexed {} declarations in {} source units",
            model.declarations.len(),
            units.len()
        );
        model.units = units;
        model
    }

    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    pub fn declaration(&self, id: NodeId) -> Option<&Declaration> {
        self.declarations.get(&id)
    }

    pub fn variable(&self, id: NodeId) -> Option<&VariableDeclaration> {
        self.declaration(id).and_then(Declaration::as_variable)
    }

    pub fn function(&self, id: NodeId) -> Option<&FunctionInfo> {
        self.declaration(id).and_then(Declaration::as_function)
    }

    pub fn struct_definition(&self, id: NodeId) -> Option<&StructDefinition> {
        match self.declaration(id) {
            Some(Declaration::Struct(def)) => Some(def),
            _ => None,
        }
    }

    pub fn enum_definition(&self, id: NodeId) -> Option<&EnumDefinition> {
        match self.declaration(id) {
            Some(Declaration::Enum(def)) => Some(def),
            _ => None,
        }
    }

    pub fn modifier(&self, id: NodeId) -> Option<&ModifierDefinition> {
        match self.declaration(id) {
            Some(Declaration::Modifier(def)) => Some(def),
            _ => None,
        }
    }

    pub fn contract(&self, id: NodeId) -> Option<&ContractDefinition> {
        self.units.iter().flat_map(|unit| &unit.nodes).find_map(|node| match node {
            SourceUnitNode::Contract(contract) if contract.id == id => Some(contract),
            _ => None,
        })
    }

    /// Declaration a contract type refers to, if it is part of this model.
    pub fn contract_of_type(&self, ty: &SolType) -> Option<&ContractDefinition> {
        match ty {
            SolType::Contract { def, .. } => self.contract(*def),
            _ => None,
        }
    }

    fn insert(&mut self, decl: Declaration) {
        let id = decl.id();
        if let Some(previous) = self.declarations.insert(id, decl) {
            debug!("node id {} declared twice, replacing `{}`", id, previous.name());
        }
    }

    fn index_unit(&mut self, unit: &SourceUnit) {
        for node in &unit.nodes {
            if let SourceUnitNode::Contract(contract) = node {
                self.index_contract(contract);
            }
        }
    }

    fn index_contract(&mut self, contract: &ContractDefinition) {
        let info = ContractInfo {
            id: contract.id,
            name: contract.name.clone(),
            kind: contract.kind,
        };
        self.insert(Declaration::Contract(info.clone()));
        for node in &contract.nodes {
            match node {
                ContractNode::StateVariable(var) => self.insert(Declaration::Variable(var.clone())),
                ContractNode::Function(fun) => {
                    self.insert(Declaration::Function(FunctionInfo {
                        id: fun.id,
                        name: fun.name.clone(),
                        kind: fun.kind,
                        visibility: fun.visibility,
                        contract: info.clone(),
                        params: fun.params.clone(),
                        returns: fun.returns.clone(),
                    }));
                    self.index_variables(fun.params.iter().chain(&fun.returns));
                    if let Some(body) = &fun.body {
                        self.index_block(body);
                    }
                }
                ContractNode::Modifier(modifier) => {
                    self.insert(Declaration::Modifier(modifier.clone()));
                    self.index_variables(&modifier.params);
                    self.index_block(&modifier.body);
                }
                ContractNode::Struct(def) => {
                    self.insert(Declaration::Struct(def.clone()));
                    self.index_variables(&def.members);
                }
                ContractNode::Enum(def) => {
                    for (ordinal, value) in def.members.iter().enumerate() {
                        self.insert(Declaration::EnumValue {
                            id: value.id,
                            name: value.name.clone(),
                            enum_id: def.id,
                            ordinal,
                        });
                    }
                    self.insert(Declaration::Enum(def.clone()));
                }
                ContractNode::Event(event) => self.insert(Declaration::Event(event.clone())),
                ContractNode::UsingFor(_) | ContractNode::Unsupported(_) => {}
            }
        }
    }

    fn index_variables<'a>(&mut self, vars: impl IntoIterator<Item = &'a VariableDeclaration>) {
        for var in vars {
            self.insert(Declaration::Variable(var.clone()));
        }
    }

    fn index_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.index_statement(stmt);
        }
    }

    fn index_statement(&mut self, stmt: &Statement) {
        match &stmt.kind {
            StatementKind::Block(block) => self.index_block(block),
            StatementKind::If {
                true_body,
                false_body,
                ..
            } => {
                self.index_statement(true_body);
                if let Some(false_body) = false_body {
                    self.index_statement(false_body);
                }
            }
            StatementKind::While { body, .. } => self.index_statement(body),
            StatementKind::For {
                init,
                loop_expression,
                body,
                ..
            } => {
                for inner in [init, loop_expression].into_iter().flatten() {
                    self.index_statement(inner);
                }
                self.index_statement(body);
            }
            StatementKind::VariableDeclaration { declarations, .. } => {
                self.index_variables(declarations.iter().flatten())
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AstBuilder;
    use crate::types::SolType;

    #[test]
    fn indexes_nested_declarations() {
        let mut b = AstBuilder::new("A.sol");
        let x = b.state_var("x", SolType::uint(256));
        let local = b.local_var("tmp", SolType::Bool);
        let decl = b.var_decl_stmt(local.clone(), None);
        let body = b.block(vec![decl]);
        let f = b.function("f", vec![], vec![], body);
        let contract = b.contract(
            "A",
            vec![
                ContractNode::StateVariable(x.clone()),
                ContractNode::Function(f.clone()),
            ],
        );
        let unit = b.source_unit(vec![contract.clone()]);
        let model = SourceModel::new(vec![unit]);

        assert_eq!(model.variable(x.id).map(|v| v.name.as_str()), Some("x"));
        assert_eq!(model.variable(local.id).map(|v| v.name.as_str()), Some("tmp"));
        let info = model.function(f.id).expect("function indexed");
        assert_eq!(info.contract.name, "A");
        assert!(!info.in_library());
        assert_eq!(model.contract(contract.id).map(|c| c.name.as_str()), Some("A"));
        assert_eq!(model.declaration(magic::REQUIRE).map(Declaration::name), Some("require"));
    }
}
