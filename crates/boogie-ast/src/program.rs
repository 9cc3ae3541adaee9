// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::decl::Decl;
use crate::writer::BoogieWriter;
use std::fmt;

/// A complete Boogie program: free-form prelude text followed by declarations.
///
/// Declarations are only ever appended; their order is the print order.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub prelude: String,
    decls: Vec<Decl>,
}

impl Program {
    pub fn new(prelude: impl Into<String>) -> Self {
        Self {
            prelude: prelude.into(),
            decls: vec![],
        }
    }

    pub fn add_decl(&mut self, decl: Decl) {
        self.decls.push(decl);
    }

    pub fn add_decls(&mut self, decls: impl IntoIterator<Item = Decl>) {
        self.decls.extend(decls);
    }

    pub fn decls(&self) -> &[Decl] {
        &self.decls
    }

    /// Finds the first declaration with the given name.
    pub fn find_decl(&self, name: &str) -> Option<&Decl> {
        self.decls.iter().find(|decl| decl.name == name)
    }

    pub fn count_decls(&self, name: &str) -> usize {
        self.decls.iter().filter(|decl| decl.name == name).count()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prelude = self.prelude.trim_end();
        if !prelude.is_empty() {
            writeln!(f, "{}", prelude)?;
            if !self.decls.is_empty() {
                writeln!(f)?;
            }
        }
        for (i, decl) in self.decls.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let mut writer = BoogieWriter::new();
            writer.decl(decl);
            write!(f, "{}", writer.into_string())?;
        }
        Ok(())
    }
}
