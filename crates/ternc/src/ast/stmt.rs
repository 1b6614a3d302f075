//! Statement AST nodes

use super::{DeclId, Expr};

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Compound statement (block): { ... }
    Compound(CompoundStmt),

    /// Declaration statement: let vi32 x = 1;
    Decl(DeclId),

    /// Expression statement: expr;
    Expr(Expr),

    /// Return statement: return [expr];
    Return(Option<Expr>),
}

/// Block (compound statement)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundStmt {
    pub stmts: Vec<Stmt>,
}

impl CompoundStmt {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}
