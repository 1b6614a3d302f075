//! Expression AST nodes

use super::{DeclId, Type};

/// Expression node. Every expression is fully typed once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub category: ValueCategory,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type, category: ValueCategory) -> Self {
        Self { kind, ty, category }
    }

    pub fn rvalue(kind: ExprKind, ty: Type) -> Self {
        Self::new(kind, ty, ValueCategory::RValue)
    }

    pub fn is_lvalue(&self) -> bool {
        self.category == ValueCategory::LValue
    }

    pub fn is_rvalue(&self) -> bool {
        self.category == ValueCategory::RValue
    }
}

/// Whether an expression denotes storage or a transient value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueCategory {
    LValue,
    RValue,
}

/// Expression kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Integer literal: 42
    IntLiteral(i64),

    /// Floating literal: 3.5
    FloatLiteral(f64),

    /// Boolean literal: true, false
    BoolLiteral(bool),

    /// Reference to a variable, parameter, field or enumerator
    DeclRef(DeclId),

    /// Binary operation: a + b, a = b, a && b
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Compiler-inserted conversion
    ImplicitCast {
        cast: CastKind,
        operand: Box<Expr>,
    },

    /// Load of the value stored in an lvalue
    LValueToRValue(Box<Expr>),

    /// Call of a resolved function
    Call {
        callee: DeclId,
        args: Vec<Expr>,
    },
}

/// What an implicit cast does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    IntegralWiden,
    FloatingWiden,
    PointerToVoid,
    /// Only qualifiers are added
    Qualification,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Assign,

    // Logical
    LogicAnd,
    LogicOr,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Assign => "=",
            BinaryOp::LogicAnd => "&&",
            BinaryOp::LogicOr => "||",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }

    /// Relational and equality operators, which always produce `bool`
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LogicAnd | BinaryOp::LogicOr)
    }
}
