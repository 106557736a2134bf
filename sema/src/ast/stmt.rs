//! Statement AST nodes

use super::{Expr, Span, Spanned, VarDecl};
use serde::{Deserialize, Serialize};

/// Statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// Local variable declaration
    Var(VarDecl),
    /// Assignment to one or more existing locations: `a, b = f()`
    Assign {
        lefts: Vec<Spanned<Expr>>,
        right: Spanned<Expr>,
    },
    /// Expression evaluated for its effect
    Expr(Spanned<Expr>),
    /// `ret` with an optional value
    Ret(Option<Spanned<Expr>>),
    Iter(Iter),
    If(Conditional),
    Match(MatchCase),
    Block(Vec<Spanned<Stmt>>),
}

/// Iteration statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Iter {
    pub kind: IterKind,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IterKind {
    /// `for { ... }`
    Infinite,
    /// `for cond { ... }`
    While(Spanned<Expr>),
    /// `for a, b in expr { ... }`
    Range(RangeKind),
}

/// Range iteration header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeKind {
    /// Location of the `in` keyword
    pub in_span: Span,
    pub expr: Spanned<Expr>,
    /// First key (index or map key)
    pub key_a: Option<VarDecl>,
    /// Second key (element or map value)
    pub key_b: Option<VarDecl>,
}

/// `if` / `else if` / `else` chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conditional {
    pub head: If,
    pub tail: Vec<If>,
    pub default: Option<Vec<Spanned<Stmt>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct If {
    pub cond: Spanned<Expr>,
    pub body: Vec<Spanned<Stmt>>,
}

/// `match expr { case a, b: ... default: ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCase {
    pub expr: Spanned<Expr>,
    pub cases: Vec<Case>,
    pub default: Option<Vec<Spanned<Stmt>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub exprs: Vec<Spanned<Expr>>,
    pub body: Vec<Spanned<Stmt>>,
}
