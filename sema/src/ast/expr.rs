//! Expression AST nodes

use super::{Spanned, TypeDecl};
use serde::{Deserialize, Serialize};

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Literal value
    Lit(Lit),

    /// Identifier reference
    Ident(String),

    /// Unary operation
    Unary {
        op: UnaryOp,
        expr: Box<Spanned<Expr>>,
    },

    /// Binary operation
    Binary {
        left: Box<Spanned<Expr>>,
        op: BinOp,
        right: Box<Spanned<Expr>>,
    },

    /// Function call, optionally with explicit generics: `f[int](x)`
    Call {
        callee: Box<Spanned<Expr>>,
        generics: Vec<Spanned<TypeDecl>>,
        args: Vec<Spanned<Expr>>,
    },

    /// Selection of a field, method or enum item: `expr.ident`
    SubIdent {
        expr: Box<Spanned<Expr>>,
        ident: Spanned<String>,
    },

    /// Typed struct literal: `Point{1, y: 2}`
    StructLit {
        ty: Spanned<TypeDecl>,
        args: Vec<StructLitArg>,
    },

    /// Untyped brace literal; its type comes from the evaluation hint
    BraceLit(Vec<StructLitArg>),

    /// Slice (or array) literal: `[1, 2, 3]`
    SliceLit(Vec<Spanned<Expr>>),

    /// Tuple of expressions: `a, b`
    Tuple(Vec<Spanned<Expr>>),

    /// Spread of a slice into a variadic parameter: `xs...`
    Variadic(Box<Spanned<Expr>>),

    /// Indexing: `expr[index]`
    Indexing {
        expr: Box<Spanned<Expr>>,
        index: Box<Spanned<Expr>>,
    },

    /// Type conversion: `(T)(expr)`
    Cast {
        ty: Spanned<TypeDecl>,
        expr: Box<Spanned<Expr>>,
    },
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lit {
    Int(u64),
    Float(f64),
    Str(String),
    Rune(char),
    Bool(bool),
    Nil,
}

/// One argument of a struct or brace literal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StructLitArg {
    /// Matched by declared field order
    Positional(Spanned<Expr>),
    /// `field: value`
    Named {
        field: Spanned<String>,
        value: Spanned<Expr>,
    },
}

impl StructLitArg {
    pub fn is_named(&self) -> bool {
        matches!(self, StructLitArg::Named { .. })
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        };
        write!(f, "{s}")
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `&x`
    Ref,
    /// `*x`
    Deref,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Ref => "&",
            UnaryOp::Deref => "*",
        };
        write!(f, "{s}")
    }
}
