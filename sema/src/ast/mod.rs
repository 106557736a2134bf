//! Syntax tree consumed by semantic analysis
//!
//! The parser (an external collaborator) builds these nodes; analysis only
//! reads them.

mod expr;
mod span;
mod stmt;
mod types;

pub use expr::*;
pub use span::*;
pub use stmt::*;
pub use types::*;

use serde::{Deserialize, Serialize};

/// Identifier that discards a binding.
pub const IGNORE_IDENT: &str = "_";

/// Reports whether `ident` is the ignore identifier.
pub fn is_ignore_ident(ident: &str) -> bool {
    ident == IGNORE_IDENT
}

/// All declarations of one package
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Package {
    pub items: Vec<Item>,
}

/// Top-level item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Item {
    Fn(FnDecl),
    Struct(StructDecl),
    Trait(TraitDecl),
    Enum(EnumDecl),
    Impl(Impl),
    Var(VarDecl),
}

/// Function declaration; also the shape of function types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FnDecl {
    pub name: Spanned<String>,
    pub unsafety: bool,
    pub generics: Vec<Spanned<String>>,
    pub params: Vec<ParamDecl>,
    /// `None` for void functions
    pub result: Option<RetTypeDecl>,
    /// `None` for builtins, trait methods and function types
    pub body: Option<Vec<Spanned<Stmt>>>,
    pub span: Span,
}

impl FnDecl {
    pub fn is_void(&self) -> bool {
        self.result.is_none()
    }

    /// Reports whether the function declares named result variables.
    pub fn any_var(&self) -> bool {
        self.result.as_ref().is_some_and(|r| !r.idents.is_empty())
    }

    pub fn generic_names(&self) -> Vec<String> {
        self.generics.iter().map(|g| g.node.clone()).collect()
    }
}

/// Function parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: Spanned<String>,
    pub mutable: bool,
    pub variadic: bool,
    /// `None` for receiver parameters
    pub ty: Option<Spanned<TypeDecl>>,
}

impl ParamDecl {
    /// Reports whether this is the receiver parameter (`self` or `&self`).
    pub fn is_self(&self) -> bool {
        is_self_ident(&self.name.node)
    }

    /// Reports whether the receiver is taken by reference.
    pub fn is_ref(&self) -> bool {
        self.name.node.starts_with('&')
    }
}

/// Receiver naming convention shared by declarations and instances.
pub fn is_self_ident(ident: &str) -> bool {
    ident == "self" || ident == "&self"
}

/// Result type; `idents` is non-empty for named results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetTypeDecl {
    pub ty: Spanned<TypeDecl>,
    pub idents: Vec<Spanned<String>>,
}

/// Struct declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDecl {
    pub name: Spanned<String>,
    pub generics: Vec<Spanned<String>>,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

/// Struct field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: Spanned<String>,
    /// Interior mutability
    pub mutable: bool,
    pub ty: Spanned<TypeDecl>,
}

/// Trait declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitDecl {
    pub name: Spanned<String>,
    pub methods: Vec<FnDecl>,
    pub span: Span,
}

/// Enum declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: Spanned<String>,
    /// Underlying type; `None` means `int`
    pub ty: Option<Spanned<TypeDecl>>,
    pub items: Vec<EnumItemDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumItemDecl {
    pub name: Spanned<String>,
    /// `None` for auto-numbered items
    pub value: Option<Spanned<Expr>>,
}

/// `impl Trait for Struct { ... }` or `impl Struct { ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Impl {
    /// Implemented trait, if any
    pub base: Option<Spanned<String>>,
    pub dest: Spanned<String>,
    pub methods: Vec<FnDecl>,
}

/// Variable declaration (global, local or range key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Spanned<String>,
    pub mutable: bool,
    pub constant: bool,
    /// `None` for auto-typed declarations
    pub ty: Option<Spanned<TypeDecl>>,
    pub value: Option<Spanned<Expr>>,
}

impl VarDecl {
    /// Immutable, auto-typed declaration without initializer.
    pub fn named(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: Spanned::new(name.into(), span),
            mutable: false,
            constant: false,
            ty: None,
            value: None,
        }
    }
}
