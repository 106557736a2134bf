//! Type expression nodes

use serde::{Deserialize, Serialize};

use super::{Expr, FnDecl, Spanned};

/// Type expression as written in source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypeDecl {
    /// Primitive, struct, trait, enum or generic name: `int`, `Box[T]`
    Ident {
        name: String,
        generics: Vec<Spanned<TypeDecl>>,
    },
    /// `&T`
    Ref(Box<Spanned<TypeDecl>>),
    /// `*T`; `None` is the untyped `*unsafe` pointer
    Ptr(Option<Box<Spanned<TypeDecl>>>),
    /// `[]T`
    Slice(Box<Spanned<TypeDecl>>),
    /// `[N]T`; a missing size is the auto-sized form `[...]T`
    Array {
        elem: Box<Spanned<TypeDecl>>,
        size: Option<Box<Spanned<Expr>>>,
    },
    /// `[K:V]`
    Map {
        key: Box<Spanned<TypeDecl>>,
        val: Box<Spanned<TypeDecl>>,
    },
    /// `(T1, T2)`
    Tuple(Vec<Spanned<TypeDecl>>),
    /// Function type; represented by an anonymous declaration without body.
    Fn(Box<FnDecl>),
}

impl TypeDecl {
    /// Plain identifier type without generics.
    pub fn ident(name: impl Into<String>) -> Self {
        TypeDecl::Ident {
            name: name.into(),
            generics: Vec::new(),
        }
    }

    pub fn slice(elem: TypeDecl) -> Self {
        TypeDecl::Slice(Box::new(Spanned::synthetic(elem)))
    }

    pub fn reference(elem: TypeDecl) -> Self {
        TypeDecl::Ref(Box::new(Spanned::synthetic(elem)))
    }

    pub fn ptr(elem: TypeDecl) -> Self {
        TypeDecl::Ptr(Some(Box::new(Spanned::synthetic(elem))))
    }

    pub fn map(key: TypeDecl, val: TypeDecl) -> Self {
        TypeDecl::Map {
            key: Box::new(Spanned::synthetic(key)),
            val: Box::new(Spanned::synthetic(val)),
        }
    }
}
