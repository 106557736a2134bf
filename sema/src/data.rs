//! Evaluated expressions and their lowered model

use crate::ast::{BinOp, UnaryOp};
use crate::constant::Const;
use crate::decl::{EnumId, FieldIns, FnId};
use crate::types::TypeKind;

/// Result of evaluating one expression
#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    pub kind: TypeKind,
    pub model: ExprModel,
    /// Compile-time value, when known
    pub constant: Option<Const>,
    pub mutable: bool,
    /// Spread into a variadic parameter (`xs...`)
    pub variadiced: bool,
    pub lvalue: bool,
}

impl Data {
    /// Fresh, mutable, non-constant value.
    pub fn new(kind: TypeKind, model: ExprModel) -> Self {
        Self {
            kind,
            model,
            constant: None,
            mutable: true,
            variadiced: false,
            lvalue: false,
        }
    }

    pub fn constant(kind: TypeKind, value: Const) -> Self {
        Self {
            kind,
            model: ExprModel::Const(value.clone()),
            constant: Some(value),
            mutable: true,
            variadiced: false,
            lvalue: false,
        }
    }

    pub fn nil() -> Self {
        Self::new(TypeKind::Nil, ExprModel::Nil)
    }

    pub fn is_const(&self) -> bool {
        self.constant.is_some()
    }

    /// Members of a tuple value, one `Data` per element.
    ///
    /// Tuple expressions yield their own members; any other tuple-typed value
    /// (a multi-result call) yields one fresh value per element type sharing
    /// the producing model.
    pub fn unpack(&self) -> Vec<Data> {
        match (&self.model, &self.kind) {
            (ExprModel::Tuple(datas), _) => datas.clone(),
            (_, TypeKind::Tuple(types)) => types
                .iter()
                .map(|t| Data::new(t.clone(), self.model.clone()))
                .collect(),
            _ => vec![self.clone()],
        }
    }
}

/// Lowered form of an expression, consumed by code generation
#[derive(Debug, Clone, PartialEq)]
pub enum ExprModel {
    Const(Const),
    Nil,
    /// Local or global variable
    Var(String),
    /// Function value (instance index into its declaration)
    Fn { func: FnId, instance: usize },
    Call {
        func: Option<FnId>,
        instance: usize,
        receiver: Option<Box<ExprModel>>,
        args: Vec<ExprModel>,
    },
    /// Call through a function-typed value
    DynCall {
        callee: Box<ExprModel>,
        args: Vec<ExprModel>,
    },
    /// Call of a trait method on a trait value
    TraitCall {
        receiver: Box<ExprModel>,
        method: String,
        args: Vec<ExprModel>,
    },
    Slice(SliceExprModel),
    StructLit {
        ident: String,
        args: Vec<StructArgExprModel>,
    },
    Tuple(Vec<Data>),
    Unary {
        op: UnaryOp,
        expr: Box<ExprModel>,
    },
    Binary {
        left: Box<ExprModel>,
        op: BinOp,
        right: Box<ExprModel>,
    },
    /// Implicit `*expr` inserted by the analyzer
    ExplicitDeref(Box<ExprModel>),
    Indexing {
        expr: Box<ExprModel>,
        index: Box<ExprModel>,
    },
    Field {
        expr: Box<ExprModel>,
        field: String,
    },
    Cast {
        kind: String,
        expr: Box<ExprModel>,
    },
    EnumItem {
        decl: EnumId,
        item: String,
    },
}

/// Slice literal, also the synthetic sequence built for variadic arguments
#[derive(Debug, Clone, PartialEq)]
pub struct SliceExprModel {
    pub elem_kind: TypeKind,
    pub elems: Vec<ExprModel>,
}

/// One matched field of a struct literal
#[derive(Debug, Clone, PartialEq)]
pub struct StructArgExprModel {
    pub field: FieldIns,
    pub expr: ExprModel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimKind;

    #[test]
    fn test_unpack_tuple_expression() {
        let a = Data::constant(PrimKind::Int.into(), Const::I64(1));
        let b = Data::constant(PrimKind::Str.into(), Const::Str("x".into()));
        let tuple = Data::new(
            TypeKind::Tuple(vec![a.kind.clone(), b.kind.clone()]),
            ExprModel::Tuple(vec![a, b]),
        );
        let parts = tuple.unpack();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].constant, Some(Const::Str("x".into())));
    }

    #[test]
    fn test_unpack_call_result() {
        let call = Data::new(
            TypeKind::Tuple(vec![PrimKind::Int.into(), PrimKind::Bool.into()]),
            ExprModel::Var("pair".into()),
        );
        let parts = call.unpack();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].kind.to_str(), "bool");
        assert!(parts.iter().all(|d| d.mutable && !d.is_const()));
    }

    #[test]
    fn test_unpack_single() {
        let d = Data::nil();
        assert_eq!(d.unpack().len(), 1);
    }
}
