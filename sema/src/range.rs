//! Range iteration checking

use crate::ast::{self, RangeKind, Span, VarDecl};
use crate::data::{Data, ExprModel};
use crate::error::ErrorKind;
use crate::sema::{Sema, Var};
use crate::types::{PrimKind, TypeKind};

/// Checked range header: the iterated value and its key variables.
///
/// Keys bound to the ignore identifier, or omitted, are `None`.
#[derive(Debug)]
pub(crate) struct RangeIter {
    pub expr: Data,
    pub key_a: Option<Var>,
    pub key_b: Option<Var>,
}

impl Sema {
    pub(crate) fn check_range(&mut self, range: &RangeKind) -> Option<RangeIter> {
        let mut d = self.eval_expr(&range.expr, None)?;
        if let TypeKind::Ref(elem) = &d.kind {
            let elem = elem.as_ref().clone();
            d.model = ExprModel::ExplicitDeref(Box::new(d.model));
            d.kind = elem;
        }

        let (a, b) = match &d.kind {
            TypeKind::Slc(elem) | TypeKind::Arr { elem, .. } => (PrimKind::Int.into(), elem.as_ref().clone()),
            TypeKind::Map { key, val } => (key.as_ref().clone(), val.as_ref().clone()),
            TypeKind::Prim(PrimKind::Str) => (PrimKind::Int.into(), PrimKind::U8.into()),
            _ => {
                self.push_err(range.in_span, ErrorKind::IterRangeRequireEnumerableExpr);
                return None;
            }
        };

        let key_a = self.range_key(range.key_a.as_ref(), a, &d, range.in_span);
        let key_b = self.range_key(range.key_b.as_ref(), b, &d, range.in_span);
        Some(RangeIter { expr: d, key_a, key_b })
    }

    fn range_key(&mut self, decl: Option<&VarDecl>, kind: TypeKind, d: &Data, span: Span) -> Option<Var> {
        let decl = decl?;
        if ast::is_ignore_ident(&decl.name.node) {
            return None;
        }
        let value = Data {
            kind: kind.clone(),
            constant: None,
            variadiced: false,
            ..d.clone()
        };
        self.check_validity_for_init_expr(decl.mutable, &kind, &value, span);

        let mut var = Var::new(decl.name.node.clone(), decl.name.span, kind);
        var.mutable = decl.mutable;
        Some(var)
    }
}
