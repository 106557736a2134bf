//! Return statement checking

use crate::ast::{Expr, Span, Spanned};
use crate::error::ErrorKind;
use crate::sema::Sema;
use crate::types::TypeKind;

impl Sema {
    /// Check `ret` (with an optional value) against the result of the
    /// function being checked.
    pub(crate) fn check_ret(&mut self, expr: Option<&Spanned<Expr>>, span: Span) -> bool {
        let Some(ctx) = self.current.clone() else {
            return false;
        };
        let types = ctx.ins.result_types();
        let hint = match types.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            many => Some(TypeKind::Tuple(many.to_vec())),
        };

        let values = match expr {
            None => Vec::new(),
            Some(e) => match self.eval_expr(e, hint.as_ref()) {
                Some(d) => d.unpack(),
                None => return false,
            },
        };
        let span = expr.map_or(span, |e| e.span);

        if values.is_empty() {
            if types.is_empty() || !ctx.result_idents.is_empty() {
                return true;
            }
            self.push_err(span, ErrorKind::RequireRetExpr);
            return false;
        }
        if types.is_empty() {
            self.push_err(span, ErrorKind::VoidFunctionRetExpr);
            return false;
        }

        let mut ok = true;
        if values.len() > types.len() {
            self.push_err(span, ErrorKind::OverflowRet);
            ok = false;
        } else if values.len() < types.len() {
            self.push_err(span, ErrorKind::MissingMultiRet);
            ok = false;
        }

        for (t, d) in types.iter().zip(&values) {
            if !d.mutable && self.arena.is_mut(&d.kind) {
                self.push_err(span, ErrorKind::RetWithMutTypedNonMut);
                return false;
            }
            ok = self.check_assign_type(t, d, span, false) && ok;
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Lit;
    use crate::decl::FnIns;
    use crate::sema::{FnCtx, Var};
    use crate::types::PrimKind;

    fn in_fn(sema: &mut Sema, result: Option<TypeKind>, result_idents: &[&str]) {
        sema.current = Some(FnCtx {
            ins: FnIns {
                result,
                ..FnIns::default()
            },
            result_idents: result_idents.iter().map(|s| s.to_string()).collect(),
        });
    }

    fn lit(l: Lit) -> Spanned<Expr> {
        Spanned::new(Expr::Lit(l), Span::new(4, 5))
    }

    fn tuple(exprs: Vec<Spanned<Expr>>) -> Spanned<Expr> {
        Spanned::new(Expr::Tuple(exprs), Span::new(4, 9))
    }

    fn pair() -> TypeKind {
        TypeKind::Tuple(vec![PrimKind::Int.into(), PrimKind::Str.into()])
    }

    #[test]
    fn test_tuple_result() {
        let mut sema = Sema::default();
        in_fn(&mut sema, Some(pair()), &[]);
        let value = tuple(vec![lit(Lit::Int(1)), lit(Lit::Str("a".into()))]);
        assert!(sema.check_ret(Some(&value), Span::default()));
        assert!(sema.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_value() {
        let mut sema = Sema::default();
        in_fn(&mut sema, Some(PrimKind::Int.into()), &[]);
        assert!(!sema.check_ret(None, Span::new(0, 3)));
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::RequireRetExpr]);
    }

    #[test]
    fn test_named_results_allow_bare_ret() {
        let mut sema = Sema::default();
        in_fn(&mut sema, Some(pair()), &["n", "s"]);
        assert!(sema.check_ret(None, Span::default()));
    }

    #[test]
    fn test_void_function() {
        let mut sema = Sema::default();
        in_fn(&mut sema, None, &[]);
        assert!(sema.check_ret(None, Span::default()));
        assert!(!sema.check_ret(Some(&lit(Lit::Int(1))), Span::default()));
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::VoidFunctionRetExpr]);
    }

    #[test]
    fn test_count_mismatch_still_checks_overlap() {
        let mut sema = Sema::default();
        in_fn(&mut sema, Some(pair()), &[]);
        assert!(!sema.check_ret(Some(&lit(Lit::Bool(true))), Span::default()));
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![ErrorKind::MissingMultiRet, ErrorKind::IncompatibleTypes]
        );

        let mut sema = Sema::default();
        in_fn(&mut sema, Some(PrimKind::Int.into()), &[]);
        let value = tuple(vec![lit(Lit::Int(1)), lit(Lit::Int(2))]);
        assert!(!sema.check_ret(Some(&value), Span::default()));
        assert_eq!(sema.diagnostics.kinds()[0], ErrorKind::OverflowRet);
    }

    #[test]
    fn test_immutable_mutable_typed_value() {
        let mut sema = Sema::default();
        let slice = TypeKind::slice(PrimKind::Int.into());
        in_fn(&mut sema, Some(slice.clone()), &[]);
        sema.push_scope();
        sema.add_var(Var::new("xs", Span::default(), slice));
        let value = Spanned::new(Expr::Ident("xs".into()), Span::new(4, 6));
        assert!(!sema.check_ret(Some(&value), Span::default()));
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::RetWithMutTypedNonMut]);
    }
}
