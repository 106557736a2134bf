//! Call argument binding

use crate::ast::{Expr, Span, Spanned};
use crate::data::{Data, ExprModel, SliceExprModel};
use crate::decl::{FnIns, ParamIns};
use crate::error::ErrorKind;
use crate::infer::{partial_bindings, AnnotateError, DynamicTypeAnnotation};
use crate::sema::Sema;
use crate::types::TypeKind;

/// Binds call arguments to the parameters of one function instance.
///
/// When inference is enabled, `names` are the callee's own generic
/// parameters and each argument may bind them; the bindings are read back
/// with [`bindings`](Self::bindings) once every argument was checked.
pub(crate) struct CallArgChecker<'a> {
    sema: &'a mut Sema,
    span: Span,
    names: Vec<String>,
    slots: Vec<Option<TypeKind>>,
    /// Lowered argument models, one per parameter (a variadic tail is one
    /// slice model).
    pub arg_models: Vec<ExprModel>,
}

impl<'a> CallArgChecker<'a> {
    pub fn new(sema: &'a mut Sema, span: Span) -> Self {
        Self {
            sema,
            span,
            names: Vec::new(),
            slots: Vec::new(),
            arg_models: Vec::new(),
        }
    }

    /// Infer `names` from the arguments.
    pub fn with_inference(mut self, names: Vec<String>) -> Self {
        self.slots = vec![None; names.len()];
        self.names = names;
        self
    }

    fn dynamic_annotation(&self) -> bool {
        !self.names.is_empty()
    }

    pub fn check(&mut self, ins: &FnIns, args: &[Spanned<Expr>]) -> bool {
        let params = ins.call_params();
        if !self.check_counts(params, args.len()) {
            return false;
        }
        let mut ok = self.check_args(params, args);
        if ok && self.dynamic_annotation() {
            ok = self.check_dynamic_type_annotation();
        }
        ok
    }

    /// Generic arguments inferred for every name, in order.
    pub fn bindings(&self) -> Option<Vec<TypeKind>> {
        self.slots.iter().cloned().collect()
    }

    fn check_counts(&mut self, params: &[ParamIns], n_args: usize) -> bool {
        let n = params.len();
        if n == n_args {
            return true;
        }

        let variadic = params.last().is_some_and(|p| p.variadic);
        let missing = if variadic {
            // The variadic tail may be empty; every other parameter is required.
            if n_args + 1 >= n {
                return true;
            }
            &params[n_args..n - 1]
        } else if n_args > n {
            self.sema.push_err(self.span, ErrorKind::ArgumentOverflow);
            return false;
        } else {
            &params[n_args..]
        };

        let idents: Vec<&str> = missing.iter().map(|p| p.ident.as_str()).collect();
        self.sema
            .push_err_args(self.span, ErrorKind::MissingExprFor, vec![idents.join(", ")]);
        false
    }

    fn check_args(&mut self, params: &[ParamIns], args: &[Spanned<Expr>]) -> bool {
        let mut ok = true;
        for (i, p) in params.iter().enumerate() {
            if p.variadic {
                ok = self.push_variadic(p, &args[i.min(args.len())..]) && ok;
                break;
            }
            let Some(arg) = args.get(i) else {
                return false;
            };
            ok = self.push(p, arg) && ok;
        }
        ok
    }

    /// Evaluation hint for a parameter; none while its type still names an
    /// unbound generic.
    fn hint(&self, kind: &TypeKind) -> Option<TypeKind> {
        if !self.dynamic_annotation() {
            return Some(kind.clone());
        }
        let kind = kind.substitute(&self.names, &partial_bindings(&self.names, &self.slots));
        (!kind.uses_generics(&self.names)).then_some(kind)
    }

    fn push(&mut self, p: &ParamIns, arg: &Spanned<Expr>) -> bool {
        let hint = self.hint(&p.kind);
        let Some(d) = self.sema.eval_expr(arg, hint.as_ref()) else {
            return false;
        };
        self.arg_models.push(d.model.clone());
        self.check_arg(p.mutable, &p.kind, &d, arg.span)
    }

    /// Fold the remaining arguments into one slice value, or forward a
    /// single spread argument as is.
    fn push_variadic(&mut self, p: &ParamIns, args: &[Spanned<Expr>]) -> bool {
        let mut ok = true;
        let more = args.len() > 1;
        let mut spread = false;
        let mut forwarded = None;
        let mut elems = Vec::with_capacity(args.len());

        for arg in args {
            let hint = self.hint(&p.kind);
            let Some(mut d) = self.sema.eval_expr(arg, hint.as_ref()) else {
                ok = false;
                continue;
            };
            if d.variadiced {
                spread = true;
                d.variadiced = false;
                forwarded = Some(d.model.clone());
                let slice = TypeKind::slice(p.kind.clone());
                ok = self.check_arg(p.mutable, &slice, &d, arg.span) && ok;
            } else {
                elems.push(d.model.clone());
                ok = self.check_arg(p.mutable, &p.kind, &d, arg.span) && ok;
            }
        }

        if spread && more {
            self.sema.push_err(self.span, ErrorKind::MoreArgsWithVariadiced);
            ok = false;
        }

        let model = match forwarded {
            Some(model) if !more => model,
            _ => {
                let elem_kind = p.kind.substitute(&self.names, &partial_bindings(&self.names, &self.slots));
                ExprModel::Slice(SliceExprModel { elem_kind, elems })
            }
        };
        self.arg_models.push(model);
        ok
    }

    fn check_arg(&mut self, mutable: bool, kind: &TypeKind, d: &Data, span: Span) -> bool {
        let mut kind = kind.clone();
        if self.dynamic_annotation() && kind.uses_generics(&self.names) {
            let result = DynamicTypeAnnotation::new(&self.names, &mut self.slots).annotate(&mut kind, &d.kind);
            match result {
                Ok(()) => {}
                Err(AnnotateError::EnumAsGeneric) => {
                    self.sema.push_err(span, ErrorKind::EnumNotSupportsAsGeneric);
                    return false;
                }
                Err(AnnotateError::Mismatch) => {
                    self.sema.push_err(span, ErrorKind::DynamicTypeAnnotationFailed);
                    return false;
                }
            }
            kind = kind.substitute(&self.names, &partial_bindings(&self.names, &self.slots));
        }

        self.sema.check_validity_for_init_expr(mutable, &kind, d, span);
        self.sema.check_assign_type(&kind, d, span, false)
    }

    fn check_dynamic_type_annotation(&mut self) -> bool {
        if self.slots.iter().any(Option::is_none) {
            self.sema.push_err(self.span, ErrorKind::DynamicTypeAnnotationFailed);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Lit;
    use crate::types::PrimKind;

    fn int() -> TypeKind {
        PrimKind::Int.into()
    }

    fn lit(v: u64) -> Spanned<Expr> {
        Spanned::new(Expr::Lit(Lit::Int(v)), Span::new(0, 1))
    }

    fn text(s: &str) -> Spanned<Expr> {
        Spanned::new(Expr::Lit(Lit::Str(s.into())), Span::new(0, 1))
    }

    fn variadic(ident: &str, kind: TypeKind) -> ParamIns {
        ParamIns {
            variadic: true,
            ..ParamIns::new(ident, kind)
        }
    }

    fn ins(params: Vec<ParamIns>) -> FnIns {
        FnIns {
            params,
            ..FnIns::default()
        }
    }

    #[test]
    fn test_missing_args_named_in_order() {
        let mut sema = Sema::default();
        let f = ins(vec![
            ParamIns::new("a", int()),
            ParamIns::new("b", int()),
            ParamIns::new("c", int()),
        ]);
        let mut checker = CallArgChecker::new(&mut sema, Span::default());
        assert!(!checker.check(&f, &[lit(1)]));
        let d = sema.diagnostics.find(ErrorKind::MissingExprFor).unwrap();
        assert_eq!(d.args, vec!["b, c".to_string()]);
    }

    #[test]
    fn test_overflow() {
        let mut sema = Sema::default();
        let f = ins(vec![ParamIns::new("a", int())]);
        assert!(!CallArgChecker::new(&mut sema, Span::default()).check(&f, &[lit(1), lit(2)]));
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::ArgumentOverflow]);
    }

    #[test]
    fn test_receiver_not_counted() {
        let mut sema = Sema::default();
        let f = ins(vec![ParamIns::new("self", int()), ParamIns::new("a", int())]);
        assert!(CallArgChecker::new(&mut sema, Span::default()).check(&f, &[lit(1)]));
    }

    #[test]
    fn test_variadic_folds_into_slice() {
        let mut sema = Sema::default();
        let f = ins(vec![variadic("xs", int())]);
        let mut checker = CallArgChecker::new(&mut sema, Span::default());
        assert!(checker.check(&f, &[lit(1), lit(2), lit(3)]));
        let [ExprModel::Slice(slice)] = checker.arg_models.as_slice() else {
            panic!("expected one slice model, got {:?}", checker.arg_models);
        };
        assert_eq!(slice.elem_kind.to_str(), "int");
        let values: Vec<&ExprModel> = slice.elems.iter().collect();
        assert_eq!(
            values,
            vec![
                &ExprModel::Const(crate::constant::Const::I64(1)),
                &ExprModel::Const(crate::constant::Const::I64(2)),
                &ExprModel::Const(crate::constant::Const::I64(3)),
            ]
        );
    }

    #[test]
    fn test_variadic_may_be_empty() {
        let mut sema = Sema::default();
        let f = ins(vec![ParamIns::new("sep", PrimKind::Str.into()), variadic("xs", int())]);
        let mut checker = CallArgChecker::new(&mut sema, Span::default());
        assert!(checker.check(&f, &[text(",")]));
        assert_eq!(checker.arg_models.len(), 2);
        assert!(sema.diagnostics.is_empty());
    }

    #[test]
    fn test_variadic_missing_required_params() {
        let mut sema = Sema::default();
        let f = ins(vec![
            ParamIns::new("a", int()),
            ParamIns::new("b", int()),
            variadic("xs", int()),
        ]);
        assert!(!CallArgChecker::new(&mut sema, Span::default()).check(&f, &[]));
        assert_eq!(sema.diagnostics.as_slice()[0].args, vec!["a, b".to_string()]);
    }

    #[test]
    fn test_variadic_element_mismatch_keeps_going() {
        let mut sema = Sema::default();
        let f = ins(vec![variadic("xs", int())]);
        assert!(!CallArgChecker::new(&mut sema, Span::default()).check(&f, &[text("a"), lit(1), text("b")]));
        assert_eq!(sema.diagnostics.count(ErrorKind::IncompatibleTypes), 2);
    }

    #[test]
    fn test_inference_binds_generics() {
        let mut sema = Sema::default();
        let t = TypeKind::Generic("T".into());
        let f = ins(vec![ParamIns::new("a", t.clone()), ParamIns::new("b", t)]);
        let mut checker = CallArgChecker::new(&mut sema, Span::default()).with_inference(vec!["T".into()]);
        assert!(checker.check(&f, &[lit(1), lit(2)]));
        let bound = checker.bindings().unwrap();
        assert_eq!(bound[0].to_str(), "int");
    }

    #[test]
    fn test_inference_conflict() {
        let mut sema = Sema::default();
        let t = TypeKind::Generic("T".into());
        let f = ins(vec![ParamIns::new("a", t.clone()), ParamIns::new("b", t)]);
        let mut checker = CallArgChecker::new(&mut sema, Span::default()).with_inference(vec!["T".into()]);
        assert!(!checker.check(&f, &[lit(1), text("x")]));
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::DynamicTypeAnnotationFailed]);
    }

    #[test]
    fn test_unbound_generic_fails_call() {
        let mut sema = Sema::default();
        let f = ins(vec![ParamIns::new("a", int())]);
        let mut checker = CallArgChecker::new(&mut sema, Span::default()).with_inference(vec!["T".into()]);
        assert!(!checker.check(&f, &[lit(1)]));
        assert!(checker.bindings().is_none());
        assert!(sema.diagnostics.has(ErrorKind::DynamicTypeAnnotationFailed));
    }
}
