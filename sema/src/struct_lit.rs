//! Struct literal checking

use crate::ast::{Expr, Span, Spanned, StructLitArg};
use crate::data::{Data, StructArgExprModel};
use crate::decl::{FieldIns, StructIns};
use crate::error::ErrorKind;
use crate::sema::Sema;

impl Sema {
    /// Bind the arguments of a struct literal to the fields of `ins`.
    ///
    /// Arguments are either all positional (declaration order) or all named.
    /// A positional literal that leaves fields without a value reports them
    /// in one diagnostic; named literals may omit fields.
    pub(crate) fn check_struct_lit(&mut self, ins: &StructIns, args: &[StructLitArg], span: Span) -> Vec<StructArgExprModel> {
        let fields = self.arena.fields_of(ins);
        let mut covered = vec![false; fields.len()];
        let mut models = Vec::with_capacity(args.len());
        let paired = args.first().is_some_and(StructLitArg::is_named);

        for (i, arg) in args.iter().enumerate() {
            match arg {
                StructLitArg::Named { field, value } => {
                    if !paired {
                        self.push_err(field.span, ErrorKind::ArgumentMustTargetToField);
                        continue;
                    }
                    let Some(idx) = fields.iter().position(|f| f.ident == field.node) else {
                        self.push_err_args(field.span, ErrorKind::IdentNotExist, vec![field.node.clone()]);
                        continue;
                    };
                    if covered[idx] {
                        self.push_err_args(field.span, ErrorKind::AlreadyHasExpr, vec![field.node.clone()]);
                        continue;
                    }
                    covered[idx] = true;
                    self.push_field_arg(&fields[idx], value, &mut models);
                }
                StructLitArg::Positional(value) => {
                    if paired {
                        self.push_err(value.span, ErrorKind::ArgumentMustTargetToField);
                        continue;
                    }
                    let Some(f) = fields.get(i) else {
                        self.push_err(value.span, ErrorKind::ArgumentOverflow);
                        continue;
                    };
                    covered[i] = true;
                    self.push_field_arg(f, value, &mut models);
                }
            }
        }

        let missing: Vec<&str> = fields
            .iter()
            .zip(&covered)
            .filter(|(_, c)| !**c)
            .map(|(f, _)| f.ident.as_str())
            .collect();
        if !paired && !args.is_empty() && !missing.is_empty() {
            self.push_err_args(span, ErrorKind::MissingExprFor, vec![missing.join(", ")]);
        }
        models
    }

    fn push_field_arg(&mut self, field: &FieldIns, value: &Spanned<Expr>, models: &mut Vec<StructArgExprModel>) {
        let Some(d) = self.eval_expr(value, Some(&field.kind)) else {
            return;
        };
        self.check_field_value(field, &d, value.span);
        models.push(StructArgExprModel {
            field: field.clone(),
            expr: d.model,
        });
    }

    fn check_field_value(&mut self, field: &FieldIns, d: &Data, span: Span) {
        self.check_validity_for_init_expr(field.mutable, &field.kind, d, span);
        self.check_assign_type(&field.kind, d, span, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Lit;
    use crate::decl::Field;
    use crate::types::{PrimKind, TypeKind};

    fn setup() -> (Sema, StructIns) {
        let mut sema = Sema::default();
        let id = sema.arena.add_struct("Pair", Span::default(), Vec::new());
        let field = |ident: &str, kind: TypeKind| Field {
            ident: ident.into(),
            span: Span::default(),
            mutable: false,
            kind,
        };
        sema.arena.strct_mut(id).fields = vec![field("a", PrimKind::Int.into()), field("b", PrimKind::Str.into())];
        let ins = sema.arena.strct(id).template();
        (sema, ins)
    }

    fn int(v: u64) -> Spanned<Expr> {
        Spanned::new(Expr::Lit(Lit::Int(v)), Span::new(1, 2))
    }

    fn text(s: &str) -> Spanned<Expr> {
        Spanned::new(Expr::Lit(Lit::Str(s.into())), Span::new(3, 4))
    }

    fn named(field: &str, value: Spanned<Expr>) -> StructLitArg {
        StructLitArg::Named {
            field: Spanned::new(field.into(), Span::new(0, 1)),
            value,
        }
    }

    #[test]
    fn test_named_fields() {
        let (mut sema, ins) = setup();
        let models = sema.check_struct_lit(&ins, &[named("b", text("x")), named("a", int(1))], Span::default());
        assert!(sema.diagnostics.is_empty());
        let order: Vec<&str> = models.iter().map(|m| m.field.ident.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_positional_fields() {
        let (mut sema, ins) = setup();
        let args = [StructLitArg::Positional(int(1)), StructLitArg::Positional(text("x"))];
        assert_eq!(sema.check_struct_lit(&ins, &args, Span::default()).len(), 2);
        assert!(sema.diagnostics.is_empty());
    }

    #[test]
    fn test_named_literal_may_omit_fields() {
        let (mut sema, ins) = setup();
        let models = sema.check_struct_lit(&ins, &[named("a", int(1))], Span::default());
        assert_eq!(models.len(), 1);
        assert!(sema.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_positional_field() {
        let (mut sema, ins) = setup();
        sema.check_struct_lit(&ins, &[StructLitArg::Positional(int(1))], Span::new(0, 9));
        let d = sema.diagnostics.find(ErrorKind::MissingExprFor).unwrap();
        assert_eq!(d.args, vec!["b".to_string()]);
        assert_eq!(d.span, Span::new(0, 9));
    }

    #[test]
    fn test_mixed_arguments() {
        let (mut sema, ins) = setup();
        sema.check_struct_lit(
            &ins,
            &[StructLitArg::Positional(int(1)), named("b", text("x"))],
            Span::default(),
        );
        assert!(sema.diagnostics.has(ErrorKind::ArgumentMustTargetToField));
    }

    #[test]
    fn test_duplicate_and_unknown_fields() {
        let (mut sema, ins) = setup();
        let args = [
            named("a", int(1)),
            named("a", int(2)),
            named("c", int(3)),
            named("b", text("x")),
        ];
        sema.check_struct_lit(&ins, &args, Span::default());
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![ErrorKind::AlreadyHasExpr, ErrorKind::IdentNotExist]
        );
    }

    #[test]
    fn test_positional_overflow_and_type() {
        let (mut sema, ins) = setup();
        let args = [
            StructLitArg::Positional(text("x")),
            StructLitArg::Positional(text("y")),
            StructLitArg::Positional(int(3)),
        ];
        sema.check_struct_lit(&ins, &args, Span::default());
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![ErrorKind::IncompatibleTypes, ErrorKind::ArgumentOverflow]
        );
    }

    #[test]
    fn test_every_surplus_argument_reported() {
        let (mut sema, ins) = setup();
        let args = [
            StructLitArg::Positional(int(1)),
            StructLitArg::Positional(text("x")),
            StructLitArg::Positional(int(3)),
            StructLitArg::Positional(int(4)),
        ];
        let models = sema.check_struct_lit(&ins, &args, Span::default());
        assert_eq!(models.len(), 2);
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![ErrorKind::ArgumentOverflow, ErrorKind::ArgumentOverflow]
        );
    }

    #[test]
    fn test_empty_literal_zero_initializes() {
        let (mut sema, ins) = setup();
        assert!(sema.check_struct_lit(&ins, &[], Span::default()).is_empty());
        assert!(sema.diagnostics.is_empty());
    }
}
