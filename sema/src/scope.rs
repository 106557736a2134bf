//! Statement and block checking

use crate::assign::Narrowing;
use crate::ast::{self, Conditional, Expr, IterKind, MatchCase, Spanned, Stmt, VarDecl};
use crate::data::Data;
use crate::error::ErrorKind;
use crate::sema::{Sema, Var, STACK_GROW_SIZE, STACK_RED_ZONE};
use crate::types::{PrimKind, TypeKind};

impl Sema {
    /// Check statements in the current scope.
    pub(crate) fn check_stmts(&mut self, stmts: &[Spanned<Stmt>]) {
        for stmt in stmts {
            stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.check_stmt(stmt));
        }
    }

    /// Check statements in a fresh scope.
    fn check_block(&mut self, stmts: &[Spanned<Stmt>]) {
        self.push_scope();
        self.check_stmts(stmts);
        self.pop_scope();
    }

    fn check_stmt(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::Var(decl) => {
                if let Some(var) = self.check_var_decl(decl) {
                    self.add_var(var);
                }
            }
            Stmt::Assign { lefts, right } => self.check_assign_stmt(lefts, right),
            Stmt::Expr(e) => {
                if !matches!(e.node, Expr::Call { .. }) {
                    self.push_err(e.span, ErrorKind::ExprNotFuncCall);
                    return;
                }
                self.eval_expr(e, None);
            }
            Stmt::Ret(e) => {
                self.check_ret(e.as_ref(), stmt.span);
            }
            Stmt::Iter(iter) => match &iter.kind {
                IterKind::Infinite => self.check_block(&iter.body),
                IterKind::While(cond) => {
                    self.check_bool_cond(cond, ErrorKind::IterWhileRequireBoolExpr);
                    self.check_block(&iter.body);
                }
                IterKind::Range(range) => {
                    self.push_scope();
                    if let Some(header) = self.check_range(range) {
                        for var in [header.key_a, header.key_b].into_iter().flatten() {
                            self.add_var(var);
                        }
                    }
                    self.check_stmts(&iter.body);
                    self.pop_scope();
                }
            },
            Stmt::If(cond) => self.check_conditional(cond),
            Stmt::Match(m) => self.check_match(m),
            Stmt::Block(stmts) => self.check_block(stmts),
        }
    }

    fn check_bool_cond(&mut self, cond: &Spanned<Expr>, kind: ErrorKind) {
        let bool_kind: TypeKind = PrimKind::Bool.into();
        let Some(d) = self.eval_expr(cond, Some(&bool_kind)) else {
            return;
        };
        if !d.kind.is_prim(PrimKind::Bool) {
            self.push_err(cond.span, kind);
        }
    }

    fn check_conditional(&mut self, cond: &Conditional) {
        for branch in std::iter::once(&cond.head).chain(&cond.tail) {
            self.check_bool_cond(&branch.cond, ErrorKind::IfRequireBoolExpr);
            self.check_block(&branch.body);
        }
        if let Some(default) = &cond.default {
            self.check_block(default);
        }
    }

    fn check_match(&mut self, m: &MatchCase) {
        let subject = self.eval_expr(&m.expr, None);
        for case in &m.cases {
            for e in &case.exprs {
                let Some(d) = self.eval_expr(e, subject.as_ref().map(|s| &s.kind)) else {
                    continue;
                };
                if let Some(s) = &subject {
                    if !self.check_validity(&d, e.span) {
                        continue;
                    }
                    if self.check_const(&s.kind, &d) != Narrowing::Fits {
                        self.check_type_compatibility(&s.kind, &d.kind, e.span, false);
                    }
                }
            }
            self.check_block(&case.body);
        }
        if let Some(default) = &m.default {
            self.check_block(default);
        }
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Check a variable declaration and build its variable. `None` when the
    /// declaration is unusable; the error is already reported.
    pub(crate) fn check_var_decl(&mut self, decl: &VarDecl) -> Option<Var> {
        let span = decl.name.span;
        if decl.constant && decl.value.is_none() {
            self.push_err(span, ErrorKind::ConstVarNotHaveExpr);
            return None;
        }

        let declared = match &decl.ty {
            Some(ty) => Some(self.resolve_type(ty)?),
            None => None,
        };

        let Some(value) = &decl.value else {
            let Some(kind) = declared else {
                self.push_err(span, ErrorKind::MissingAutotypeValue);
                return None;
            };
            let mut var = Var::new(decl.name.node.clone(), span, kind);
            var.mutable = decl.mutable;
            return Some(var);
        };

        let d = self.eval_expr(value, declared.as_ref())?;
        let kind = match declared {
            Some(kind) => {
                if !self.check_assign_type(&kind, &d, value.span, false) {
                    return None;
                }
                kind
            }
            None => self.autotype(&d, value.span)?,
        };
        self.check_validity_for_init_expr(decl.mutable, &kind, &d, value.span);

        let mut var = Var::new(decl.name.node.clone(), span, kind);
        var.mutable = decl.mutable;
        if decl.constant {
            if !d.is_const() {
                self.push_err(value.span, ErrorKind::ExprNotConst);
                return None;
            }
            var.constant = true;
            var.value = d.constant;
        }
        Some(var)
    }

    /// Type of an auto-typed declaration initialized from `d`.
    fn autotype(&mut self, d: &Data, span: ast::Span) -> Option<TypeKind> {
        if d.kind.is_nil() {
            self.push_err(span, ErrorKind::NilForAutotype);
            return None;
        }
        if d.kind.is_void() {
            self.push_err(span, ErrorKind::VoidForAutotype);
            return None;
        }
        if !self.check_validity(d, span) {
            return None;
        }
        if d.variadiced {
            let args = vec![d.kind.to_str(), format!("{}...", d.kind.to_str())];
            self.push_err_args(span, ErrorKind::IncompatibleTypes, args);
            return None;
        }
        Some(d.kind.clone())
    }

    // ------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------

    fn check_assign_stmt(&mut self, lefts: &[Spanned<Expr>], right: &Spanned<Expr>) {
        if let [left] = lefts {
            if is_ignore(left) {
                self.eval_expr(right, None);
                return;
            }
            let Some(l) = self.check_assign_dest(left) else {
                self.eval_expr(right, None);
                return;
            };
            let Some(r) = self.eval_expr(right, Some(&l.kind)) else {
                return;
            };
            if self.check_assign_type(&l.kind, &r, right.span, false) {
                self.check_validity_for_init_expr(l.mutable, &l.kind, &r, right.span);
            }
            return;
        }

        let Some(r) = self.eval_expr(right, None) else {
            return;
        };
        let values = r.unpack();
        if lefts.len() > values.len() {
            self.push_err(right.span, ErrorKind::OverflowMultiAssignIdents);
            return;
        }
        if lefts.len() < values.len() {
            self.push_err(right.span, ErrorKind::MissingMultiAssignIdents);
            return;
        }

        for (left, value) in lefts.iter().zip(&values) {
            if is_ignore(left) {
                continue;
            }
            let Some(l) = self.check_assign_dest(left) else {
                continue;
            };
            if self.check_assign_type(&l.kind, value, left.span, false) {
                self.check_validity_for_init_expr(l.mutable, &l.kind, value, left.span);
            }
        }
    }

    /// Evaluate an assignment destination and check that it can be written.
    fn check_assign_dest(&mut self, left: &Spanned<Expr>) -> Option<Data> {
        if let Expr::Ident(name) = &left.node {
            if self.find_var(name).is_some_and(|v| v.constant) {
                self.push_err(left.span, ErrorKind::AssignConst);
                return None;
            }
        }
        let l = self.eval_expr(left, None)?;
        if !l.lvalue {
            self.push_err(left.span, ErrorKind::AssignRequireLvalue);
            return None;
        }
        if !l.mutable {
            self.push_err(left.span, ErrorKind::AssignmentToNonMut);
            return None;
        }
        Some(l)
    }
}

fn is_ignore(e: &Spanned<Expr>) -> bool {
    matches!(&e.node, Expr::Ident(name) if ast::is_ignore_ident(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, If, Iter, Lit, Span, TypeDecl};

    fn sp<T>(node: T) -> Spanned<T> {
        Spanned::new(node, Span::new(0, 1))
    }

    fn int(v: u64) -> Spanned<Expr> {
        sp(Expr::Lit(Lit::Int(v)))
    }

    fn ident(name: &str) -> Spanned<Expr> {
        sp(Expr::Ident(name.into()))
    }

    fn var(name: &str, ty: Option<&str>, value: Option<Spanned<Expr>>) -> VarDecl {
        VarDecl {
            ty: ty.map(|t| sp(TypeDecl::ident(t))),
            value,
            ..VarDecl::named(name, Span::new(0, 1))
        }
    }

    fn check(stmts: Vec<Stmt>) -> Sema {
        let mut sema = Sema::default();
        sema.push_scope();
        let stmts: Vec<Spanned<Stmt>> = stmts.into_iter().map(sp).collect();
        sema.check_stmts(&stmts);
        sema
    }

    #[test]
    fn test_var_declarations() {
        let sema = check(vec![
            Stmt::Var(var("a", Some("u8"), Some(int(7)))),
            Stmt::Var(var("b", None, Some(int(7)))),
            Stmt::Var(var("c", Some("i8"), None)),
        ]);
        assert!(sema.diagnostics.is_empty());
        assert_eq!(sema.find_var("a").unwrap().kind.to_str(), "u8");
        assert_eq!(sema.find_var("b").unwrap().kind.to_str(), "int");
        assert_eq!(sema.find_var("c").unwrap().kind.to_str(), "i8");
    }

    #[test]
    fn test_var_declaration_errors() {
        let sema = check(vec![
            Stmt::Var(var("a", None, None)),
            Stmt::Var(var("b", None, Some(sp(Expr::Lit(Lit::Nil))))),
            Stmt::Var(var("c", Some("u8"), Some(int(256)))),
        ]);
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![
                ErrorKind::MissingAutotypeValue,
                ErrorKind::NilForAutotype,
                ErrorKind::OverflowLimits
            ]
        );
        assert!(sema.find_var("c").is_none());
    }

    #[test]
    fn test_constants() {
        let mut decl = var("k", None, Some(int(3)));
        decl.constant = true;
        let mut missing = var("m", Some("int"), None);
        missing.constant = true;
        let mut sema = check(vec![Stmt::Var(decl), Stmt::Var(missing)]);
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::ConstVarNotHaveExpr]);

        let k = sema.eval_expr(&ident("k"), None).unwrap();
        assert!(k.is_const());
        let assign = sp(Stmt::Assign {
            lefts: vec![ident("k")],
            right: int(4),
        });
        sema.check_stmts(std::slice::from_ref(&assign));
        assert!(sema.diagnostics.has(ErrorKind::AssignConst));
    }

    #[test]
    fn test_assignment_mutability() {
        let mut mutable = var("x", None, Some(int(1)));
        mutable.mutable = true;
        let sema = check(vec![
            Stmt::Var(mutable),
            Stmt::Var(var("y", None, Some(int(1)))),
            Stmt::Assign {
                lefts: vec![ident("x")],
                right: int(2),
            },
            Stmt::Assign {
                lefts: vec![ident("y")],
                right: int(2),
            },
            Stmt::Assign {
                lefts: vec![int(1)],
                right: int(2),
            },
            Stmt::Assign {
                lefts: vec![ident("_")],
                right: int(2),
            },
        ]);
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![ErrorKind::AssignmentToNonMut, ErrorKind::AssignRequireLvalue]
        );
    }

    #[test]
    fn test_multi_assign_counts() {
        let mut a = var("a", None, Some(int(1)));
        a.mutable = true;
        let pair = sp(Expr::Tuple(vec![int(1), int(2)]));
        let sema = check(vec![
            Stmt::Var(a),
            Stmt::Assign {
                lefts: vec![ident("a"), ident("_")],
                right: pair.clone(),
            },
            Stmt::Assign {
                lefts: vec![ident("a"), ident("a"), ident("a")],
                right: pair.clone(),
            },
        ]);
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::OverflowMultiAssignIdents]);
    }

    #[test]
    fn test_expression_statement_must_call() {
        let sema = check(vec![Stmt::Expr(int(1))]);
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::ExprNotFuncCall]);
    }

    #[test]
    fn test_conditions_require_bool() {
        let cond = sp(Expr::Binary {
            left: Box::new(int(1)),
            op: BinOp::Lt,
            right: Box::new(int(2)),
        });
        let sema = check(vec![
            Stmt::If(Conditional {
                head: If {
                    cond,
                    body: Vec::new(),
                },
                tail: vec![If {
                    cond: int(1),
                    body: Vec::new(),
                }],
                default: None,
            }),
            Stmt::Iter(Iter {
                kind: IterKind::While(int(0)),
                body: Vec::new(),
            }),
        ]);
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![ErrorKind::IfRequireBoolExpr, ErrorKind::IterWhileRequireBoolExpr]
        );
    }

    #[test]
    fn test_block_scoping() {
        let sema = check(vec![
            Stmt::Block(vec![sp(Stmt::Var(var("inner", None, Some(int(1)))))]),
            Stmt::Var(var("inner", None, Some(int(2)))),
        ]);
        assert!(sema.diagnostics.is_empty());
    }
}
