//! Expression evaluation
//!
//! Every expression becomes a [`Data`]: its resolved type, its lowered model
//! and, when known, its constant value. Evaluation failures are reported
//! where they happen and surface as `None`; callers skip the checks that
//! depend on the value and keep going.

use tracing::{debug, trace};

use crate::assign::{narrow_const, Narrowing};
use crate::ast::{BinOp, Expr, Lit, Span, Spanned, StructLitArg, TypeDecl, UnaryOp};
use crate::call::CallArgChecker;
use crate::compat::TypeCompatibilityChecker;
use crate::constant::{Const, FoldError};
use crate::data::{Data, ExprModel, SliceExprModel};
use crate::decl::{EnumRef, FnId, StructIns};
use crate::error::ErrorKind;
use crate::sema::{Sema, Symbol, STACK_GROW_SIZE, STACK_RED_ZONE};
use crate::types::{prim, PrimKind, TypeKind};

impl Sema {
    /// Evaluate `expr`. `hint` is the type the context expects; it types
    /// untyped literals and brace literals.
    pub fn eval_expr(&mut self, expr: &Spanned<Expr>, hint: Option<&TypeKind>) -> Option<Data> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, hint))
    }

    fn eval_inner(&mut self, expr: &Spanned<Expr>, hint: Option<&TypeKind>) -> Option<Data> {
        let span = expr.span;
        match &expr.node {
            Expr::Lit(lit) => Some(self.eval_lit(lit, hint)),
            Expr::Ident(name) => self.eval_ident(name, span),
            Expr::Unary { op, expr } => self.eval_unary(*op, expr, hint, span),
            Expr::Binary { left, op, right } => self.eval_binary(left, *op, right, hint, span),
            Expr::Call { callee, generics, args } => self.eval_call(callee, generics, args, span),
            Expr::SubIdent { expr, ident } => self.eval_sub_ident(expr, ident),
            Expr::StructLit { ty, args } => {
                let kind = self.resolve_type(ty)?;
                let Some(ins) = kind.strct().cloned() else {
                    self.push_err(ty.span, ErrorKind::InvalidExpr);
                    return None;
                };
                Some(self.eval_struct_lit(ins, args, span))
            }
            Expr::BraceLit(args) => match hint {
                Some(TypeKind::Struct(ins)) => Some(self.eval_struct_lit(ins.clone(), args, span)),
                _ => {
                    self.push_err(span, ErrorKind::InvalidExpr);
                    None
                }
            },
            Expr::SliceLit(elems) => self.eval_slice_lit(elems, hint, span),
            Expr::Tuple(exprs) => self.eval_tuple(exprs, hint),
            Expr::Variadic(inner) => {
                let mut d = self.eval_expr(inner, hint.map(|h| TypeKind::slice(h.clone())).as_ref())?;
                if d.kind.slc().is_none() {
                    self.push_err_args(span, ErrorKind::VariadicWithNonVariadicable, vec![d.kind.to_str()]);
                    return None;
                }
                d.variadiced = true;
                Some(d)
            }
            Expr::Indexing { expr, index } => self.eval_indexing(expr, index, span),
            Expr::Cast { ty, expr } => self.eval_cast(ty, expr, span),
        }
    }

    // ------------------------------------------------------------------
    // Literals and identifiers
    // ------------------------------------------------------------------

    fn eval_lit(&self, lit: &Lit, hint: Option<&TypeKind>) -> Data {
        let hinted = |value: &Const, accept: fn(PrimKind) -> bool, default: PrimKind| {
            match hint.and_then(TypeKind::prim) {
                Some(p) if accept(p) && narrow_const(p, value, self.arch_bits()) == Narrowing::Fits => p,
                _ => default,
            }
        };
        match lit {
            Lit::Int(v) => {
                let value = Const::from_u64(*v);
                let kind = hinted(&value, PrimKind::is_num, PrimKind::Int);
                Data::constant(kind.into(), value)
            }
            Lit::Float(v) => {
                let value = Const::F64(*v);
                let kind = hinted(&value, PrimKind::is_float, PrimKind::F64);
                Data::constant(kind.into(), value)
            }
            Lit::Str(s) => Data::constant(PrimKind::Str.into(), Const::Str(s.clone())),
            Lit::Rune(c) => Data::constant(PrimKind::I32.into(), Const::I64(i64::from(u32::from(*c)))),
            Lit::Bool(b) => Data::constant(PrimKind::Bool.into(), Const::Bool(*b)),
            Lit::Nil => Data::nil(),
        }
    }

    fn eval_ident(&mut self, name: &str, span: Span) -> Option<Data> {
        if let Some(var) = self.find_var(name) {
            let mut d = Data::new(var.kind.clone(), ExprModel::Var(name.to_string()));
            d.mutable = var.mutable;
            d.lvalue = !var.constant;
            if var.constant {
                d.constant = var.value.clone();
            }
            return Some(d);
        }

        match self.lookup(name) {
            Some(Symbol::Fn(id)) => Some(self.fn_value(id)),
            Some(Symbol::Struct(_) | Symbol::Trait(_) | Symbol::Enum(_)) => {
                self.push_err(span, ErrorKind::InvalidExpr);
                None
            }
            _ => {
                self.push_err_args(span, ErrorKind::IdentNotExist, vec![name.to_string()]);
                None
            }
        }
    }

    /// Function used as a value. Builtin, method and generic function values
    /// are rejected later by the assignment validity check.
    fn fn_value(&mut self, id: FnId) -> Data {
        let f = self.arena.func(id);
        let ins = f.instance(None);
        let instance = if f.is_generic() || f.builtin {
            0
        } else {
            self.arena.func_mut(id).append_instance(ins.clone()).1
        };
        let mut d = Data::new(TypeKind::Fn(Box::new(ins)), ExprModel::Fn { func: id, instance });
        d.mutable = false;
        d
    }

    // ------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------

    fn eval_unary(&mut self, op: UnaryOp, operand: &Spanned<Expr>, hint: Option<&TypeKind>, span: Span) -> Option<Data> {
        let d = self.eval_expr(operand, hint)?;
        let model = ExprModel::Unary {
            op,
            expr: Box::new(d.model.clone()),
        };
        let not_for_type = |sema: &mut Self, kind: &TypeKind| {
            sema.push_err_args(span, ErrorKind::OperatorNotForType, vec![op.to_string(), kind.to_str()]);
            None
        };

        match op {
            UnaryOp::Neg => {
                if !d.kind.prim().is_some_and(PrimKind::is_num) {
                    return not_for_type(self, &d.kind);
                }
                let mut out = Data::new(d.kind.clone(), model);
                if let Some(c) = &d.constant {
                    match c.neg() {
                        Some(v) => out.constant = Some(v),
                        None => {
                            self.push_err(span, ErrorKind::OverflowLimits);
                            return None;
                        }
                    }
                }
                Some(out)
            }
            UnaryOp::Not => {
                if !d.kind.is_prim(PrimKind::Bool) {
                    return not_for_type(self, &d.kind);
                }
                let mut out = Data::new(d.kind.clone(), model);
                out.constant = d.constant.as_ref().and_then(Const::not);
                Some(out)
            }
            UnaryOp::Ref => {
                let invalid = match &d.kind {
                    TypeKind::Ref(_) => Some(ErrorKind::RefRefsRef),
                    TypeKind::Ptr(_) => Some(ErrorKind::RefRefsPtr),
                    TypeKind::Arr { .. } => Some(ErrorKind::RefRefsArray),
                    TypeKind::Enum(_) => Some(ErrorKind::RefRefsEnum),
                    _ => None,
                };
                if let Some(kind) = invalid {
                    self.push_err(span, kind);
                    return None;
                }
                if !d.lvalue {
                    self.push_err(span, ErrorKind::AssignRequireLvalue);
                    return None;
                }
                Some(Data::new(TypeKind::reference(d.kind), model))
            }
            UnaryOp::Deref => {
                let elem = match &d.kind {
                    TypeKind::Ref(elem) | TypeKind::Ptr(Some(elem)) => elem.as_ref().clone(),
                    kind => return not_for_type(self, kind),
                };
                let mut out = Data::new(elem, model);
                out.lvalue = true;
                Some(out)
            }
        }
    }

    fn eval_binary(
        &mut self,
        left: &Spanned<Expr>,
        op: BinOp,
        right: &Spanned<Expr>,
        hint: Option<&TypeKind>,
        span: Span,
    ) -> Option<Data> {
        let operand_hint = hint.filter(|h| h.prim().is_some_and(PrimKind::is_num));
        let l = self.eval_expr(left, operand_hint);
        let right_hint = match &l {
            Some(l) if !l.is_const() => Some(l.kind.clone()),
            _ => operand_hint.cloned(),
        };
        let r = self.eval_expr(right, right_hint.as_ref());
        let (l, r) = (l?, r?);

        let bool_kind: TypeKind = PrimKind::Bool.into();
        let model = ExprModel::Binary {
            left: Box::new(l.model.clone()),
            op,
            right: Box::new(r.model.clone()),
        };

        if matches!(op, BinOp::Eq | BinOp::Ne)
            && ((l.kind.is_nil() && r.kind.is_nil_compatible()) || (r.kind.is_nil() && l.kind.is_nil_compatible()))
        {
            return Some(Data::new(bool_kind, model));
        }

        let kind = self.binary_operand_kind(&l, &r, span)?;
        let not_for_type = |sema: &mut Self| {
            sema.push_err_args(span, ErrorKind::OperatorNotForType, vec![op.to_string(), kind.to_str()]);
            None
        };
        let p = kind.prim();
        let is_num = p.is_some_and(PrimKind::is_num);
        let is_str = p == Some(PrimKind::Str);

        match op {
            BinOp::And | BinOp::Or => {
                if p != Some(PrimKind::Bool) {
                    self.push_err(span, ErrorKind::LogicalNotBool);
                    return None;
                }
            }
            BinOp::Eq | BinOp::Ne => {
                if matches!(kind, TypeKind::Tuple(_) | TypeKind::Void) {
                    return not_for_type(self);
                }
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                if !is_num && !is_str {
                    return not_for_type(self);
                }
            }
            BinOp::Add => {
                if !is_num && !is_str {
                    return not_for_type(self);
                }
            }
            BinOp::Sub | BinOp::Mul | BinOp::Div => {
                if !is_num {
                    return not_for_type(self);
                }
            }
            BinOp::Mod => {
                if !p.is_some_and(PrimKind::is_int) {
                    self.push_err(span, ErrorKind::ModuloWithNotInt);
                    return None;
                }
            }
        }

        let result_kind = if op.is_comparison() || op.is_logical() {
            bool_kind
        } else {
            kind.clone()
        };
        let mut out = Data::new(result_kind, model);

        match (&l.constant, &r.constant) {
            (Some(a), Some(b)) => match a.fold(op, b) {
                Ok(v) => {
                    if let (Some(p), true) = (out.kind.prim(), v.is_num()) {
                        if narrow_const(p, &v, self.arch_bits()) == Narrowing::Overflow {
                            self.push_err(span, ErrorKind::OverflowLimits);
                            return None;
                        }
                    }
                    out.constant = Some(v);
                }
                Err(FoldError::DivideByZero) => {
                    self.push_err(span, ErrorKind::DivideByZero);
                    return None;
                }
                Err(FoldError::Overflow) => {
                    self.push_err(span, ErrorKind::OverflowLimits);
                    return None;
                }
                Err(FoldError::Unsupported) => return not_for_type(self),
            },
            (_, Some(b)) if matches!(op, BinOp::Div | BinOp::Mod) && b.as_f64() == Some(0.0) => {
                self.push_err(span, ErrorKind::DivideByZero);
                return None;
            }
            _ => {}
        }
        Some(out)
    }

    /// Common type of two operands; an untyped-looking constant adopts the
    /// other side's type when it narrows into it.
    fn binary_operand_kind(&mut self, l: &Data, r: &Data, span: Span) -> Option<TypeKind> {
        if l.kind.to_str() == r.kind.to_str() {
            return Some(l.kind.clone());
        }
        if let (Some(lp), Some(rp)) = (l.kind.prim(), r.kind.prim()) {
            let arch = self.arch_bits();
            if let Some(c) = l.constant.as_ref().filter(|_| lp.is_num() && rp.is_num()) {
                if narrow_const(rp, c, arch) == Narrowing::Fits {
                    return Some(r.kind.clone());
                }
            }
            if let Some(c) = r.constant.as_ref().filter(|_| lp.is_num() && rp.is_num()) {
                if narrow_const(lp, c, arch) == Narrowing::Fits {
                    return Some(l.kind.clone());
                }
            }
            if prim::types_are_compatible(lp, rp, arch) {
                return Some(l.kind.clone());
            }
            if prim::types_are_compatible(rp, lp, arch) {
                return Some(r.kind.clone());
            }
        } else {
            let mut checker = TypeCompatibilityChecker::new(&self.arena, self.arch_bits());
            if checker.check(&l.kind, &r.kind) {
                return Some(l.kind.clone());
            }
        }
        self.push_err_args(span, ErrorKind::IncompatibleTypes, vec![l.kind.to_str(), r.kind.to_str()]);
        None
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn eval_call(
        &mut self,
        callee: &Spanned<Expr>,
        generics: &[Spanned<TypeDecl>],
        args: &[Spanned<Expr>],
        span: Span,
    ) -> Option<Data> {
        match &callee.node {
            Expr::Ident(name) if self.find_var(name).is_none() => {
                if let Some(Symbol::Fn(id)) = self.lookup(name) {
                    return self.call_fn(id, None, None, generics, args, span);
                }
            }
            Expr::SubIdent { expr, ident } if !self.is_enum_path(expr) => {
                return self.eval_method_call(expr, ident, generics, args, span);
            }
            _ => {}
        }

        let callee = self.eval_expr(callee, None)?;
        self.call_value(callee, generics, args, span)
    }

    /// Call through a function-typed value.
    fn call_value(&mut self, callee: Data, generics: &[Spanned<TypeDecl>], args: &[Spanned<Expr>], span: Span) -> Option<Data> {
        let Some(ins) = callee.kind.fnc().cloned() else {
            self.push_err(span, ErrorKind::NotFunctionCall);
            return None;
        };
        if let Some(g) = generics.first() {
            self.push_err(g.span, ErrorKind::NotHasGenerics);
            return None;
        }
        let mut checker = CallArgChecker::new(self, span);
        if !checker.check(&ins, args) {
            return None;
        }
        let args = checker.arg_models;
        let model = ExprModel::DynCall {
            callee: Box::new(callee.model),
            args,
        };
        Some(Data::new(ins.result.clone().unwrap_or(TypeKind::Void), model))
    }

    fn eval_method_call(
        &mut self,
        base: &Spanned<Expr>,
        ident: &Spanned<String>,
        generics: &[Spanned<TypeDecl>],
        args: &[Spanned<Expr>],
        span: Span,
    ) -> Option<Data> {
        let recv = self.eval_expr(base, None)?;
        let owner = recv.kind.ref_elem().unwrap_or(&recv.kind).clone();

        match &owner {
            TypeKind::Struct(s) => {
                if let Some(fid) = self.arena.find_method(s.decl, &ident.node) {
                    return self.call_fn(fid, Some(s.clone()), Some(recv), generics, args, span);
                }
            }
            TypeKind::Trait(t) => {
                let Some(method) = self.arena.trt(t.decl).find_method(&ident.node).cloned() else {
                    self.push_err_args(ident.span, ErrorKind::ObjHaveNotIdent, vec![ident.node.clone()]);
                    return None;
                };
                let mut checker = CallArgChecker::new(self, span);
                if !checker.check(&method, args) {
                    return None;
                }
                let args = checker.arg_models;
                let model = ExprModel::TraitCall {
                    receiver: Box::new(recv.model),
                    method: ident.node.clone(),
                    args,
                };
                return Some(Data::new(method.result.clone().unwrap_or(TypeKind::Void), model));
            }
            _ => {}
        }

        // Field holding a function value
        let field = self.select_field(recv, ident)?;
        self.call_value(field, generics, args, span)
    }

    /// Instantiate `id` for this call site, bind its arguments and record
    /// the instance.
    fn call_fn(
        &mut self,
        id: FnId,
        owner: Option<StructIns>,
        receiver: Option<Data>,
        generics: &[Spanned<TypeDecl>],
        args: &[Spanned<Expr>],
        span: Span,
    ) -> Option<Data> {
        let f = self.arena.func(id);
        let names = f.generics.clone();
        let owner_generics = f.owner_generics.clone();
        let generic = f.is_generic();
        let mut ins = f.instance_force(owner.clone());
        if let Some(o) = &owner {
            ins.substitute(&owner_generics, &o.generics);
        }

        let mut infer = Vec::new();
        if !generics.is_empty() {
            let bound = self.explicit_generics(&names, generics, span)?;
            ins.generics = bound.clone();
            ins.substitute(&names, &bound);
        } else if !names.is_empty() {
            infer = names.clone();
        }

        let mut ok = true;
        let receiver_model = match (&receiver, ins.receiver().cloned()) {
            (Some(recv), Some(param)) => {
                if param.is_ref() && recv.kind.ref_elem().is_none() {
                    self.push_err(span, ErrorKind::RefMethodUsedWithNotRefInstance);
                    ok = false;
                } else if !self.check_type_compatibility(&param.kind, &recv.kind, span, true) {
                    ok = false;
                }
                Some(Box::new(recv.model.clone()))
            }
            _ => None,
        };

        let mut checker = CallArgChecker::new(self, span).with_inference(infer.clone());
        ok = checker.check(&ins, args) && ok;
        let bindings = checker.bindings();
        let arg_models = std::mem::take(&mut checker.arg_models);
        if !ok {
            return None;
        }
        if !infer.is_empty() {
            let bound = bindings?;
            ins.generics = bound.clone();
            ins.substitute(&infer, &bound);
        }

        let result = ins.result.clone().unwrap_or(TypeKind::Void);
        let instance = if ins.builtin {
            0
        } else {
            let (appended, idx) = self.arena.func_mut(id).append_instance(ins.clone());
            if appended && generic {
                debug!(func = %ins.ident, instance = idx, generics = ?ins.instance_key(), "new instance");
                self.enqueue_instance(id, idx);
            } else {
                trace!(func = %ins.ident, instance = idx, "instance reused");
            }
            idx
        };

        let model = ExprModel::Call {
            func: Some(id),
            instance,
            receiver: receiver_model,
            args: arg_models,
        };
        Some(Data::new(result, model))
    }

    fn explicit_generics(&mut self, names: &[String], generics: &[Spanned<TypeDecl>], span: Span) -> Option<Vec<TypeKind>> {
        if names.is_empty() {
            self.push_err(span, ErrorKind::NotHasGenerics);
            return None;
        }
        if generics.len() < names.len() {
            self.push_err(span, ErrorKind::MissingGenerics);
            return None;
        }
        if generics.len() > names.len() {
            self.push_err(span, ErrorKind::GenericsOverflow);
            return None;
        }
        let mut bound = Vec::with_capacity(generics.len());
        for g in generics {
            let kind = self.resolve_type(g)?;
            if kind.enm().is_some() {
                self.push_err(g.span, ErrorKind::EnumNotSupportsAsGeneric);
                return None;
            }
            bound.push(kind);
        }
        Some(bound)
    }

    // ------------------------------------------------------------------
    // Selection, indexing and casts
    // ------------------------------------------------------------------

    /// `Name.x` where `Name` is an enum and not shadowed by a variable.
    fn is_enum_path(&self, expr: &Spanned<Expr>) -> bool {
        match &expr.node {
            Expr::Ident(name) => self.find_var(name).is_none() && matches!(self.lookup(name), Some(Symbol::Enum(_))),
            _ => false,
        }
    }

    fn eval_sub_ident(&mut self, base: &Spanned<Expr>, ident: &Spanned<String>) -> Option<Data> {
        if let (Expr::Ident(name), true) = (&base.node, self.is_enum_path(base)) {
            let Some(Symbol::Enum(id)) = self.lookup(name) else {
                return None;
            };
            let e = self.arena.enm(id);
            let enum_ident = e.ident.clone();
            let item = e.find_item(&ident.node).map(|i| (i.ident.clone(), i.value.clone()));
            let Some((item, value)) = item else {
                self.push_err_args(ident.span, ErrorKind::EnumHaveNotField, vec![ident.node.clone()]);
                return None;
            };
            let kind = TypeKind::Enum(EnumRef {
                decl: id,
                ident: enum_ident,
            });
            let mut d = Data::new(kind, ExprModel::EnumItem { decl: id, item });
            d.constant = value;
            d.mutable = false;
            return Some(d);
        }

        let d = self.eval_expr(base, None)?;
        self.select_field(d, ident)
    }

    fn select_field(&mut self, d: Data, ident: &Spanned<String>) -> Option<Data> {
        let (kind, model) = match &d.kind {
            TypeKind::Ref(elem) => (elem.as_ref().clone(), ExprModel::ExplicitDeref(Box::new(d.model.clone()))),
            kind => (kind.clone(), d.model.clone()),
        };
        let through_ref = d.kind.ref_elem().is_some();

        match &kind {
            TypeKind::Struct(s) => {
                if let Some(field) = self.arena.fields_of(s).into_iter().find(|f| f.ident == ident.node) {
                    let mut out = Data::new(
                        field.kind.clone(),
                        ExprModel::Field {
                            expr: Box::new(model),
                            field: field.ident.clone(),
                        },
                    );
                    out.mutable = d.mutable || through_ref || field.mutable;
                    out.lvalue = d.lvalue || through_ref;
                    return Some(out);
                }
                if self.arena.find_method(s.decl, &ident.node).is_some() {
                    self.push_err(ident.span, ErrorKind::MethodNotInvoked);
                    return None;
                }
                self.push_err_args(ident.span, ErrorKind::ObjHaveNotIdent, vec![ident.node.clone()]);
                None
            }
            TypeKind::Trait(t) => {
                if self.arena.trt(t.decl).find_method(&ident.node).is_some() {
                    self.push_err(ident.span, ErrorKind::MethodNotInvoked);
                } else {
                    self.push_err_args(ident.span, ErrorKind::ObjHaveNotIdent, vec![ident.node.clone()]);
                }
                None
            }
            kind => {
                self.push_err_args(ident.span, ErrorKind::ObjNotSupportSubFields, vec![kind.to_str()]);
                None
            }
        }
    }

    fn eval_indexing(&mut self, base: &Spanned<Expr>, index: &Spanned<Expr>, span: Span) -> Option<Data> {
        let d = self.eval_expr(base, None)?;
        let (kind, base_model) = match &d.kind {
            TypeKind::Ref(elem) => (elem.as_ref().clone(), ExprModel::ExplicitDeref(Box::new(d.model.clone()))),
            kind => (kind.clone(), d.model.clone()),
        };

        let (elem, key, lvalue) = match &kind {
            TypeKind::Slc(elem) => (elem.as_ref().clone(), None, true),
            TypeKind::Arr { elem, .. } => (elem.as_ref().clone(), None, d.lvalue),
            TypeKind::Map { key, val } => (val.as_ref().clone(), Some(key.as_ref().clone()), true),
            TypeKind::Ptr(None) => {
                self.push_err(span, ErrorKind::UnsafePtrIndexing);
                return None;
            }
            TypeKind::Ptr(Some(elem)) => (elem.as_ref().clone(), None, true),
            TypeKind::Prim(PrimKind::Str) => (PrimKind::U8.into(), None, false),
            kind => {
                self.push_err_args(span, ErrorKind::NotSupportsIndexing, vec![kind.to_str()]);
                return None;
            }
        };

        let i = match &key {
            Some(key) => {
                let i = self.eval_expr(index, Some(key))?;
                self.check_assign_type(key, &i, index.span, false);
                i
            }
            None => {
                let int_kind: TypeKind = PrimKind::Int.into();
                let i = self.eval_expr(index, Some(&int_kind))?;
                if !i.kind.prim().is_some_and(PrimKind::is_int) {
                    let args = vec![int_kind.to_str(), i.kind.to_str()];
                    self.push_err_args(index.span, ErrorKind::IncompatibleTypes, args);
                    return None;
                }
                if let Some(v) = i.constant.as_ref().and_then(Const::as_i128) {
                    let past_end = kind.arr().is_some_and(|(_, n)| v >= n as i128);
                    if v < 0 || past_end {
                        self.push_err(index.span, ErrorKind::OverflowLimits);
                        return None;
                    }
                }
                i
            }
        };

        let mut out = Data::new(
            elem,
            ExprModel::Indexing {
                expr: Box::new(base_model),
                index: Box::new(i.model),
            },
        );
        out.mutable = d.mutable;
        out.lvalue = lvalue;
        Some(out)
    }

    fn eval_cast(&mut self, ty: &Spanned<TypeDecl>, expr: &Spanned<Expr>, span: Span) -> Option<Data> {
        let dest = self.resolve_type(ty)?;
        let d = self.eval_expr(expr, None)?;
        if !self.castable(&dest, &d.kind) {
            self.push_err_args(
                span,
                ErrorKind::TypeNotSupportsCastingTo,
                vec![d.kind.to_str(), dest.to_str()],
            );
            return None;
        }
        let model = ExprModel::Cast {
            kind: dest.to_str(),
            expr: Box::new(d.model),
        };
        let mut out = Data::new(dest, model);
        out.mutable = d.mutable;
        Some(out)
    }

    fn castable(&self, dest: &TypeKind, src: &TypeKind) -> bool {
        if dest.to_str() == src.to_str() || src.is_prim(PrimKind::Any) {
            return true;
        }
        let src_prim = src.prim();
        match dest {
            TypeKind::Prim(PrimKind::Any) => true,
            TypeKind::Prim(PrimKind::Str) => {
                src_prim.is_some_and(PrimKind::is_int)
                    || src.slc().is_some_and(|e| e.is_prim(PrimKind::U8) || e.is_prim(PrimKind::I32))
            }
            TypeKind::Prim(p) if p.is_num() => {
                src_prim.is_some_and(PrimKind::is_num)
                    || (*p == PrimKind::Uintptr && src.ptr().is_some())
                    || src.enm().is_some_and(|e| {
                        self.arena.enm(e.decl).kind.prim().is_some_and(PrimKind::is_num)
                    })
            }
            TypeKind::Slc(elem) if elem.is_prim(PrimKind::U8) || elem.is_prim(PrimKind::I32) => {
                src.is_prim(PrimKind::Str)
            }
            TypeKind::Ptr(_) => src.ptr().is_some() || src.is_prim(PrimKind::Uintptr),
            TypeKind::Enum(e) => {
                let under = &self.arena.enm(e.decl).kind;
                match (under.prim(), src_prim) {
                    (Some(u), Some(s)) => prim::types_are_compatible(u, s, self.arch_bits()) || (u.is_num() && s.is_num()),
                    _ => false,
                }
            }
            _ => TypeCompatibilityChecker::new(&self.arena, self.arch_bits()).check(dest, src),
        }
    }

    // ------------------------------------------------------------------
    // Composite literals
    // ------------------------------------------------------------------

    fn eval_struct_lit(&mut self, ins: StructIns, args: &[StructLitArg], span: Span) -> Data {
        let fields = self.check_struct_lit(&ins, args, span);
        let model = ExprModel::StructLit {
            ident: ins.to_str(),
            args: fields,
        };
        Data::new(TypeKind::Struct(ins), model)
    }

    fn eval_slice_lit(&mut self, elems: &[Spanned<Expr>], hint: Option<&TypeKind>, span: Span) -> Option<Data> {
        let (elem_kind, array_len) = match hint {
            Some(TypeKind::Slc(elem)) => (Some(elem.as_ref().clone()), None),
            Some(TypeKind::Arr { elem, n }) => (Some(elem.as_ref().clone()), Some(*n)),
            _ => (None, None),
        };
        if let Some(n) = array_len {
            if elems.len() > n {
                self.push_err(span, ErrorKind::ArgumentOverflow);
            }
        }

        let mut rest = elems;
        let mut models = Vec::with_capacity(elems.len());
        let elem_kind = match elem_kind {
            Some(kind) => kind,
            None => {
                let Some((first, tail)) = elems.split_first() else {
                    self.push_err(span, ErrorKind::InvalidExpr);
                    return None;
                };
                rest = tail;
                let d = self.eval_expr(first, None)?;
                if d.kind.is_nil() || d.kind.is_void() {
                    self.push_err(first.span, ErrorKind::InvalidExpr);
                    return None;
                }
                if !self.check_validity(&d, first.span) {
                    return None;
                }
                models.push(d.model);
                d.kind
            }
        };

        for e in rest {
            let Some(d) = self.eval_expr(e, Some(&elem_kind)) else {
                continue;
            };
            self.check_assign_type(&elem_kind, &d, e.span, false);
            models.push(d.model);
        }

        let kind = match array_len {
            Some(n) => TypeKind::array(elem_kind.clone(), n),
            None => TypeKind::slice(elem_kind.clone()),
        };
        Some(Data::new(kind, ExprModel::Slice(SliceExprModel { elem_kind, elems: models })))
    }

    fn eval_tuple(&mut self, exprs: &[Spanned<Expr>], hint: Option<&TypeKind>) -> Option<Data> {
        let hints = hint.and_then(TypeKind::tup);
        let mut datas = Vec::with_capacity(exprs.len());
        let mut ok = true;
        for (i, e) in exprs.iter().enumerate() {
            let h = hints.and_then(|h| h.get(i));
            match self.eval_expr(e, h) {
                Some(d) => datas.push(d),
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }
        let kind = TypeKind::Tuple(datas.iter().map(|d| d.kind.clone()).collect());
        Some(Data::new(kind, ExprModel::Tuple(datas)))
    }
}
