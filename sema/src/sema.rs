//! Analysis session
//!
//! A `Sema` owns the declaration arena, the diagnostic log and the worklist
//! of generic instances whose bodies still need checking. `check_package`
//! runs the passes in order:
//!
//! 1. register every declaration name
//! 2. resolve struct fields, enums and traits
//! 3. attach `impl` blocks (methods and implemented traits)
//! 4. resolve function signatures into templates
//! 5. verify trait implementations
//! 6. check global variables
//! 7. check the bodies of non-generic functions
//! 8. drain the pending generic instances

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::ast::{self, Item, Package, Span};
use crate::config::SemaConfig;
use crate::constant::Const;
use crate::decl::{Arena, EnumId, EnumItem, FnId, FnIns, Param, ParamIns, StructId, TraitId, TraitRef};
use crate::error::{Diagnostic, Diagnostics, ErrorKind};
use crate::types::{PrimKind, TypeKind};

/// Upper bound on generic bodies checked in one session; guards against
/// instantiation cycles that keep producing new generic arguments.
const PENDING_LIMIT: usize = 10_000;

/// Stack headroom for recursive evaluation of deeply nested trees.
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024;
pub(crate) const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Name bound in the package scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Fn(FnId),
    Struct(StructId),
    Trait(TraitId),
    Enum(EnumId),
    /// Index into the global variables
    Var(usize),
}

/// Variable visible to expressions
#[derive(Debug, Clone)]
pub struct Var {
    pub ident: String,
    pub span: Span,
    pub mutable: bool,
    pub constant: bool,
    pub kind: TypeKind,
    pub value: Option<Const>,
}

impl Var {
    pub fn new(ident: impl Into<String>, span: Span, kind: TypeKind) -> Self {
        Self {
            ident: ident.into(),
            span,
            mutable: false,
            constant: false,
            kind,
            value: None,
        }
    }
}

#[derive(Debug, Default)]
struct Scope {
    vars: Vec<Var>,
}

/// Function whose body is being checked
#[derive(Debug, Clone)]
pub(crate) struct FnCtx {
    pub ins: FnIns,
    pub result_idents: Vec<String>,
}

/// Semantic analysis session
#[derive(Debug)]
pub struct Sema {
    pub arena: Arena,
    pub diagnostics: Diagnostics,
    config: SemaConfig,
    globals: HashMap<String, Symbol>,
    global_vars: Vec<Var>,
    scopes: Vec<Scope>,
    /// Generic names bound while checking an instance body
    pub(crate) generic_env: Vec<(String, TypeKind)>,
    /// Generic names that resolve to placeholders while resolving templates
    pub(crate) template_generics: Vec<String>,
    pending: VecDeque<(FnId, usize)>,
    pub(crate) current: Option<FnCtx>,
    reported: usize,
}

impl Default for Sema {
    fn default() -> Self {
        Self::new(SemaConfig::default())
    }
}

impl Sema {
    pub fn new(config: SemaConfig) -> Self {
        let mut sema = Self {
            arena: Arena::default(),
            diagnostics: Diagnostics::new(config.max_diagnostics),
            config,
            globals: HashMap::new(),
            global_vars: Vec::new(),
            scopes: Vec::new(),
            generic_env: Vec::new(),
            template_generics: Vec::new(),
            pending: VecDeque::new(),
            current: None,
            reported: 0,
        };
        sema.register_builtins();
        sema
    }

    pub fn config(&self) -> &SemaConfig {
        &self.config
    }

    pub fn arch_bits(&self) -> u32 {
        self.config.arch_bits
    }

    /// Total diagnostics reported, including ones dropped by the limit.
    pub fn error_count(&self) -> usize {
        self.reported
    }

    pub fn push_err(&mut self, span: Span, kind: ErrorKind) {
        self.push_err_args(span, kind, Vec::new());
    }

    pub fn push_err_args(&mut self, span: Span, kind: ErrorKind, args: Vec<String>) {
        self.reported += 1;
        self.diagnostics.push(Diagnostic::new(span, kind, args));
    }

    // ------------------------------------------------------------------
    // Symbols and scopes
    // ------------------------------------------------------------------

    pub fn lookup(&self, ident: &str) -> Option<Symbol> {
        self.globals.get(ident).copied()
    }

    pub fn fn_by_name(&self, ident: &str) -> Option<FnId> {
        match self.lookup(ident) {
            Some(Symbol::Fn(id)) => Some(id),
            _ => None,
        }
    }

    pub fn struct_by_name(&self, ident: &str) -> Option<StructId> {
        match self.lookup(ident) {
            Some(Symbol::Struct(id)) => Some(id),
            _ => None,
        }
    }

    pub fn global_var(&self, index: usize) -> &Var {
        &self.global_vars[index]
    }

    fn define_global(&mut self, ident: &str, span: Span, symbol: Symbol) -> bool {
        if self.globals.contains_key(ident) {
            self.push_err_args(span, ErrorKind::DuplicatedIdent, vec![ident.to_string()]);
            return false;
        }
        self.globals.insert(ident.to_string(), symbol);
        true
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Define a local variable in the innermost scope. The ignore identifier
    /// is never materialized.
    pub(crate) fn add_var(&mut self, var: Var) {
        if ast::is_ignore_ident(&var.ident) {
            return;
        }
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if scope.vars.iter().any(|v| v.ident == var.ident) {
            let (span, ident) = (var.span, var.ident.clone());
            self.push_err_args(span, ErrorKind::DuplicatedIdent, vec![ident]);
            return;
        }
        scope.vars.push(var);
    }

    /// Innermost local named `ident`, then globals.
    pub fn find_var(&self, ident: &str) -> Option<&Var> {
        let local = self
            .scopes
            .iter()
            .rev()
            .flat_map(|s| s.vars.iter().rev())
            .find(|v| v.ident == ident);
        local.or_else(|| match self.lookup(ident) {
            Some(Symbol::Var(i)) => self.global_vars.get(i),
            _ => None,
        })
    }

    // ------------------------------------------------------------------
    // Package checking
    // ------------------------------------------------------------------

    /// Analyze `pkg`. Returns `true` when no diagnostic was reported.
    pub fn check_package(&mut self, pkg: &Package) -> bool {
        let before = self.reported;
        self.register_decls(pkg);
        self.resolve_structs(pkg);
        self.resolve_enums(pkg);
        self.resolve_traits(pkg);
        self.apply_impls(pkg);
        self.resolve_signatures();
        self.check_trait_impls();
        self.check_globals(pkg);
        self.check_bodies();
        self.drain_pending();
        debug!(
            fns = self.arena.fns.len(),
            structs = self.arena.structs.len(),
            diagnostics = self.reported - before,
            "package checked"
        );
        self.reported == before
    }

    fn register_builtins(&mut self) {
        let builtins = [("out", PrimKind::Any), ("outln", PrimKind::Any), ("panic", PrimKind::Str)];
        for (ident, param) in builtins {
            let id = self.arena.add_fn(ident, Span::default());
            let f = self.arena.func_mut(id);
            f.builtin = true;
            f.params = vec![Param {
                ident: "v".into(),
                span: Span::default(),
                mutable: false,
                variadic: false,
                kind: param.into(),
            }];
            self.globals.insert(ident.to_string(), Symbol::Fn(id));
        }
    }

    fn register_decls(&mut self, pkg: &Package) {
        for item in &pkg.items {
            match item {
                Item::Fn(decl) => {
                    let id = FnId(self.arena.fns.len());
                    if !self.define_global(&decl.name.node, decl.name.span, Symbol::Fn(id)) {
                        continue;
                    }
                    self.arena.add_fn(decl.name.node.clone(), decl.name.span);
                    self.init_fn(id, decl);
                }
                Item::Struct(decl) => {
                    let id = StructId(self.arena.structs.len());
                    if self.define_global(&decl.name.node, decl.name.span, Symbol::Struct(id)) {
                        let generics = decl.generics.iter().map(|g| g.node.clone()).collect();
                        self.arena.add_struct(decl.name.node.clone(), decl.name.span, generics);
                    }
                }
                Item::Trait(decl) => {
                    let id = TraitId(self.arena.traits.len());
                    if self.define_global(&decl.name.node, decl.name.span, Symbol::Trait(id)) {
                        self.arena.add_trait(decl.name.node.clone(), decl.name.span);
                    }
                }
                Item::Enum(decl) => {
                    let id = EnumId(self.arena.enums.len());
                    if self.define_global(&decl.name.node, decl.name.span, Symbol::Enum(id)) {
                        self.arena
                            .add_enum(decl.name.node.clone(), decl.name.span, PrimKind::Int.into());
                    }
                }
                Item::Impl(_) | Item::Var(_) => {}
            }
        }
    }

    fn init_fn(&mut self, id: FnId, decl: &ast::FnDecl) {
        let f = self.arena.func_mut(id);
        f.unsafety = decl.unsafety;
        f.generics = decl.generic_names();
        f.result_idents = decl
            .result
            .iter()
            .flat_map(|r| r.idents.iter().map(|i| i.node.clone()))
            .collect();
        f.ast = Some(Rc::new(decl.clone()));
    }

    fn resolve_structs(&mut self, pkg: &Package) {
        for item in &pkg.items {
            let Item::Struct(decl) = item else { continue };
            let Some(id) = self.struct_by_name(&decl.name.node) else {
                continue;
            };
            if self.arena.strct(id).span != decl.name.span {
                continue; // duplicate declaration
            }

            self.template_generics = self.arena.strct(id).generics.clone();
            let mut fields: Vec<crate::decl::Field> = Vec::with_capacity(decl.fields.len());
            for field in &decl.fields {
                if fields.iter().any(|f| f.ident == field.name.node) {
                    self.push_err_args(
                        field.name.span,
                        ErrorKind::DuplicatedIdent,
                        vec![field.name.node.clone()],
                    );
                    continue;
                }
                let Some(kind) = self.resolve_type(&field.ty) else {
                    continue;
                };
                fields.push(crate::decl::Field {
                    ident: field.name.node.clone(),
                    span: field.name.span,
                    mutable: field.mutable,
                    kind,
                });
            }
            self.template_generics.clear();
            self.arena.strct_mut(id).fields = fields;
        }
    }

    fn resolve_enums(&mut self, pkg: &Package) {
        for item in &pkg.items {
            let Item::Enum(decl) = item else { continue };
            let Some(Symbol::Enum(id)) = self.lookup(&decl.name.node) else {
                continue;
            };
            if self.arena.enm(id).span != decl.name.span {
                continue;
            }

            let kind = match &decl.ty {
                Some(ty) => match self.resolve_type(ty) {
                    Some(kind) => kind,
                    None => continue,
                },
                None => PrimKind::Int.into(),
            };

            let mut items: Vec<EnumItem> = Vec::with_capacity(decl.items.len());
            let mut next: i128 = 0;
            for item in &decl.items {
                if items.iter().any(|i| i.ident == item.name.node) {
                    self.push_err_args(
                        item.name.span,
                        ErrorKind::DuplicatedIdent,
                        vec![item.name.node.clone()],
                    );
                    continue;
                }
                let value = match &item.value {
                    Some(expr) => {
                        let d = self.eval_expr(expr, Some(&kind));
                        match d {
                            Some(d) if d.is_const() => {
                                self.check_assign_type(&kind, &d, expr.span, false);
                                d.constant
                            }
                            Some(_) => {
                                self.push_err(expr.span, ErrorKind::ExprNotConst);
                                None
                            }
                            None => None,
                        }
                    }
                    None if kind.prim().is_some_and(PrimKind::is_int) => {
                        i64::try_from(next).ok().map(Const::I64)
                    }
                    None => None,
                };
                if let Some(v) = value.as_ref().and_then(Const::as_i128) {
                    next = v + 1;
                }
                items.push(EnumItem {
                    ident: item.name.node.clone(),
                    span: item.name.span,
                    value,
                });
            }

            let e = &mut self.arena.enums[id.0];
            e.kind = kind;
            e.items = items;
        }
    }

    fn resolve_traits(&mut self, pkg: &Package) {
        for item in &pkg.items {
            let Item::Trait(decl) = item else { continue };
            let Some(Symbol::Trait(id)) = self.lookup(&decl.name.node) else {
                continue;
            };
            if self.arena.trt(id).span != decl.name.span {
                continue;
            }

            let this = TypeKind::Trait(TraitRef {
                decl: id,
                ident: decl.name.node.clone(),
            });
            let mut methods: Vec<FnIns> = Vec::with_capacity(decl.methods.len());
            for method in &decl.methods {
                if !method.params.first().is_some_and(ast::ParamDecl::is_self) {
                    self.push_err(method.name.span, ErrorKind::MissingReceiver);
                    continue;
                }
                let Some(params) = self.resolve_params(&method.params, &this) else {
                    continue;
                };
                let result = match &method.result {
                    Some(r) => match self.resolve_type(&r.ty) {
                        Some(kind) => Some(kind),
                        None => continue,
                    },
                    None => None,
                };
                methods.push(FnIns {
                    decl: None,
                    ident: method.name.node.clone(),
                    unsafety: method.unsafety,
                    owner: None,
                    generics: Vec::new(),
                    params: params
                        .into_iter()
                        .map(|p| ParamIns {
                            ident: p.ident,
                            mutable: p.mutable,
                            variadic: p.variadic,
                            kind: p.kind,
                        })
                        .collect(),
                    result,
                    builtin: false,
                });
            }
            self.arena.traits[id.0].methods = methods;
        }
    }

    fn apply_impls(&mut self, pkg: &Package) {
        for item in &pkg.items {
            let Item::Impl(imp) = item else { continue };
            let Some(sid) = self.struct_by_name(&imp.dest.node) else {
                self.push_err_args(imp.dest.span, ErrorKind::ImplDestNotExist, vec![imp.dest.node.clone()]);
                continue;
            };

            if let Some(base) = &imp.base {
                match self.lookup(&base.node) {
                    Some(Symbol::Trait(tid)) => {
                        let s = self.arena.strct_mut(sid);
                        if !s.implements.contains(&tid) {
                            s.implements.push(tid);
                        }
                    }
                    _ => {
                        self.push_err_args(base.span, ErrorKind::ImplBaseNotExist, vec![base.node.clone()]);
                        continue;
                    }
                }
            }

            for method in &imp.methods {
                let ident = &method.name.node;
                let taken = self.arena.strct(sid).find_field(ident).is_some()
                    || self.arena.find_method(sid, ident).is_some();
                if taken {
                    let owner = self.arena.strct(sid).ident.clone();
                    self.push_err_args(
                        method.name.span,
                        ErrorKind::StructAlreadyHaveIdent,
                        vec![owner, ident.clone()],
                    );
                    continue;
                }
                if !method.params.first().is_some_and(ast::ParamDecl::is_self) {
                    self.push_err(method.name.span, ErrorKind::MissingReceiver);
                    continue;
                }

                let id = self.arena.add_fn(ident.clone(), method.name.span);
                self.init_fn(id, method);
                let owner_generics = self.arena.strct(sid).generics.clone();
                let f = self.arena.func_mut(id);
                f.owner = Some(sid);
                f.owner_generics = owner_generics;
                self.arena.strct_mut(sid).methods.push(id);
            }
        }
    }

    /// Resolve parameters; the receiver takes `receiver` (by reference for
    /// `&self`).
    pub(crate) fn resolve_params(
        &mut self,
        params: &[ast::ParamDecl],
        receiver: &TypeKind,
    ) -> Option<Vec<Param>> {
        let mut out = Vec::with_capacity(params.len());
        let mut ok = true;
        for (i, p) in params.iter().enumerate() {
            let kind = if p.is_self() {
                if p.is_ref() {
                    TypeKind::reference(receiver.clone())
                } else {
                    receiver.clone()
                }
            } else {
                let Some(ty) = &p.ty else {
                    self.push_err(p.name.span, ErrorKind::MissingType);
                    ok = false;
                    continue;
                };
                match self.resolve_type(ty) {
                    Some(kind) => kind,
                    None => {
                        ok = false;
                        continue;
                    }
                }
            };
            if p.variadic && i + 1 != params.len() {
                self.push_err(p.name.span, ErrorKind::VariadicParameterNotLast);
                ok = false;
            }
            out.push(Param {
                ident: p.name.node.clone(),
                span: p.name.span,
                mutable: p.mutable,
                variadic: p.variadic,
                kind,
            });
        }
        ok.then_some(out)
    }

    fn resolve_signatures(&mut self) {
        for i in 0..self.arena.fns.len() {
            let f = &self.arena.fns[i];
            if f.builtin {
                continue;
            }
            let Some(decl) = f.ast.clone() else { continue };
            let receiver = match f.owner {
                Some(sid) => TypeKind::Struct(self.arena.strct(sid).template()),
                None => TypeKind::Void,
            };

            self.template_generics = f.all_generic_names();
            let params = self.resolve_params(&decl.params, &receiver).unwrap_or_default();
            let result = decl.result.as_ref().and_then(|r| self.resolve_type(&r.ty));
            if let Some(r) = &decl.result {
                if !r.idents.is_empty() {
                    let expected = match &result {
                        Some(TypeKind::Tuple(types)) => types.len(),
                        Some(_) => 1,
                        None => r.idents.len(),
                    };
                    if expected != r.idents.len() {
                        self.push_err(r.ty.span, ErrorKind::MissingMultiRet);
                    }
                }
            }
            self.template_generics.clear();

            let f = &mut self.arena.fns[i];
            f.params = params;
            f.result = result;
        }
    }

    fn check_trait_impls(&mut self) {
        for si in 0..self.arena.structs.len() {
            let s = &self.arena.structs[si];
            let (sid, span, implements) = (s.id, s.span, s.implements.clone());
            for tid in implements {
                let t = self.arena.trt(tid);
                let trait_ident = t.ident.clone();
                let missing: Vec<String> = t
                    .methods
                    .iter()
                    .filter(|m| !self.implements_method(sid, m))
                    .map(|m| m.ident.clone())
                    .collect();
                for method in missing {
                    self.push_err_args(span, ErrorKind::NotImplTraitDef, vec![trait_ident.clone(), method]);
                }
            }
        }
    }

    fn implements_method(&self, sid: StructId, method: &FnIns) -> bool {
        let Some(fid) = self.arena.find_method(sid, &method.ident) else {
            return false;
        };
        let owner = self.arena.strct(sid).template();
        let mut ins = self.arena.func(fid).instance_force(Some(owner));
        ins.ident = method.ident.clone();
        ins.to_str() == method.to_str()
    }

    fn check_globals(&mut self, pkg: &Package) {
        for item in &pkg.items {
            let Item::Var(decl) = item else { continue };
            let Some(var) = self.check_var_decl(decl) else {
                continue;
            };
            if ast::is_ignore_ident(&var.ident) {
                continue;
            }
            let index = self.global_vars.len();
            if self.define_global(&var.ident, var.span, Symbol::Var(index)) {
                self.global_vars.push(var);
            }
        }
    }

    fn check_bodies(&mut self) {
        for i in 0..self.arena.fns.len() {
            let f = &self.arena.fns[i];
            let has_body = f.ast.as_ref().is_some_and(|a| a.body.is_some());
            if f.builtin || f.is_generic() || !has_body {
                continue;
            }
            let owner = f.owner.map(|sid| self.arena.strct(sid).template());
            let ins = f.instance(owner);
            let (_, idx) = self.arena.fns[i].append_instance(ins);
            self.check_fn_body(FnId(i), idx);
        }
    }

    /// Queue a new generic instance for body checking.
    pub(crate) fn enqueue_instance(&mut self, id: FnId, idx: usize) {
        let f = self.arena.func(id);
        if self.config.check_generic_bodies && f.ast.as_ref().is_some_and(|a| a.body.is_some()) {
            self.pending.push_back((id, idx));
        }
    }

    fn drain_pending(&mut self) {
        let mut checked = 0;
        while let Some((id, idx)) = self.pending.pop_front() {
            if checked == PENDING_LIMIT {
                warn!(remaining = self.pending.len() + 1, "generic instance limit reached");
                self.pending.clear();
                break;
            }
            checked += 1;
            debug!(func = %self.arena.func(id).ident, instance = idx, "checking pending instance");
            self.check_fn_body(id, idx);
        }
    }

    /// Check the body of instance `idx` of `id` with its generic arguments
    /// in scope.
    pub(crate) fn check_fn_body(&mut self, id: FnId, idx: usize) {
        let f = self.arena.func(id);
        let Some(decl) = f.ast.clone() else { return };
        let Some(body) = decl.body.as_ref() else { return };
        let Some(ins) = f.instances.get(idx).cloned() else {
            return;
        };

        let bindings: Vec<TypeKind> = ins
            .owner
            .iter()
            .flat_map(|o| o.generics.iter().cloned())
            .chain(ins.generics.iter().cloned())
            .collect();
        let env: Vec<(String, TypeKind)> = f.all_generic_names().into_iter().zip(bindings).collect();
        let ctx = FnCtx {
            ins: ins.clone(),
            result_idents: f.result_idents.clone(),
        };

        let saved_env = std::mem::replace(&mut self.generic_env, env);
        let saved_ctx = self.current.replace(ctx);
        let saved_scopes = std::mem::take(&mut self.scopes);
        self.push_scope();

        for (p, pdecl) in ins.params.iter().zip(&decl.params) {
            let kind = if p.variadic {
                TypeKind::slice(p.kind.clone())
            } else {
                p.kind.clone()
            };
            let ident = if p.is_self() { "self" } else { p.ident.as_str() };
            let mut var = Var::new(ident, pdecl.name.span, kind);
            var.mutable = p.mutable || (p.is_self() && p.is_ref());
            self.add_var(var);
        }

        if let Some(r) = &decl.result {
            let types = ins.result_types();
            for (ident, kind) in r.idents.iter().zip(types) {
                let mut var = Var::new(ident.node.clone(), ident.span, kind);
                var.mutable = true;
                self.add_var(var);
            }
        }

        self.check_stmts(body);

        self.scopes = saved_scopes;
        self.current = saved_ctx;
        self.generic_env = saved_env;
        debug!(func = %decl.name.node, instance = idx, "checked body");
    }
}
