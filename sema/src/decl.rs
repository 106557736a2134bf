//! Declarations and their instances
//!
//! Every function, struct, trait and enum is stored once in an [`Arena`] and
//! addressed by a typed index. Generic-capable declarations own a growing
//! list of instances; an instance refers back to its declaration by index
//! only, so the declaration graph stays a plain tree of owned vectors.

use std::rc::Rc;

use serde::Serialize;

use crate::ast::{self, Span};
use crate::constant::Const;
use crate::types::TypeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FnId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StructId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TraitId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EnumId(pub usize);

// ============================================================================
// Functions
// ============================================================================

/// Declared parameter with its template type
#[derive(Debug, Clone)]
pub struct Param {
    pub ident: String,
    pub span: Span,
    pub mutable: bool,
    pub variadic: bool,
    /// For variadic parameters this is the element type.
    pub kind: TypeKind,
}

impl Param {
    pub fn is_self(&self) -> bool {
        ast::is_self_ident(&self.ident)
    }

    pub fn is_ref(&self) -> bool {
        self.ident.starts_with('&')
    }

    fn instance(&self) -> ParamIns {
        ParamIns {
            ident: self.ident.clone(),
            mutable: self.mutable,
            variadic: self.variadic,
            kind: self.kind.clone(),
        }
    }
}

/// Parameter of one function instance
#[derive(Debug, Clone, PartialEq)]
pub struct ParamIns {
    pub ident: String,
    pub mutable: bool,
    pub variadic: bool,
    pub kind: TypeKind,
}

impl ParamIns {
    pub fn new(ident: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            ident: ident.into(),
            mutable: false,
            variadic: false,
            kind,
        }
    }

    pub fn is_self(&self) -> bool {
        ast::is_self_ident(&self.ident)
    }

    pub fn is_ref(&self) -> bool {
        self.ident.starts_with('&')
    }

    pub fn to_str(&self) -> String {
        let mut s = String::new();
        if self.mutable {
            s.push_str("mut ");
        }
        if self.is_self() {
            if self.is_ref() {
                s.push('&');
            }
            s.push_str("self");
            return s;
        }
        if self.variadic {
            s.push_str("...");
        }
        s.push_str(&self.kind.to_str());
        s
    }
}

/// Resolved signature of one function specialization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FnIns {
    /// `None` for function types that name no declaration
    pub decl: Option<FnId>,
    pub ident: String,
    pub unsafety: bool,
    /// Receiver struct instance of a method
    pub owner: Option<StructIns>,
    /// Bound generic arguments; placeholders until inference completes
    pub generics: Vec<TypeKind>,
    pub params: Vec<ParamIns>,
    pub result: Option<TypeKind>,
    pub builtin: bool,
}

impl FnIns {
    pub fn is_void(&self) -> bool {
        self.result.is_none()
    }

    pub fn is_method(&self) -> bool {
        self.owner.is_some()
    }

    pub fn receiver(&self) -> Option<&ParamIns> {
        self.params.first().filter(|p| p.is_self())
    }

    /// Parameters a call site supplies arguments for.
    pub fn call_params(&self) -> &[ParamIns] {
        match self.receiver() {
            Some(_) => &self.params[1..],
            None => &self.params,
        }
    }

    /// Expected result values, a tuple result unpacked into its members.
    pub fn result_types(&self) -> Vec<TypeKind> {
        match &self.result {
            None => Vec::new(),
            Some(TypeKind::Tuple(types)) => types.clone(),
            Some(kind) => vec![kind.clone()],
        }
    }

    /// Identity of the instance among its siblings.
    pub fn instance_key(&self) -> Vec<String> {
        let owner = self.owner.iter().flat_map(|o| o.generics.iter());
        owner.chain(self.generics.iter()).map(TypeKind::to_str).collect()
    }

    pub fn substitute(&mut self, names: &[String], bindings: &[TypeKind]) {
        if let Some(owner) = &mut self.owner {
            for g in &mut owner.generics {
                *g = g.substitute(names, bindings);
            }
        }
        for g in &mut self.generics {
            *g = g.substitute(names, bindings);
        }
        for p in &mut self.params {
            p.kind = p.kind.substitute(names, bindings);
        }
        if let Some(result) = &mut self.result {
            *result = result.substitute(names, bindings);
        }
    }

    pub fn to_str(&self) -> String {
        let mut s = String::new();
        if self.unsafety {
            s.push_str("unsafe ");
        }
        s.push_str("fn");
        if !self.generics.is_empty() {
            let generics: Vec<String> = self.generics.iter().map(TypeKind::to_str).collect();
            s.push('[');
            s.push_str(&generics.join(","));
            s.push(']');
        }
        let params: Vec<String> = self.params.iter().map(ParamIns::to_str).collect();
        s.push('(');
        s.push_str(&params.join(","));
        s.push(')');
        if let Some(result) = &self.result {
            s.push(':');
            s.push_str(&result.to_str());
        }
        s
    }
}

/// Function or method declaration
#[derive(Debug, Clone)]
pub struct Func {
    pub id: FnId,
    pub ident: String,
    pub span: Span,
    pub unsafety: bool,
    pub generics: Vec<String>,
    pub params: Vec<Param>,
    pub result: Option<TypeKind>,
    /// Named result variables
    pub result_idents: Vec<String>,
    pub owner: Option<StructId>,
    /// Generic names of the owner struct, usable in the signature
    pub owner_generics: Vec<String>,
    pub builtin: bool,
    /// Syntax node, kept for body checking
    pub ast: Option<Rc<ast::FnDecl>>,
    pub instances: Vec<FnIns>,
}

impl Func {
    pub fn new(id: FnId, ident: impl Into<String>, span: Span) -> Self {
        Self {
            id,
            ident: ident.into(),
            span,
            unsafety: false,
            generics: Vec::new(),
            params: Vec::new(),
            result: None,
            result_idents: Vec::new(),
            owner: None,
            owner_generics: Vec::new(),
            builtin: false,
            ast: None,
            instances: Vec::new(),
        }
    }

    /// Specializations differ per call site.
    pub fn is_generic(&self) -> bool {
        !self.generics.is_empty() || !self.owner_generics.is_empty()
    }

    pub fn is_method(&self) -> bool {
        self.owner.is_some()
    }

    pub fn is_void(&self) -> bool {
        self.result.is_none()
    }

    pub fn any_var(&self) -> bool {
        !self.result_idents.is_empty()
    }

    /// Owner generic names followed by the function's own.
    pub fn all_generic_names(&self) -> Vec<String> {
        self.owner_generics
            .iter()
            .chain(self.generics.iter())
            .cloned()
            .collect()
    }

    /// Fresh instance built from the templates, bypassing the cache.
    pub fn instance_force(&self, owner: Option<StructIns>) -> FnIns {
        FnIns {
            decl: Some(self.id),
            ident: self.ident.clone(),
            unsafety: self.unsafety,
            owner,
            generics: self
                .generics
                .iter()
                .map(|g| TypeKind::Generic(g.clone()))
                .collect(),
            params: self.params.iter().map(Param::instance).collect(),
            result: self.result.clone(),
            builtin: self.builtin,
        }
    }

    /// Canonical instance of a non-generic function, or a fresh one.
    pub fn instance(&self, owner: Option<StructIns>) -> FnIns {
        if !self.is_generic() {
            if let [only] = self.instances.as_slice() {
                return only.clone();
            }
        }
        self.instance_force(owner)
    }

    /// Store `ins` unless an equal instance exists. Returns whether it was
    /// appended and the index of the stored instance.
    pub fn append_instance(&mut self, ins: FnIns) -> (bool, usize) {
        if !self.is_generic() {
            if !self.instances.is_empty() {
                return (false, 0);
            }
            self.instances.push(ins);
            return (true, 0);
        }

        let key = ins.instance_key();
        if let Some(i) = self.instances.iter().position(|a| a.instance_key() == key) {
            return (false, i);
        }
        self.instances.push(ins);
        (true, self.instances.len() - 1)
    }
}

// ============================================================================
// Structs
// ============================================================================

#[derive(Debug, Clone)]
pub struct Field {
    pub ident: String,
    pub span: Span,
    pub mutable: bool,
    pub kind: TypeKind,
}

/// Field of a struct instance
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIns {
    pub ident: String,
    pub mutable: bool,
    pub kind: TypeKind,
}

/// Struct with its generic arguments
#[derive(Debug, Clone, PartialEq)]
pub struct StructIns {
    pub decl: StructId,
    pub ident: String,
    pub generics: Vec<TypeKind>,
}

impl StructIns {
    pub fn to_str(&self) -> String {
        if self.generics.is_empty() {
            return self.ident.clone();
        }
        let generics: Vec<String> = self.generics.iter().map(TypeKind::to_str).collect();
        format!("{}[{}]", self.ident, generics.join(","))
    }
}

#[derive(Debug, Clone)]
pub struct Struct {
    pub id: StructId,
    pub ident: String,
    pub span: Span,
    pub generics: Vec<String>,
    pub fields: Vec<Field>,
    pub methods: Vec<FnId>,
    pub implements: Vec<TraitId>,
    pub instances: Vec<StructIns>,
}

impl Struct {
    pub fn is_implements(&self, t: TraitId) -> bool {
        self.implements.contains(&t)
    }

    pub fn find_field(&self, ident: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.ident == ident)
    }

    /// Template instance: generic names as placeholders.
    pub fn template(&self) -> StructIns {
        StructIns {
            decl: self.id,
            ident: self.ident.clone(),
            generics: self
                .generics
                .iter()
                .map(|g| TypeKind::Generic(g.clone()))
                .collect(),
        }
    }

    /// Fields of `ins` with its generic arguments substituted.
    pub fn fields_of(&self, ins: &StructIns) -> Vec<FieldIns> {
        self.fields
            .iter()
            .map(|f| FieldIns {
                ident: f.ident.clone(),
                mutable: f.mutable,
                kind: f.kind.substitute(&self.generics, &ins.generics),
            })
            .collect()
    }

    pub fn append_instance(&mut self, ins: StructIns) -> (bool, usize) {
        let key = ins.to_str();
        if let Some(i) = self.instances.iter().position(|s| s.to_str() == key) {
            return (false, i);
        }
        self.instances.push(ins);
        (true, self.instances.len() - 1)
    }
}

// ============================================================================
// Traits and enums
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct TraitRef {
    pub decl: TraitId,
    pub ident: String,
}

#[derive(Debug, Clone)]
pub struct Trait {
    pub id: TraitId,
    pub ident: String,
    pub span: Span,
    /// Method signatures; the receiver is the first parameter.
    pub methods: Vec<FnIns>,
}

impl Trait {
    pub fn find_method(&self, ident: &str) -> Option<&FnIns> {
        self.methods.iter().find(|m| m.ident == ident)
    }

    /// Some method takes its receiver by reference.
    pub fn has_reference_receiver(&self) -> bool {
        self.methods
            .iter()
            .any(|m| m.receiver().is_some_and(ParamIns::is_ref))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumRef {
    pub decl: EnumId,
    pub ident: String,
}

#[derive(Debug, Clone)]
pub struct EnumItem {
    pub ident: String,
    pub span: Span,
    pub value: Option<Const>,
}

#[derive(Debug, Clone)]
pub struct Enum {
    pub id: EnumId,
    pub ident: String,
    pub span: Span,
    /// Underlying type
    pub kind: TypeKind,
    pub items: Vec<EnumItem>,
}

impl Enum {
    pub fn find_item(&self, ident: &str) -> Option<&EnumItem> {
        self.items.iter().find(|i| i.ident == ident)
    }
}

// ============================================================================
// Arena
// ============================================================================

/// Owner of every declaration of an analysis session
#[derive(Debug, Clone, Default)]
pub struct Arena {
    pub fns: Vec<Func>,
    pub structs: Vec<Struct>,
    pub traits: Vec<Trait>,
    pub enums: Vec<Enum>,
}

impl Arena {
    pub fn func(&self, id: FnId) -> &Func {
        &self.fns[id.0]
    }

    pub fn func_mut(&mut self, id: FnId) -> &mut Func {
        &mut self.fns[id.0]
    }

    pub fn strct(&self, id: StructId) -> &Struct {
        &self.structs[id.0]
    }

    pub fn strct_mut(&mut self, id: StructId) -> &mut Struct {
        &mut self.structs[id.0]
    }

    pub fn trt(&self, id: TraitId) -> &Trait {
        &self.traits[id.0]
    }

    pub fn enm(&self, id: EnumId) -> &Enum {
        &self.enums[id.0]
    }

    pub fn add_fn(&mut self, ident: impl Into<String>, span: Span) -> FnId {
        let id = FnId(self.fns.len());
        self.fns.push(Func::new(id, ident, span));
        id
    }

    pub fn add_struct(&mut self, ident: impl Into<String>, span: Span, generics: Vec<String>) -> StructId {
        let id = StructId(self.structs.len());
        self.structs.push(Struct {
            id,
            ident: ident.into(),
            span,
            generics,
            fields: Vec::new(),
            methods: Vec::new(),
            implements: Vec::new(),
            instances: Vec::new(),
        });
        id
    }

    pub fn add_trait(&mut self, ident: impl Into<String>, span: Span) -> TraitId {
        let id = TraitId(self.traits.len());
        self.traits.push(Trait {
            id,
            ident: ident.into(),
            span,
            methods: Vec::new(),
        });
        id
    }

    pub fn add_enum(&mut self, ident: impl Into<String>, span: Span, kind: TypeKind) -> EnumId {
        let id = EnumId(self.enums.len());
        self.enums.push(Enum {
            id,
            ident: ident.into(),
            span,
            kind,
            items: Vec::new(),
        });
        id
    }

    pub fn find_method(&self, s: StructId, ident: &str) -> Option<FnId> {
        self.strct(s)
            .methods
            .iter()
            .copied()
            .find(|m| self.func(*m).ident == ident)
    }

    pub fn fields_of(&self, ins: &StructIns) -> Vec<FieldIns> {
        self.strct(ins.decl).fields_of(ins)
    }

    /// Reports whether values of `kind` give access to shared mutable
    /// memory.
    pub fn is_mut(&self, kind: &TypeKind) -> bool {
        self.is_mut_inner(kind, &mut Vec::new())
    }

    /// `path` holds the struct instances enclosing `kind`, so a recursive
    /// struct stops at itself while sibling instances are still visited.
    fn is_mut_inner(&self, kind: &TypeKind, path: &mut Vec<String>) -> bool {
        match kind {
            TypeKind::Ref(_) | TypeKind::Ptr(_) | TypeKind::Slc(_) | TypeKind::Map { .. } => true,
            TypeKind::Arr { elem, .. } => self.is_mut_inner(elem, path),
            TypeKind::Tuple(types) => types.iter().any(|t| self.is_mut_inner(t, path)),
            TypeKind::Struct(s) => {
                let key = s.to_str();
                if path.contains(&key) {
                    return false;
                }
                path.push(key);
                let found = self
                    .fields_of(s)
                    .iter()
                    .any(|f| self.is_mut_inner(&f.kind, path));
                path.pop();
                found
            }
            _ => false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
