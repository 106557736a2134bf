//! Resolved type model
//!
//! `TypeKind` is what every type expression becomes after resolution. Its
//! string form (`to_str`) doubles as the structural identity used to
//! deduplicate generic instances, so two kinds are "the same type" exactly
//! when they render the same.

pub mod prim;

use crate::decl::{EnumRef, FnIns, StructIns, TraitRef};

pub use prim::PrimKind;

/// Resolved type
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Prim(PrimKind),
    /// `&T`
    Ref(Box<TypeKind>),
    /// `*T`; `None` is the untyped `*unsafe` pointer
    Ptr(Option<Box<TypeKind>>),
    /// `[]T`
    Slc(Box<TypeKind>),
    /// `[N]T`
    Arr { elem: Box<TypeKind>, n: usize },
    /// `[K:V]`
    Map { key: Box<TypeKind>, val: Box<TypeKind> },
    Struct(StructIns),
    Trait(TraitRef),
    Enum(EnumRef),
    Fn(Box<FnIns>),
    Tuple(Vec<TypeKind>),
    /// Type of the `nil` literal
    Nil,
    /// Result of calling a void function
    Void,
    /// Unbound generic parameter of a declaration-level signature
    Generic(String),
}

impl TypeKind {
    pub fn prim(&self) -> Option<PrimKind> {
        match self {
            TypeKind::Prim(p) => Some(*p),
            _ => None,
        }
    }

    /// Referenced type of `&T`.
    pub fn ref_elem(&self) -> Option<&TypeKind> {
        match self {
            TypeKind::Ref(elem) => Some(elem),
            _ => None,
        }
    }

    /// Pointer payload; `Some(None)` is the unsafe pointer.
    pub fn ptr(&self) -> Option<Option<&TypeKind>> {
        match self {
            TypeKind::Ptr(elem) => Some(elem.as_deref()),
            _ => None,
        }
    }

    pub fn slc(&self) -> Option<&TypeKind> {
        match self {
            TypeKind::Slc(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn arr(&self) -> Option<(&TypeKind, usize)> {
        match self {
            TypeKind::Arr { elem, n } => Some((elem, *n)),
            _ => None,
        }
    }

    pub fn map(&self) -> Option<(&TypeKind, &TypeKind)> {
        match self {
            TypeKind::Map { key, val } => Some((key, val)),
            _ => None,
        }
    }

    pub fn strct(&self) -> Option<&StructIns> {
        match self {
            TypeKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn trt(&self) -> Option<&TraitRef> {
        match self {
            TypeKind::Trait(t) => Some(t),
            _ => None,
        }
    }

    pub fn enm(&self) -> Option<&EnumRef> {
        match self {
            TypeKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn fnc(&self) -> Option<&FnIns> {
        match self {
            TypeKind::Fn(f) => Some(f),
            _ => None,
        }
    }

    pub fn tup(&self) -> Option<&[TypeKind]> {
        match self {
            TypeKind::Tuple(types) => Some(types),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, TypeKind::Nil)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeKind::Void)
    }

    pub fn is_prim(&self, kind: PrimKind) -> bool {
        self.prim() == Some(kind)
    }

    pub fn is_unsafe_ptr(&self) -> bool {
        matches!(self, TypeKind::Ptr(None))
    }

    /// Kinds that accept `nil`.
    pub fn is_nil_compatible(&self) -> bool {
        matches!(
            self,
            TypeKind::Nil
                | TypeKind::Ptr(_)
                | TypeKind::Slc(_)
                | TypeKind::Map { .. }
                | TypeKind::Fn(_)
                | TypeKind::Trait(_)
        )
    }

    pub fn reference(elem: TypeKind) -> Self {
        TypeKind::Ref(Box::new(elem))
    }

    pub fn pointer(elem: TypeKind) -> Self {
        TypeKind::Ptr(Some(Box::new(elem)))
    }

    pub fn slice(elem: TypeKind) -> Self {
        TypeKind::Slc(Box::new(elem))
    }

    pub fn array(elem: TypeKind, n: usize) -> Self {
        TypeKind::Arr {
            elem: Box::new(elem),
            n,
        }
    }

    pub fn map_of(key: TypeKind, val: TypeKind) -> Self {
        TypeKind::Map {
            key: Box::new(key),
            val: Box::new(val),
        }
    }

    /// Canonical rendering; also the structural identity of the type.
    pub fn to_str(&self) -> String {
        match self {
            TypeKind::Prim(p) => p.name().to_string(),
            TypeKind::Ref(elem) => format!("&{}", elem.to_str()),
            TypeKind::Ptr(None) => "*unsafe".to_string(),
            TypeKind::Ptr(Some(elem)) => format!("*{}", elem.to_str()),
            TypeKind::Slc(elem) => format!("[]{}", elem.to_str()),
            TypeKind::Arr { elem, n } => format!("[{n}]{}", elem.to_str()),
            TypeKind::Map { key, val } => format!("[{}:{}]", key.to_str(), val.to_str()),
            TypeKind::Struct(s) => s.to_str(),
            TypeKind::Trait(t) => t.ident.clone(),
            TypeKind::Enum(e) => e.ident.clone(),
            TypeKind::Fn(f) => f.to_str(),
            TypeKind::Tuple(types) => {
                let parts: Vec<String> = types.iter().map(TypeKind::to_str).collect();
                format!("({})", parts.join(","))
            }
            TypeKind::Nil => "nil".to_string(),
            TypeKind::Void => "void".to_string(),
            TypeKind::Generic(name) => name.clone(),
        }
    }

    /// Reports whether any unbound generic placeholder occurs in the type.
    pub fn has_generics(&self) -> bool {
        match self {
            TypeKind::Generic(_) => true,
            TypeKind::Ref(elem) | TypeKind::Slc(elem) => elem.has_generics(),
            TypeKind::Ptr(elem) => elem.as_ref().is_some_and(|e| e.has_generics()),
            TypeKind::Arr { elem, .. } => elem.has_generics(),
            TypeKind::Map { key, val } => key.has_generics() || val.has_generics(),
            TypeKind::Struct(s) => s.generics.iter().any(TypeKind::has_generics),
            TypeKind::Fn(f) => {
                f.params.iter().any(|p| p.kind.has_generics())
                    || f.result.as_ref().is_some_and(TypeKind::has_generics)
            }
            TypeKind::Tuple(types) => types.iter().any(TypeKind::has_generics),
            TypeKind::Prim(_)
            | TypeKind::Trait(_)
            | TypeKind::Enum(_)
            | TypeKind::Nil
            | TypeKind::Void => false,
        }
    }

    /// Reports whether one of `names` occurs as a placeholder in the type.
    pub fn uses_generics(&self, names: &[String]) -> bool {
        match self {
            TypeKind::Generic(name) => names.contains(name),
            TypeKind::Ref(elem) | TypeKind::Slc(elem) => elem.uses_generics(names),
            TypeKind::Ptr(elem) => elem.as_ref().is_some_and(|e| e.uses_generics(names)),
            TypeKind::Arr { elem, .. } => elem.uses_generics(names),
            TypeKind::Map { key, val } => key.uses_generics(names) || val.uses_generics(names),
            TypeKind::Struct(s) => s.generics.iter().any(|g| g.uses_generics(names)),
            TypeKind::Fn(f) => {
                f.params.iter().any(|p| p.kind.uses_generics(names))
                    || f.result.as_ref().is_some_and(|r| r.uses_generics(names))
            }
            TypeKind::Tuple(types) => types.iter().any(|t| t.uses_generics(names)),
            _ => false,
        }
    }

    /// Replace each placeholder named in `names` with the kind at the same
    /// position in `bindings`.
    pub fn substitute(&self, names: &[String], bindings: &[TypeKind]) -> TypeKind {
        match self {
            TypeKind::Generic(name) => names
                .iter()
                .position(|n| n == name)
                .and_then(|i| bindings.get(i))
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeKind::Ref(elem) => TypeKind::Ref(Box::new(elem.substitute(names, bindings))),
            TypeKind::Ptr(elem) => TypeKind::Ptr(
                elem.as_ref()
                    .map(|e| Box::new(e.substitute(names, bindings))),
            ),
            TypeKind::Slc(elem) => TypeKind::Slc(Box::new(elem.substitute(names, bindings))),
            TypeKind::Arr { elem, n } => TypeKind::Arr {
                elem: Box::new(elem.substitute(names, bindings)),
                n: *n,
            },
            TypeKind::Map { key, val } => TypeKind::Map {
                key: Box::new(key.substitute(names, bindings)),
                val: Box::new(val.substitute(names, bindings)),
            },
            TypeKind::Struct(s) => {
                let mut s = s.clone();
                for g in &mut s.generics {
                    *g = g.substitute(names, bindings);
                }
                TypeKind::Struct(s)
            }
            TypeKind::Fn(f) => {
                let mut f = f.as_ref().clone();
                f.substitute(names, bindings);
                TypeKind::Fn(Box::new(f))
            }
            TypeKind::Tuple(types) => TypeKind::Tuple(
                types
                    .iter()
                    .map(|t| t.substitute(names, bindings))
                    .collect(),
            ),
            TypeKind::Prim(_)
            | TypeKind::Trait(_)
            | TypeKind::Enum(_)
            | TypeKind::Nil
            | TypeKind::Void => self.clone(),
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_str())
    }
}

impl From<PrimKind> for TypeKind {
    fn from(p: PrimKind) -> Self {
        TypeKind::Prim(p)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{EnumId, FnIns, ParamIns, StructId};

    fn int() -> TypeKind {
        PrimKind::Int.into()
    }

    fn s() -> TypeKind {
        PrimKind::Str.into()
    }

    fn generic(name: &str) -> TypeKind {
        TypeKind::Generic(name.to_string())
    }

    fn anon_fn(params: Vec<TypeKind>, result: Option<TypeKind>) -> FnIns {
        FnIns {
            params: params
                .into_iter()
                .enumerate()
                .map(|(i, kind)| ParamIns::new(format!("p{i}"), kind))
                .collect(),
            result,
            ..FnIns::default()
        }
    }

    #[test]
    fn test_to_str_shapes() {
        insta::assert_snapshot!(TypeKind::reference(int()).to_str(), @"&int");
        insta::assert_snapshot!(TypeKind::Ptr(None).to_str(), @"*unsafe");
        insta::assert_snapshot!(TypeKind::pointer(s()).to_str(), @"*str");
        insta::assert_snapshot!(TypeKind::slice(TypeKind::slice(int())).to_str(), @"[][]int");
        insta::assert_snapshot!(TypeKind::array(int(), 4).to_str(), @"[4]int");
        insta::assert_snapshot!(TypeKind::map_of(s(), int()).to_str(), @"[str:int]");
        insta::assert_snapshot!(TypeKind::Tuple(vec![int(), s()]).to_str(), @"(int,str)");
        insta::assert_snapshot!(TypeKind::Nil.to_str(), @"nil");
    }

    #[test]
    fn test_struct_and_enum_to_str() {
        let pair = TypeKind::Struct(StructIns {
            decl: StructId(0),
            ident: "Pair".into(),
            generics: vec![int(), s()],
        });
        assert_eq!(pair.to_str(), "Pair[int,str]");
        let color = TypeKind::Enum(EnumRef {
            decl: EnumId(0),
            ident: "Color".into(),
        });
        assert_eq!(color.to_str(), "Color");
    }

    #[test]
    fn test_fn_to_str() {
        let f = anon_fn(vec![int(), TypeKind::slice(s())], Some(int()));
        insta::assert_snapshot!(TypeKind::Fn(Box::new(f)).to_str(), @"fn(int,[]str):int");

        let mut unsafe_void = anon_fn(vec![], None);
        unsafe_void.unsafety = true;
        insta::assert_snapshot!(TypeKind::Fn(Box::new(unsafe_void)).to_str(), @"unsafe fn()");
    }

    #[test]
    fn test_accessors() {
        let m = TypeKind::map_of(s(), int());
        assert_eq!(m.map().map(|(k, v)| (k.to_str(), v.to_str())), Some(("str".into(), "int".into())));
        assert!(m.slc().is_none());
        assert_eq!(TypeKind::Ptr(None).ptr(), Some(None));
        assert!(TypeKind::pointer(int()).ptr().is_some_and(|e| e.is_some()));
        assert_eq!(TypeKind::array(int(), 3).arr().map(|(_, n)| n), Some(3));
        assert!(TypeKind::Nil.is_nil());
        assert!(TypeKind::slice(int()).is_nil_compatible());
        assert!(!TypeKind::array(int(), 1).is_nil_compatible());
    }

    #[test]
    fn test_substitute_nested() {
        let names = vec!["K".to_string(), "V".to_string()];
        let template = TypeKind::map_of(generic("K"), TypeKind::slice(generic("V")));
        assert!(template.has_generics());
        assert!(template.uses_generics(&names));
        let bound = template.substitute(&names, &[s(), int()]);
        assert_eq!(bound.to_str(), "[str:[]int]");
        assert!(!bound.has_generics());
    }

    #[test]
    fn test_substitute_fn_params_and_result() {
        let names = vec!["T".to_string()];
        let f = TypeKind::Fn(Box::new(anon_fn(vec![generic("T")], Some(generic("T")))));
        assert_eq!(f.substitute(&names, &[int()]).to_str(), "fn(int):int");
    }

    #[test]
    fn test_uses_generics_ignores_foreign_names() {
        let names = vec!["T".to_string()];
        assert!(!TypeKind::slice(generic("U")).uses_generics(&names));
        assert!(TypeKind::slice(generic("U")).has_generics());
    }
}
