//! Structural type compatibility

use crate::ast::Span;
use crate::decl::{Arena, FnIns, TraitRef};
use crate::error::ErrorKind;
use crate::sema::Sema;
use crate::types::{prim, TypeKind};

/// Decides whether a value of one resolved type may flow into another.
///
/// Matching is driven by the destination's shape. The checker never reports
/// on its own; a rule that deserves a dedicated diagnostic leaves its kind in
/// [`error`](Self::error) and the caller decides what to log.
pub struct TypeCompatibilityChecker<'a> {
    arena: &'a Arena,
    arch_bits: u32,
    /// References compare by their element when the sides differ.
    deref: bool,
    error: Option<ErrorKind>,
}

impl<'a> TypeCompatibilityChecker<'a> {
    pub fn new(arena: &'a Arena, arch_bits: u32) -> Self {
        Self {
            arena,
            arch_bits,
            deref: false,
            error: None,
        }
    }

    pub fn with_deref(mut self, deref: bool) -> Self {
        self.deref = deref;
        self
    }

    /// Dedicated diagnostic left by the last failed check, if any.
    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    pub fn check(&mut self, dest: &TypeKind, src: &TypeKind) -> bool {
        self.error = None;
        self.check_kind(dest, src, self.deref)
    }

    fn check_kind(&mut self, dest: &TypeKind, src: &TypeKind, deref: bool) -> bool {
        match dest {
            TypeKind::Ref(elem) => return self.check_ref(dest, elem, src, deref),
            TypeKind::Trait(t) => return self.check_trait(t, src),
            _ => {}
        }

        let src = src.ref_elem().unwrap_or(src);
        match dest {
            TypeKind::Ptr(elem) => {
                if src.is_nil() {
                    return true;
                }
                let Some(src_elem) = src.ptr() else {
                    return false;
                };
                match (elem, src_elem) {
                    (None, _) => true,
                    (Some(d), Some(s)) => self.check_kind(d, s, false),
                    (Some(_), None) => false,
                }
            }
            TypeKind::Slc(elem) => {
                if src.is_nil() {
                    return true;
                }
                src.slc().is_some_and(|s| self.check_kind(elem, s, false))
            }
            TypeKind::Arr { elem, n } => match src.arr() {
                Some((s, m)) if m == *n => self.check_kind(elem, s, false),
                _ => false,
            },
            TypeKind::Map { key, val } => {
                if src.is_nil() {
                    return true;
                }
                match src.map() {
                    Some((sk, sv)) => self.check_kind(key, sk, false) && self.check_kind(val, sv, false),
                    None => false,
                }
            }
            TypeKind::Enum(e) => src.enm().is_some_and(|s| s.decl == e.decl),
            TypeKind::Struct(d) => {
                let Some(s) = src.strct() else {
                    return false;
                };
                if s.decl != d.decl || s.generics.len() != d.generics.len() {
                    return false;
                }
                d.generics
                    .iter()
                    .zip(&s.generics)
                    .all(|(dg, sg)| self.check_kind(dg, sg, false))
            }
            TypeKind::Fn(d) => {
                if src.is_nil() {
                    return true;
                }
                match src.fnc() {
                    Some(s) => self.check_fn(d, s),
                    None => false,
                }
            }
            TypeKind::Tuple(types) => match src.tup() {
                Some(st) if st.len() == types.len() => {
                    types.iter().zip(st).all(|(d, s)| self.check_kind(d, s, false))
                }
                _ => false,
            },
            TypeKind::Nil => src.is_nil(),
            TypeKind::Generic(_) => dest.to_str() == src.to_str(),
            TypeKind::Void => false,
            TypeKind::Prim(p) => src
                .prim()
                .is_some_and(|s| prim::types_are_compatible(*p, s, self.arch_bits)),
            TypeKind::Ref(_) | TypeKind::Trait(_) => false,
        }
    }

    fn check_ref(&mut self, dest: &TypeKind, dest_elem: &TypeKind, src: &TypeKind, deref: bool) -> bool {
        if dest.to_str() == src.to_str() {
            return true;
        }
        if !deref {
            return false;
        }
        match src.ref_elem() {
            None => self.check_kind(dest_elem, src, false),
            Some(src_elem) => self.check_kind(dest, src_elem, false),
        }
    }

    fn check_trait(&mut self, t: &TraitRef, src: &TypeKind) -> bool {
        if src.is_nil() {
            return true;
        }
        let (src, by_ref) = match src.ref_elem() {
            Some(elem) => (elem, true),
            None => (src, false),
        };
        match src {
            TypeKind::Struct(s) => {
                if !self.arena.strct(s.decl).is_implements(t.decl) {
                    return false;
                }
                if self.arena.trt(t.decl).has_reference_receiver() && !by_ref {
                    self.error = Some(ErrorKind::TraitHasReferenceParameteredFunction);
                    return false;
                }
                true
            }
            TypeKind::Trait(s) if !by_ref => s.decl == t.decl,
            _ => false,
        }
    }

    /// Function types match on arity, result presence, receiver alignment
    /// and the kinds of every non-receiver parameter.
    fn check_fn(&mut self, dest: &FnIns, src: &FnIns) -> bool {
        if dest.result.is_some() != src.result.is_some() || dest.params.len() != src.params.len() {
            return false;
        }
        for (dp, sp) in dest.params.iter().zip(&src.params) {
            if dp.is_self() != sp.is_self() || dp.variadic != sp.variadic {
                return false;
            }
            if !dp.is_self() && !self.check_kind(&dp.kind, &sp.kind, false) {
                return false;
            }
        }
        match (&dest.result, &src.result) {
            (Some(d), Some(s)) => self.check_kind(d, s, false),
            _ => true,
        }
    }
}

impl Sema {
    /// Check that `src` may flow into `dest`, logging the failure at `span`.
    pub fn check_type_compatibility(&mut self, dest: &TypeKind, src: &TypeKind, span: Span, deref: bool) -> bool {
        let mut checker = TypeCompatibilityChecker::new(&self.arena, self.arch_bits()).with_deref(deref);
        if checker.check(dest, src) {
            return true;
        }
        match checker.error() {
            Some(kind) => self.push_err(span, kind),
            None => self.push_err_args(span, ErrorKind::IncompatibleTypes, vec![dest.to_str(), src.to_str()]),
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::{ParamIns, StructIns};
    use crate::types::PrimKind;

    fn int() -> TypeKind {
        PrimKind::Int.into()
    }

    fn check(arena: &Arena, dest: &TypeKind, src: &TypeKind) -> bool {
        TypeCompatibilityChecker::new(arena, 64).check(dest, src)
    }

    fn func(params: Vec<ParamIns>, result: Option<TypeKind>) -> TypeKind {
        TypeKind::Fn(Box::new(FnIns {
            params,
            result,
            ..FnIns::default()
        }))
    }

    fn arena_with_trait(reference_receiver: bool) -> (Arena, TypeKind, TypeKind) {
        let mut arena = Arena::default();
        let sid = arena.add_struct("File", Span::default(), vec![]);
        let tid = arena.add_trait("Writer", Span::default());
        let receiver = if reference_receiver { "&self" } else { "self" };
        arena.traits[tid.0].methods.push(FnIns {
            ident: "write".into(),
            params: vec![ParamIns::new(receiver, TypeKind::Void)],
            ..FnIns::default()
        });
        arena.strct_mut(sid).implements.push(tid);
        let s = TypeKind::Struct(arena.strct(sid).template());
        let t = TypeKind::Trait(TraitRef {
            decl: tid,
            ident: "Writer".into(),
        });
        (arena, s, t)
    }

    #[test]
    fn test_reflexive() {
        let (arena, s, t) = arena_with_trait(false);
        let kinds = vec![
            int(),
            PrimKind::Str.into(),
            TypeKind::reference(int()),
            TypeKind::pointer(int()),
            TypeKind::slice(TypeKind::slice(int())),
            TypeKind::array(int(), 3),
            TypeKind::map_of(PrimKind::Str.into(), int()),
            TypeKind::Tuple(vec![int(), PrimKind::Bool.into()]),
            func(vec![ParamIns::new("x", int())], Some(int())),
            func(vec![ParamIns::new("self", s.clone()), ParamIns::new("x", int())], None),
            s,
            t,
            TypeKind::Nil,
        ];
        for k in &kinds {
            assert!(check(&arena, k, k), "{} not compatible with itself", k.to_str());
        }
    }

    #[test]
    fn test_prim_table() {
        let arena = Arena::default();
        let i64k: TypeKind = PrimKind::I64.into();
        let u32k: TypeKind = PrimKind::U32.into();
        let i32k: TypeKind = PrimKind::I32.into();
        assert!(check(&arena, &i64k, &u32k));
        assert!(!check(&arena, &i32k, &u32k));
        assert!(!check(&arena, &u32k, &i32k));
        assert!(check(&arena, &PrimKind::Any.into(), &PrimKind::Str.into()));
        assert!(check(&arena, &PrimKind::F64.into(), &PrimKind::F32.into()));
    }

    #[test]
    fn test_nil_sources() {
        let arena = Arena::default();
        assert!(check(&arena, &TypeKind::slice(int()), &TypeKind::Nil));
        assert!(check(&arena, &TypeKind::pointer(int()), &TypeKind::Nil));
        assert!(!check(&arena, &TypeKind::array(int(), 2), &TypeKind::Nil));
        assert!(!check(&arena, &int(), &TypeKind::Nil));
    }

    #[test]
    fn test_arrays_need_equal_length() {
        let arena = Arena::default();
        assert!(!check(&arena, &TypeKind::array(int(), 2), &TypeKind::array(int(), 3)));
    }

    #[test]
    fn test_unsafe_pointer_accepts_any_pointer() {
        let arena = Arena::default();
        assert!(check(&arena, &TypeKind::Ptr(None), &TypeKind::pointer(PrimKind::Str.into())));
        assert!(!check(&arena, &TypeKind::pointer(int()), &TypeKind::Ptr(None)));
    }

    #[test]
    fn test_reference_deref_mode() {
        let arena = Arena::default();
        let r = TypeKind::reference(int());
        assert!(!check(&arena, &r, &int()));
        let mut deref = TypeCompatibilityChecker::new(&arena, 64).with_deref(true);
        assert!(deref.check(&r, &int()));
        // A reference source flows into a plain destination.
        assert!(check(&arena, &int(), &r));
    }

    #[test]
    fn test_deref_not_propagated() {
        let arena = Arena::default();
        let dest = TypeKind::slice(TypeKind::reference(int()));
        let mut deref = TypeCompatibilityChecker::new(&arena, 64).with_deref(true);
        assert!(!deref.check(&dest, &TypeKind::slice(int())));
    }

    #[test]
    fn test_trait_destination() {
        let (arena, s, t) = arena_with_trait(false);
        assert!(check(&arena, &t, &s));
        assert!(check(&arena, &t, &TypeKind::reference(s)));
        assert!(check(&arena, &t, &TypeKind::Nil));
        assert!(!check(&arena, &t, &int()));
    }

    #[test]
    fn test_trait_reference_receiver_needs_reference() {
        let (arena, s, t) = arena_with_trait(true);
        let mut checker = TypeCompatibilityChecker::new(&arena, 64);
        assert!(!checker.check(&t, &s));
        assert_eq!(checker.error(), Some(ErrorKind::TraitHasReferenceParameteredFunction));
        assert!(checker.check(&t, &TypeKind::reference(s)));
        assert_eq!(checker.error(), None);
    }

    #[test]
    fn test_struct_generics_must_match() {
        let mut arena = Arena::default();
        let id = arena.add_struct("Box", Span::default(), vec!["T".into()]);
        let of = |k: TypeKind| {
            TypeKind::Struct(StructIns {
                decl: id,
                ident: "Box".into(),
                generics: vec![k],
            })
        };
        assert!(check(&arena, &of(int()), &of(int())));
        assert!(!check(&arena, &of(int()), &of(PrimKind::Str.into())));
    }

    #[test]
    fn test_fn_shapes() {
        let arena = Arena::default();
        let unary = func(vec![ParamIns::new("x", int())], Some(int()));
        let void = func(vec![ParamIns::new("x", int())], None);
        let binary = func(vec![ParamIns::new("x", int()), ParamIns::new("y", int())], Some(int()));
        let renamed = func(vec![ParamIns::new("y", int())], Some(int()));
        assert!(!check(&arena, &unary, &void));
        assert!(!check(&arena, &unary, &binary));
        assert!(check(&arena, &unary, &renamed));
        assert!(check(&arena, &unary, &TypeKind::Nil));
    }

    #[test]
    fn test_sema_logs_incompatible() {
        let mut sema = Sema::default();
        assert!(!sema.check_type_compatibility(&int(), &PrimKind::Str.into(), Span::new(1, 2), false));
        let d = sema.diagnostics.find(ErrorKind::IncompatibleTypes).unwrap();
        assert_eq!(d.args, vec!["int".to_string(), "str".to_string()]);
    }
}
