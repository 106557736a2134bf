//! Type expression resolution

use crate::ast::{Spanned, TypeDecl};
use crate::decl::{EnumRef, FnIns, ParamIns, StructIns, TraitRef};
use crate::error::ErrorKind;
use crate::sema::{Sema, Symbol, STACK_GROW_SIZE, STACK_RED_ZONE};
use crate::types::{PrimKind, TypeKind};

impl Sema {
    /// Resolve a type expression. Reports and returns `None` on failure.
    pub fn resolve_type(&mut self, decl: &Spanned<TypeDecl>) -> Option<TypeKind> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.resolve_type_inner(decl))
    }

    fn resolve_type_inner(&mut self, decl: &Spanned<TypeDecl>) -> Option<TypeKind> {
        let span = decl.span;
        match &decl.node {
            TypeDecl::Ident { name, generics } => self.resolve_ident(name, generics, span),

            TypeDecl::Ref(elem) => {
                let elem = self.resolve_type(elem)?;
                let invalid = match &elem {
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
                Some(TypeKind::reference(elem))
            }

            TypeDecl::Ptr(None) => Some(TypeKind::Ptr(None)),
            TypeDecl::Ptr(Some(elem)) => {
                let elem = self.resolve_type(elem)?;
                let invalid = match &elem {
                    TypeKind::Ref(_) => Some(ErrorKind::PtrPointsRef),
                    TypeKind::Enum(_) => Some(ErrorKind::PtrPointsEnum),
                    _ => None,
                };
                if let Some(kind) = invalid {
                    self.push_err(span, kind);
                    return None;
                }
                Some(TypeKind::pointer(elem))
            }

            TypeDecl::Slice(elem) => self.resolve_type(elem).map(TypeKind::slice),

            TypeDecl::Array { elem, size } => {
                let elem = self.resolve_type(elem);
                let Some(size) = size else {
                    self.push_err(span, ErrorKind::ArrayAutoSized);
                    return None;
                };
                let n = self.eval_array_size(size)?;
                Some(TypeKind::array(elem?, n))
            }

            TypeDecl::Map { key, val } => {
                let key = self.resolve_type(key);
                let val = self.resolve_type(val);
                Some(TypeKind::map_of(key?, val?))
            }

            TypeDecl::Tuple(types) => {
                let mut out = Vec::with_capacity(types.len());
                let mut ok = true;
                for t in types {
                    match self.resolve_type(t) {
                        Some(kind) => out.push(kind),
                        None => ok = false,
                    }
                }
                ok.then_some(TypeKind::Tuple(out))
            }

            TypeDecl::Fn(f) => {
                if let Some(g) = f.generics.first() {
                    self.push_err_args(g.span, ErrorKind::TypeNotSupportsGenerics, vec!["fn".into()]);
                    return None;
                }
                let params = self.resolve_params(&f.params, &TypeKind::Void)?;
                let result = match &f.result {
                    Some(r) => Some(self.resolve_type(&r.ty)?),
                    None => None,
                };
                Some(TypeKind::Fn(Box::new(FnIns {
                    unsafety: f.unsafety,
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
                    ..FnIns::default()
                })))
            }
        }
    }

    fn resolve_ident(
        &mut self,
        name: &str,
        generics: &[Spanned<TypeDecl>],
        span: crate::ast::Span,
    ) -> Option<TypeKind> {
        let no_generics = |sema: &mut Self, kind: TypeKind| {
            if generics.is_empty() {
                Some(kind)
            } else {
                sema.push_err_args(span, ErrorKind::TypeNotSupportsGenerics, vec![name.to_string()]);
                None
            }
        };

        if let Some(p) = PrimKind::from_name(name) {
            return no_generics(self, p.into());
        }
        if let Some((_, bound)) = self.generic_env.iter().rev().find(|(g, _)| g == name) {
            let bound = bound.clone();
            return no_generics(self, bound);
        }
        if self.template_generics.iter().any(|g| g == name) {
            return no_generics(self, TypeKind::Generic(name.to_string()));
        }

        match self.lookup(name) {
            Some(Symbol::Struct(id)) => {
                let expected = self.arena.strct(id).generics.len();
                if expected == 0 && !generics.is_empty() {
                    self.push_err_args(span, ErrorKind::TypeNotSupportsGenerics, vec![name.to_string()]);
                    return None;
                }
                if generics.len() < expected {
                    self.push_err(span, ErrorKind::MissingGenerics);
                    return None;
                }
                if generics.len() > expected {
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
                let ins = StructIns {
                    decl: id,
                    ident: name.to_string(),
                    generics: bound,
                };
                if !ins.generics.iter().any(TypeKind::has_generics) {
                    self.arena.strct_mut(id).append_instance(ins.clone());
                }
                Some(TypeKind::Struct(ins))
            }
            Some(Symbol::Trait(id)) => no_generics(
                self,
                TypeKind::Trait(TraitRef {
                    decl: id,
                    ident: name.to_string(),
                }),
            ),
            Some(Symbol::Enum(id)) => no_generics(
                self,
                TypeKind::Enum(EnumRef {
                    decl: id,
                    ident: name.to_string(),
                }),
            ),
            _ => {
                self.push_err_args(span, ErrorKind::IdentNotExist, vec![name.to_string()]);
                None
            }
        }
    }

    fn eval_array_size(&mut self, size: &Spanned<crate::ast::Expr>) -> Option<usize> {
        let d = self.eval_expr(size, None)?;
        let Some(value) = d.constant.as_ref() else {
            self.push_err(size.span, ErrorKind::ExprNotConst);
            return None;
        };
        let int_kind = d.kind.prim().is_some_and(PrimKind::is_int);
        let Some(n) = value.as_i128().filter(|_| int_kind && value.is_int()) else {
            self.push_err(size.span, ErrorKind::ArraySizeIsNotInt);
            return None;
        };
        if n < 0 {
            self.push_err(size.span, ErrorKind::ArraySizeIsNegative);
            return None;
        }
        match usize::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                self.push_err(size.span, ErrorKind::OverflowLimits);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expr, Lit, Span, Spanned, TypeDecl, UnaryOp};
    use crate::error::ErrorKind;
    use crate::sema::Sema;

    fn sp(t: TypeDecl) -> Spanned<TypeDecl> {
        Spanned::new(t, Span::new(0, 1))
    }

    fn resolve(sema: &mut Sema, t: TypeDecl) -> Option<String> {
        sema.resolve_type(&sp(t)).map(|k| k.to_str())
    }

    fn array(elem: TypeDecl, size: Option<Expr>) -> TypeDecl {
        TypeDecl::Array {
            elem: Box::new(Spanned::synthetic(elem)),
            size: size.map(|e| Box::new(Spanned::synthetic(e))),
        }
    }

    #[test]
    fn test_resolve_composites() {
        let mut sema = Sema::default();
        let m = TypeDecl::map(TypeDecl::ident("str"), TypeDecl::slice(TypeDecl::ident("u8")));
        assert_eq!(resolve(&mut sema, m), Some("[str:[]u8]".into()));
        assert_eq!(resolve(&mut sema, TypeDecl::Ptr(None)), Some("*unsafe".into()));
        assert_eq!(
            resolve(&mut sema, array(TypeDecl::ident("int"), Some(Expr::Lit(Lit::Int(4))))),
            Some("[4]int".into())
        );
        assert!(sema.diagnostics.is_empty());
    }

    #[test]
    fn test_reference_validity() {
        let mut sema = Sema::default();
        let rr = TypeDecl::reference(TypeDecl::reference(TypeDecl::ident("int")));
        assert_eq!(resolve(&mut sema, rr), None);
        let rp = TypeDecl::reference(TypeDecl::ptr(TypeDecl::ident("int")));
        assert_eq!(resolve(&mut sema, rp), None);
        let pr = TypeDecl::ptr(TypeDecl::reference(TypeDecl::ident("int")));
        assert_eq!(resolve(&mut sema, pr), None);
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![ErrorKind::RefRefsRef, ErrorKind::RefRefsPtr, ErrorKind::PtrPointsRef]
        );
    }

    #[test]
    fn test_array_size_rules() {
        let mut sema = Sema::default();
        assert_eq!(resolve(&mut sema, array(TypeDecl::ident("int"), None)), None);
        let neg = Expr::Unary {
            op: UnaryOp::Neg,
            expr: Box::new(Spanned::synthetic(Expr::Lit(Lit::Int(1)))),
        };
        assert_eq!(resolve(&mut sema, array(TypeDecl::ident("int"), Some(neg))), None);
        let text = Expr::Lit(Lit::Str("3".into()));
        assert_eq!(resolve(&mut sema, array(TypeDecl::ident("int"), Some(text))), None);
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![
                ErrorKind::ArrayAutoSized,
                ErrorKind::ArraySizeIsNegative,
                ErrorKind::ArraySizeIsNotInt
            ]
        );
    }

    #[test]
    fn test_unknown_and_generic_misuse() {
        let mut sema = Sema::default();
        assert_eq!(resolve(&mut sema, TypeDecl::ident("Nope")), None);
        let generic_prim = TypeDecl::Ident {
            name: "int".into(),
            generics: vec![sp(TypeDecl::ident("str"))],
        };
        assert_eq!(resolve(&mut sema, generic_prim), None);
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![ErrorKind::IdentNotExist, ErrorKind::TypeNotSupportsGenerics]
        );
    }

    #[test]
    fn test_template_and_bound_generics() {
        let mut sema = Sema::default();
        sema.template_generics = vec!["T".into()];
        assert_eq!(resolve(&mut sema, TypeDecl::slice(TypeDecl::ident("T"))), Some("[]T".into()));
        sema.template_generics.clear();
        sema.generic_env = vec![("T".into(), crate::types::PrimKind::Str.into())];
        assert_eq!(resolve(&mut sema, TypeDecl::slice(TypeDecl::ident("T"))), Some("[]str".into()));
    }
}
