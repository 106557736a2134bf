//! Generic type inference from call arguments

use tracing::trace;

use crate::types::TypeKind;

/// Why an argument could not annotate its parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotateError {
    /// Shapes differ, or a generic is already bound to another type
    Mismatch,
    /// An enum was offered as a generic binding
    EnumAsGeneric,
}

/// Binds generic parameters by walking a parameter type and a concrete
/// argument type in lockstep.
///
/// Bindings live in `slots`, one per name in `names`. The first binding of a
/// generic wins; later occurrences must render identically. Every matched
/// placeholder in the walked parameter type is overwritten with its binding,
/// so after a successful walk the parameter type is concrete wherever the
/// argument determined it.
pub struct DynamicTypeAnnotation<'a> {
    names: &'a [String],
    slots: &'a mut [Option<TypeKind>],
}

impl<'a> DynamicTypeAnnotation<'a> {
    pub fn new(names: &'a [String], slots: &'a mut [Option<TypeKind>]) -> Self {
        debug_assert_eq!(names.len(), slots.len());
        Self { names, slots }
    }

    pub fn annotate(&mut self, param: &mut TypeKind, arg: &TypeKind) -> Result<(), AnnotateError> {
        self.annotate_kind(param, arg)
    }

    fn annotate_kind(&mut self, slot: &mut TypeKind, k: &TypeKind) -> Result<(), AnnotateError> {
        if let TypeKind::Generic(name) = &*slot {
            if let Some(i) = self.names.iter().position(|n| n == name) {
                return self.bind(slot, i, k);
            }
        }
        if !slot.uses_generics(self.names) {
            return Ok(());
        }

        match (slot, k) {
            (TypeKind::Slc(p), TypeKind::Slc(e)) | (TypeKind::Ref(p), TypeKind::Ref(e)) => self.annotate_kind(p, e),
            (TypeKind::Ptr(Some(p)), TypeKind::Ptr(Some(e))) => self.annotate_kind(p, e),
            (TypeKind::Arr { elem: p, n }, TypeKind::Arr { elem: e, n: m }) if *n == *m => self.annotate_kind(p, e),
            (TypeKind::Map { key: pk, val: pv }, TypeKind::Map { key: ek, val: ev }) => {
                self.annotate_kind(pk, ek)?;
                self.annotate_kind(pv, ev)
            }
            (TypeKind::Tuple(ps), TypeKind::Tuple(es)) if ps.len() == es.len() => {
                for (p, e) in ps.iter_mut().zip(es) {
                    self.annotate_kind(p, e)?;
                }
                Ok(())
            }
            (TypeKind::Struct(ps), TypeKind::Struct(es)) if ps.decl == es.decl => {
                for (p, e) in ps.generics.iter_mut().zip(&es.generics) {
                    self.annotate_kind(p, e)?;
                }
                Ok(())
            }
            (TypeKind::Fn(pf), TypeKind::Fn(f)) => {
                if pf.params.len() != f.params.len() || pf.is_void() != f.is_void() {
                    return Err(AnnotateError::Mismatch);
                }
                for (pp, fp) in pf.params.iter_mut().zip(&f.params) {
                    self.annotate_kind(&mut pp.kind, &fp.kind)?;
                }
                match (&mut pf.result, &f.result) {
                    (Some(pr), Some(fr)) => self.annotate_kind(pr, fr),
                    _ => Ok(()),
                }
            }
            _ => Err(AnnotateError::Mismatch),
        }
    }

    fn bind(&mut self, slot: &mut TypeKind, i: usize, k: &TypeKind) -> Result<(), AnnotateError> {
        match &self.slots[i] {
            None => {
                if k.enm().is_some() {
                    return Err(AnnotateError::EnumAsGeneric);
                }
                trace!(generic = %self.names[i], kind = %k, "generic bound");
                self.slots[i] = Some(k.clone());
            }
            Some(bound) if bound.to_str() != k.to_str() => {
                trace!(generic = %self.names[i], bound = %bound, offered = %k, "generic mismatch");
                return Err(AnnotateError::Mismatch);
            }
            Some(_) => {}
        }
        *slot = k.clone();
        Ok(())
    }
}

/// Current bindings, unbound names kept as placeholders.
pub(crate) fn partial_bindings(names: &[String], slots: &[Option<TypeKind>]) -> Vec<TypeKind> {
    names
        .iter()
        .zip(slots)
        .map(|(n, s)| s.clone().unwrap_or_else(|| TypeKind::Generic(n.clone())))
        .collect()
}
