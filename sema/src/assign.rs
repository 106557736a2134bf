//! Assignment checking and constant narrowing

use crate::ast::Span;
use crate::constant::Const;
use crate::data::Data;
use crate::error::ErrorKind;
use crate::sema::Sema;
use crate::types::{prim, PrimKind, TypeKind};

/// Outcome of narrowing a constant into a numeric destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Narrowing {
    /// Not a numeric constant or not a numeric destination
    NotApplicable,
    Fits,
    Overflow,
}

/// Narrow `value` into the numeric primitive `dest`.
pub(crate) fn narrow_const(dest: PrimKind, value: &Const, arch_bits: u32) -> Narrowing {
    if !value.is_num() {
        return Narrowing::NotApplicable;
    }

    if dest.is_float() {
        let Some(v) = value.as_f64() else {
            return Narrowing::NotApplicable;
        };
        let text = format!("{v:e}");
        return if prim::check_bit_float(&text, dest.bit_size(arch_bits)) {
            Narrowing::Fits
        } else {
            Narrowing::Overflow
        };
    }

    if dest.is_int() {
        let (Some(min), Some(max)) = (dest.min(arch_bits), dest.max(arch_bits)) else {
            return Narrowing::NotApplicable;
        };
        // Fractional floats have no exact integer value.
        return match value.as_i128() {
            Some(v) if min <= v && v <= max => Narrowing::Fits,
            _ => Narrowing::Overflow,
        };
    }

    Narrowing::NotApplicable
}

impl Sema {
    /// Check `data` for assignment, initialization or return into `dest`.
    /// Logs exactly one diagnostic on failure.
    pub fn check_assign_type(&mut self, dest: &TypeKind, data: &Data, span: Span, deref: bool) -> bool {
        if !self.check_validity(data, span) {
            return false;
        }
        if data.variadiced {
            self.push_err_args(
                span,
                ErrorKind::IncompatibleTypes,
                vec![dest.to_str(), format!("{}...", data.kind.to_str())],
            );
            return false;
        }
        match self.check_const(dest, data) {
            Narrowing::Fits => true,
            Narrowing::Overflow => {
                self.push_err(span, ErrorKind::OverflowLimits);
                false
            }
            Narrowing::NotApplicable => self.check_type_compatibility(dest, &data.kind, span, deref),
        }
    }

    /// Reject values that cannot stand alone: builtin, method and generic
    /// function values, and multi-value tuples.
    pub(crate) fn check_validity(&mut self, data: &Data, span: Span) -> bool {
        match &data.kind {
            TypeKind::Fn(f) => {
                let decl = f.decl.map(|id| self.arena.func(id));
                let kind = if f.builtin {
                    Some(ErrorKind::BuiltinAsAnonymousFn)
                } else if f.owner.is_some() || decl.is_some_and(|d| d.is_method()) {
                    Some(ErrorKind::MethodAsAnonymousFn)
                } else if decl.is_some_and(|d| !d.generics.is_empty()) {
                    Some(ErrorKind::GenericedFnAsAnonymousFn)
                } else {
                    None
                };
                match kind {
                    Some(kind) => {
                        self.push_err(span, kind);
                        false
                    }
                    None => true,
                }
            }
            TypeKind::Tuple(_) => {
                self.push_err(span, ErrorKind::TupleAssignToSingle);
                false
            }
            _ => true,
        }
    }

    pub(crate) fn check_const(&self, dest: &TypeKind, data: &Data) -> Narrowing {
        let (Some(value), Some(dest), Some(src)) = (&data.constant, dest.prim(), data.kind.prim()) else {
            return Narrowing::NotApplicable;
        };
        if !src.is_num() {
            return Narrowing::NotApplicable;
        }
        narrow_const(dest, value, self.arch_bits())
    }

    /// A mutable binding must not be initialized from an immutable value
    /// that shares mutable memory.
    pub(crate) fn check_validity_for_init_expr(&mut self, mutable: bool, dest: &TypeKind, data: &Data, span: Span) -> bool {
        if mutable && !data.mutable && self.arena.is_mut(dest) {
            self.push_err(span, ErrorKind::AssignmentNonMutToMut);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ExprModel;
    use crate::decl::FnIns;

    fn int_const(v: i64) -> Data {
        Data::constant(PrimKind::Int.into(), Const::I64(v))
    }

    #[test]
    fn test_narrow_int_ranges() {
        assert_eq!(narrow_const(PrimKind::I8, &Const::I64(127), 64), Narrowing::Fits);
        assert_eq!(narrow_const(PrimKind::I8, &Const::I64(128), 64), Narrowing::Overflow);
        assert_eq!(narrow_const(PrimKind::I8, &Const::I64(-128), 64), Narrowing::Fits);
        assert_eq!(narrow_const(PrimKind::U8, &Const::I64(-1), 64), Narrowing::Overflow);
        assert_eq!(narrow_const(PrimKind::U64, &Const::U64(u64::MAX), 64), Narrowing::Fits);
        assert_eq!(narrow_const(PrimKind::I64, &Const::U64(u64::MAX), 64), Narrowing::Overflow);
        assert_eq!(narrow_const(PrimKind::Int, &Const::I64(i64::from(i32::MAX) + 1), 32), Narrowing::Overflow);
    }

    #[test]
    fn test_narrow_float_into_int() {
        assert_eq!(narrow_const(PrimKind::I32, &Const::F64(3.0), 64), Narrowing::Fits);
        assert_eq!(narrow_const(PrimKind::I32, &Const::F64(3.5), 64), Narrowing::Overflow);
    }

    #[test]
    fn test_narrow_into_float() {
        assert_eq!(narrow_const(PrimKind::F32, &Const::I64(1), 64), Narrowing::Fits);
        assert_eq!(narrow_const(PrimKind::F32, &Const::F64(1e39), 64), Narrowing::Overflow);
        assert_eq!(narrow_const(PrimKind::F64, &Const::F64(1e39), 64), Narrowing::Fits);
        assert_eq!(narrow_const(PrimKind::F32, &Const::F64(f64::from(f32::MAX)), 64), Narrowing::Fits);
    }

    #[test]
    fn test_narrow_not_numeric() {
        assert_eq!(narrow_const(PrimKind::Int, &Const::Bool(true), 64), Narrowing::NotApplicable);
        assert_eq!(narrow_const(PrimKind::Str, &Const::I64(1), 64), Narrowing::NotApplicable);
    }

    #[test]
    fn test_const_overflow_single_diagnostic() {
        let mut sema = Sema::default();
        assert!(!sema.check_assign_type(&PrimKind::U8.into(), &int_const(300), Span::default(), false));
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::OverflowLimits]);
    }

    #[test]
    fn test_const_cross_category() {
        let mut sema = Sema::default();
        assert!(sema.check_assign_type(&PrimKind::F32.into(), &int_const(7), Span::default(), false));
        let whole = Data::constant(PrimKind::F64.into(), Const::F64(2.0));
        assert!(sema.check_assign_type(&PrimKind::U16.into(), &whole, Span::default(), false));
        assert!(sema.diagnostics.is_empty());
    }

    #[test]
    fn test_non_const_uses_compatibility() {
        let mut sema = Sema::default();
        let value = Data::new(PrimKind::I64.into(), ExprModel::Var("x".into()));
        assert!(!sema.check_assign_type(&PrimKind::I32.into(), &value, Span::default(), false));
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::IncompatibleTypes]);
    }

    #[test]
    fn test_variadiced_rejected() {
        let mut sema = Sema::default();
        let mut value = Data::new(TypeKind::slice(PrimKind::Int.into()), ExprModel::Var("xs".into()));
        value.variadiced = true;
        assert!(!sema.check_assign_type(&PrimKind::Int.into(), &value, Span::default(), false));
        assert_eq!(sema.diagnostics.as_slice()[0].args[1], "[]int...");
    }

    #[test]
    fn test_tuple_and_builtin_values() {
        let mut sema = Sema::default();
        let tuple = Data::new(
            TypeKind::Tuple(vec![PrimKind::Int.into(), PrimKind::Int.into()]),
            ExprModel::Var("t".into()),
        );
        assert!(!sema.check_assign_type(&PrimKind::Int.into(), &tuple, Span::default(), false));

        let builtin = Data::new(
            TypeKind::Fn(Box::new(FnIns {
                builtin: true,
                ..FnIns::default()
            })),
            ExprModel::Nil,
        );
        assert!(!sema.check_validity(&builtin, Span::default()));
        assert_eq!(
            sema.diagnostics.kinds(),
            vec![ErrorKind::TupleAssignToSingle, ErrorKind::BuiltinAsAnonymousFn]
        );
    }

    #[test]
    fn test_init_mutability() {
        let mut sema = Sema::default();
        let slice = TypeKind::slice(PrimKind::Int.into());
        let mut value = Data::new(slice.clone(), ExprModel::Var("xs".into()));
        value.mutable = false;
        assert!(sema.check_validity_for_init_expr(false, &slice, &value, Span::default()));
        assert!(!sema.check_validity_for_init_expr(true, &slice, &value, Span::default()));
        assert!(sema.check_validity_for_init_expr(true, &PrimKind::Int.into(), &value, Span::default()));
        assert_eq!(sema.diagnostics.kinds(), vec![ErrorKind::AssignmentNonMutToMut]);
    }
}
