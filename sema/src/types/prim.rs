//! Primitive types and their numeric limits

use serde::Serialize;

/// Primitive type kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrimKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// Platform-sized signed integer
    Int,
    /// Platform-sized unsigned integer
    Uint,
    Uintptr,
    Bool,
    Str,
    /// Accepts values of every type
    Any,
}

impl PrimKind {
    pub const ALL: &'static [PrimKind] = &[
        PrimKind::I8,
        PrimKind::I16,
        PrimKind::I32,
        PrimKind::I64,
        PrimKind::U8,
        PrimKind::U16,
        PrimKind::U32,
        PrimKind::U64,
        PrimKind::F32,
        PrimKind::F64,
        PrimKind::Int,
        PrimKind::Uint,
        PrimKind::Uintptr,
        PrimKind::Bool,
        PrimKind::Str,
        PrimKind::Any,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimKind::I8 => "i8",
            PrimKind::I16 => "i16",
            PrimKind::I32 => "i32",
            PrimKind::I64 => "i64",
            PrimKind::U8 => "u8",
            PrimKind::U16 => "u16",
            PrimKind::U32 => "u32",
            PrimKind::U64 => "u64",
            PrimKind::F32 => "f32",
            PrimKind::F64 => "f64",
            PrimKind::Int => "int",
            PrimKind::Uint => "uint",
            PrimKind::Uintptr => "uintptr",
            PrimKind::Bool => "bool",
            PrimKind::Str => "str",
            PrimKind::Any => "any",
        }
    }

    pub fn is_sig_int(self) -> bool {
        matches!(
            self,
            PrimKind::I8 | PrimKind::I16 | PrimKind::I32 | PrimKind::I64 | PrimKind::Int
        )
    }

    pub fn is_unsig_int(self) -> bool {
        matches!(
            self,
            PrimKind::U8
                | PrimKind::U16
                | PrimKind::U32
                | PrimKind::U64
                | PrimKind::Uint
                | PrimKind::Uintptr
        )
    }

    pub fn is_int(self) -> bool {
        self.is_sig_int() || self.is_unsig_int()
    }

    pub fn is_float(self) -> bool {
        matches!(self, PrimKind::F32 | PrimKind::F64)
    }

    pub fn is_num(self) -> bool {
        self.is_int() || self.is_float()
    }

    /// Bit width; `int`, `uint` and `uintptr` follow `arch_bits`.
    pub fn bit_size(self, arch_bits: u32) -> u32 {
        match self {
            PrimKind::I8 | PrimKind::U8 | PrimKind::Bool => 8,
            PrimKind::I16 | PrimKind::U16 => 16,
            PrimKind::I32 | PrimKind::U32 | PrimKind::F32 => 32,
            PrimKind::I64 | PrimKind::U64 | PrimKind::F64 => 64,
            PrimKind::Int | PrimKind::Uint | PrimKind::Uintptr => arch_bits,
            PrimKind::Str | PrimKind::Any => 0,
        }
    }

    /// Smallest value of an integer kind.
    pub fn min(self, arch_bits: u32) -> Option<i128> {
        let bits = self.bit_size(arch_bits);
        if self.is_sig_int() {
            Some(-(1i128 << (bits - 1)))
        } else if self.is_unsig_int() {
            Some(0)
        } else {
            None
        }
    }

    /// Largest value of an integer kind.
    pub fn max(self, arch_bits: u32) -> Option<i128> {
        let bits = self.bit_size(arch_bits);
        if self.is_sig_int() {
            Some((1i128 << (bits - 1)) - 1)
        } else if self.is_unsig_int() {
            Some((1i128 << bits) - 1)
        } else {
            None
        }
    }
}

impl std::fmt::Display for PrimKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reports whether the decimal `text` is representable as a finite float
/// of `bits` width.
pub fn check_bit_float(text: &str, bits: u32) -> bool {
    match bits {
        32 => text.parse::<f32>().is_ok_and(f32::is_finite),
        64 => text.parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

/// Primitive compatibility table: may a `src` value flow into `dest`?
pub fn types_are_compatible(dest: PrimKind, src: PrimKind, arch_bits: u32) -> bool {
    if dest == src || dest == PrimKind::Any {
        return true;
    }

    let dest_bits = dest.bit_size(arch_bits);
    let src_bits = src.bit_size(arch_bits);
    if dest.is_sig_int() {
        (src.is_sig_int() && src_bits <= dest_bits) || (src.is_unsig_int() && src_bits < dest_bits)
    } else if dest.is_unsig_int() {
        src.is_unsig_int() && src_bits <= dest_bits
    } else if dest == PrimKind::F64 {
        src == PrimKind::F32
    } else {
        false
    }
}
