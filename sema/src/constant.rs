//! Compile-time constant values

use crate::ast::BinOp;

/// Value of an expression known at compile time.
///
/// Integer constants keep their source category: non-negative literals that
/// do not fit `i64` are `U64`, everything else integral is `I64`.
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Str(String),
}

/// Why folding two constants failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldError {
    DivideByZero,
    Overflow,
    /// Operator does not apply to these operands
    Unsupported,
}

impl Const {
    pub fn from_u64(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Const::I64(i),
            Err(_) => Const::U64(v),
        }
    }

    pub fn is_num(&self) -> bool {
        matches!(self, Const::I64(_) | Const::U64(_) | Const::F64(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Const::I64(_) | Const::U64(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Const::I64(v) => Some(*v as f64),
            Const::U64(v) => Some(*v as f64),
            Const::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Exact integer value; floats only when they have no fractional part.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Const::I64(v) => Some(i128::from(*v)),
            Const::U64(v) => Some(i128::from(*v)),
            Const::F64(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i128),
            _ => None,
        }
    }

    fn from_i128(v: i128) -> Option<Self> {
        if let Ok(i) = i64::try_from(v) {
            Some(Const::I64(i))
        } else {
            u64::try_from(v).ok().map(Const::U64)
        }
    }

    pub fn neg(&self) -> Option<Const> {
        match self {
            Const::F64(v) => Some(Const::F64(-v)),
            c if c.is_int() => c.as_i128().and_then(|v| Const::from_i128(-v)),
            _ => None,
        }
    }

    pub fn not(&self) -> Option<Const> {
        match self {
            Const::Bool(b) => Some(Const::Bool(!b)),
            _ => None,
        }
    }

    /// Fold `self op rhs`.
    pub fn fold(&self, op: BinOp, rhs: &Const) -> Result<Const, FoldError> {
        match (self, rhs) {
            (Const::Bool(a), Const::Bool(b)) => match op {
                BinOp::And => Ok(Const::Bool(*a && *b)),
                BinOp::Or => Ok(Const::Bool(*a || *b)),
                BinOp::Eq => Ok(Const::Bool(a == b)),
                BinOp::Ne => Ok(Const::Bool(a != b)),
                _ => Err(FoldError::Unsupported),
            },
            (Const::Str(a), Const::Str(b)) => match op {
                BinOp::Add => Ok(Const::Str(format!("{a}{b}"))),
                BinOp::Eq => Ok(Const::Bool(a == b)),
                BinOp::Ne => Ok(Const::Bool(a != b)),
                _ => Err(FoldError::Unsupported),
            },
            (a, b) if a.is_int() && b.is_int() => {
                let (Some(x), Some(y)) = (a.as_i128(), b.as_i128()) else {
                    return Err(FoldError::Unsupported);
                };
                fold_int(x, op, y)
            }
            (a, b) if a.is_num() && b.is_num() => {
                let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
                    return Err(FoldError::Unsupported);
                };
                fold_float(x, op, y)
            }
            _ => Err(FoldError::Unsupported),
        }
    }
}

fn fold_int(x: i128, op: BinOp, y: i128) -> Result<Const, FoldError> {
    let value = match op {
        BinOp::Add => x.checked_add(y),
        BinOp::Sub => x.checked_sub(y),
        BinOp::Mul => x.checked_mul(y),
        BinOp::Div | BinOp::Mod if y == 0 => return Err(FoldError::DivideByZero),
        BinOp::Div => x.checked_div(y),
        BinOp::Mod => x.checked_rem(y),
        BinOp::Eq => return Ok(Const::Bool(x == y)),
        BinOp::Ne => return Ok(Const::Bool(x != y)),
        BinOp::Lt => return Ok(Const::Bool(x < y)),
        BinOp::Le => return Ok(Const::Bool(x <= y)),
        BinOp::Gt => return Ok(Const::Bool(x > y)),
        BinOp::Ge => return Ok(Const::Bool(x >= y)),
        BinOp::And | BinOp::Or => return Err(FoldError::Unsupported),
    };
    value
        .and_then(Const::from_i128)
        .ok_or(FoldError::Overflow)
}

fn fold_float(x: f64, op: BinOp, y: f64) -> Result<Const, FoldError> {
    match op {
        BinOp::Add => Ok(Const::F64(x + y)),
        BinOp::Sub => Ok(Const::F64(x - y)),
        BinOp::Mul => Ok(Const::F64(x * y)),
        BinOp::Div if y == 0.0 => Err(FoldError::DivideByZero),
        BinOp::Div => Ok(Const::F64(x / y)),
        BinOp::Eq => Ok(Const::Bool(x == y)),
        BinOp::Ne => Ok(Const::Bool(x != y)),
        BinOp::Lt => Ok(Const::Bool(x < y)),
        BinOp::Le => Ok(Const::Bool(x <= y)),
        BinOp::Gt => Ok(Const::Bool(x > y)),
        BinOp::Ge => Ok(Const::Bool(x >= y)),
        BinOp::Mod | BinOp::And | BinOp::Or => Err(FoldError::Unsupported),
    }
}

impl std::fmt::Display for Const {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Const::I64(v) => write!(f, "{v}"),
            Const::U64(v) => write!(f, "{v}"),
            Const::F64(v) => write!(f, "{v}"),
            Const::Bool(v) => write!(f, "{v}"),
            Const::Str(v) => write!(f, "{v:?}"),
        }
    }
}
