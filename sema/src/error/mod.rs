//! Error types and reporting
//!
//! Two families live here. `SemaError` covers hard failures of the host
//! side (reading configuration, loading a message catalog). Problems found in
//! the analyzed program are never errors in the Rust sense: they are
//! `Diagnostic` records appended to a `Diagnostics` log while analysis keeps
//! going.

pub mod catalog;

use crate::ast::Span;
use serde::Serialize;
use thiserror::Error;

pub use catalog::Catalog;

/// Result type alias
pub type Result<T> = std::result::Result<T, SemaError>;

/// Hard failure outside of program analysis
#[derive(Debug, Error)]
pub enum SemaError {
    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("Catalog error: {message}")]
    Catalog { message: String },

    #[error("Catalog has no message for `{key}`")]
    MissingMessage { key: String },
}

impl SemaError {
    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn catalog_error(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }
}

macro_rules! error_kinds {
    ($($variant:ident => $key:literal,)*) => {
        /// Kind of a user-facing diagnostic
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum ErrorKind {
            $($variant,)*
        }

        impl ErrorKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [ErrorKind] = &[$(ErrorKind::$variant,)*];

            /// Stable catalog key.
            pub fn key(self) -> &'static str {
                match self {
                    $(ErrorKind::$variant => $key,)*
                }
            }

            pub fn from_key(key: &str) -> Option<ErrorKind> {
                match key {
                    $($key => Some(ErrorKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

error_kinds! {
    // Shape errors
    IncompatibleTypes => "incompatible_types",
    ArgumentOverflow => "argument_overflow",
    MissingExprFor => "missing_expr_for",
    MoreArgsWithVariadiced => "more_args_with_variadiced",
    VariadicWithNonVariadicable => "variadic_with_non_variadicable",
    ArgumentMustTargetToField => "argument_must_target_to_field",
    AlreadyHasExpr => "already_has_expr",
    InvalidSyntax => "invalid_syntax",
    InvalidExpr => "invalid_expr",
    IdentNotExist => "ident_not_exist",
    DuplicatedIdent => "duplicated_ident",
    TupleAssignToSingle => "tuple_assign_to_single",
    BuiltinAsAnonymousFn => "builtin_as_anonymous_fn",
    MethodAsAnonymousFn => "method_as_anonymous_fn",
    GenericedFnAsAnonymousFn => "genericed_fn_as_anonymous_fn",
    MethodNotInvoked => "method_not_invoked",
    NotFunctionCall => "not_function_call",
    ExprNotFuncCall => "expr_not_func_call",
    IterRangeRequireEnumerableExpr => "iter_range_require_enumerable_expr",
    IterWhileRequireBoolExpr => "iter_while_require_bool_expr",
    IfRequireBoolExpr => "if_require_bool_expr",
    RequireRetExpr => "require_ret_expr",
    VoidFunctionRetExpr => "void_function_ret_expr",
    OverflowRet => "overflow_ret",
    MissingMultiRet => "missing_multi_ret",
    MissingMultiAssignIdents => "missing_multi_assign_idents",
    OverflowMultiAssignIdents => "overflow_multi_assign_idents",
    MissingType => "missing_type",
    MissingReceiver => "missing_receiver",
    VariadicParameterNotLast => "variadic_parameter_not_last",
    MissingAutotypeValue => "missing_autotype_value",
    NilForAutotype => "nil_for_autotype",
    VoidForAutotype => "void_for_autotype",
    NotSupportsIndexing => "not_supports_indexing",
    UnsafePtrIndexing => "unsafe_ptr_indexing",
    ObjNotSupportSubFields => "obj_not_support_sub_fields",
    ObjHaveNotIdent => "obj_have_not_ident",
    EnumHaveNotField => "enum_have_not_field",
    OperatorNotForType => "operator_not_for_type",
    LogicalNotBool => "logical_not_bool",
    ModuloWithNotInt => "modulo_with_not_int",
    DivideByZero => "divide_by_zero",
    TypeNotSupportsCastingTo => "type_not_supports_casting_to",
    ImplBaseNotExist => "impl_base_not_exist",
    ImplDestNotExist => "impl_dest_not_exist",
    StructAlreadyHaveIdent => "struct_already_have_ident",
    NotImplTraitDef => "not_impl_trait_def",

    // Type expressions
    RefRefsRef => "ref_refs_ref",
    RefRefsPtr => "ref_refs_ptr",
    RefRefsArray => "ref_refs_array",
    RefRefsEnum => "ref_refs_enum",
    PtrPointsRef => "ptr_points_ref",
    PtrPointsEnum => "ptr_points_enum",
    ArrayAutoSized => "array_auto_sized",
    ArraySizeIsNotInt => "array_size_is_not_int",
    ArraySizeIsNegative => "array_size_is_negative",
    ExprNotConst => "expr_not_const",
    ConstVarNotHaveExpr => "const_var_not_have_expr",
    MissingGenerics => "missing_generics",
    GenericsOverflow => "generics_overflow",
    NotHasGenerics => "not_has_generics",
    TypeNotSupportsGenerics => "type_not_supports_generics",

    // Constraint errors
    DynamicTypeAnnotationFailed => "dynamic_type_annotation_failed",
    EnumNotSupportsAsGeneric => "enum_not_supports_as_generic",
    TraitHasReferenceParameteredFunction => "trait_has_reference_parametered_function",
    RefMethodUsedWithNotRefInstance => "ref_method_used_with_not_ref_instance",

    // Value errors
    OverflowLimits => "overflow_limits",
    AssignRequireLvalue => "assign_require_lvalue",
    AssignConst => "assign_const",
    AssignmentToNonMut => "assignment_to_non_mut",
    AssignmentNonMutToMut => "assignment_non_mut_to_mut",
    RetWithMutTypedNonMut => "ret_with_mut_typed_non_mut",
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One user-facing problem: where, what, and the message arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub span: Span,
    pub kind: ErrorKind,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn new(span: Span, kind: ErrorKind, args: Vec<String>) -> Self {
        Self { span, kind, args }
    }

    /// Message text from the built-in catalog.
    pub fn message(&self) -> String {
        catalog::global().format(self.kind, &self.args)
    }
}

/// Ordered, append-only diagnostic log of one analysis session
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    limit: Option<usize>,
    dropped: usize,
}

impl Diagnostics {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            limit,
            dropped: 0,
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.limit.is_some_and(|limit| self.entries.len() >= limit) {
            self.dropped += 1;
            return;
        }
        tracing::trace!(kind = diagnostic.kind.key(), span = %diagnostic.span, "diagnostic");
        self.entries.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of diagnostics discarded after the limit was reached.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.entries.iter().map(|d| d.kind).collect()
    }

    pub fn has(&self, kind: ErrorKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn find(&self, kind: ErrorKind) -> Option<&Diagnostic> {
        self.entries.iter().find(|d| d.kind == kind)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Render a diagnostic with ariadne into a plain (uncolored) string.
pub fn render(filename: &str, source: &str, diagnostic: &Diagnostic) -> String {
    use ariadne::{Config, Label, Report, ReportKind, Source};

    let span: std::ops::Range<usize> = diagnostic.span.into();
    let message = diagnostic.message();
    let report = Report::build(ReportKind::Error, (filename, span.clone()))
        .with_config(Config::default().with_color(false))
        .with_code(diagnostic.kind.key())
        .with_message(&message)
        .with_label(Label::new((filename, span)).with_message(&message))
        .finish();

    let mut out = Vec::new();
    match report.write((filename, Source::from(source)), &mut out) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => format!("error[{}]: {message}", diagnostic.kind.key()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_key(kind.key()), Some(*kind));
        }
        assert_eq!(ErrorKind::from_key("no_such_error"), None);
    }

    #[test]
    fn test_limit_drops_extra_diagnostics() {
        let mut log = Diagnostics::new(Some(2));
        for _ in 0..4 {
            log.push(Diagnostic::new(Span::default(), ErrorKind::ArgumentOverflow, vec![]));
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.dropped(), 2);
    }

    #[test]
    fn test_message_uses_arguments() {
        let d = Diagnostic::new(
            Span::new(0, 1),
            ErrorKind::IncompatibleTypes,
            vec!["int".into(), "str".into()],
        );
        insta::assert_snapshot!(d.message(), @"int and str types are not compatible");
    }

    #[test]
    fn test_render_contains_code_and_message() {
        let source = "let x: int = \"hi\"";
        let d = Diagnostic::new(
            Span::new(13, 17),
            ErrorKind::IncompatibleTypes,
            vec!["int".into(), "str".into()],
        );
        let out = render("main.src", source, &d);
        assert!(out.contains("incompatible_types"));
        assert!(out.contains("int and str types are not compatible"));
        assert!(out.contains("main.src"));
    }

    #[test]
    fn test_sema_error_display() {
        let err = SemaError::MissingMessage {
            key: "overflow_ret".into(),
        };
        assert_eq!(err.to_string(), "Catalog has no message for `overflow_ret`");
        assert!(SemaError::invalid_config("bad").to_string().contains("bad"));
    }
}
