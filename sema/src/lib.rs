//! Semantic analysis core of a statically typed compiler front end.
//!
//! The parser hands over a [`ast::Package`]; [`Sema::check_package`] resolves
//! every type expression, validates assignments, calls, literals, iterations
//! and returns, and monomorphizes generic functions into instances. Problems
//! in the analyzed program become [`Diagnostic`] records; analysis never stops
//! at the first one.
//!
//! ```no_run
//! use sema::{ast::Package, Sema, SemaConfig};
//!
//! let pkg = Package::default();
//! let mut sema = Sema::new(SemaConfig::default());
//! if !sema.check_package(&pkg) {
//!     for d in &sema.diagnostics {
//!         eprintln!("{}", sema::error::render("main.src", "", d));
//!     }
//! }
//! ```

pub mod ast;
pub mod config;
pub mod constant;
pub mod data;
pub mod decl;
pub mod error;
pub mod ir;
pub mod types;

mod assign;
mod call;
mod compat;
mod eval;
mod infer;
mod range;
mod resolve;
mod ret;
mod scope;
mod sema;
mod struct_lit;

pub use ast::Span;
pub use compat::TypeCompatibilityChecker;
pub use config::SemaConfig;
pub use error::{Diagnostic, Diagnostics, ErrorKind, Result, SemaError};
pub use infer::{AnnotateError, DynamicTypeAnnotation};
pub use sema::{Sema, Symbol, Var};
