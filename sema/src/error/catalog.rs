//! Diagnostic message catalog

use std::collections::HashMap;
use std::sync::OnceLock;

use super::{ErrorKind, Result, SemaError};

const BUILTIN: &str = include_str!("catalog.toml");

static GLOBAL: OnceLock<Catalog> = OnceLock::new();

/// Immutable mapping from error kind to message template
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<ErrorKind, String>,
}

impl Catalog {
    /// Parse a flat TOML table of `key = "template"` pairs.
    ///
    /// Every `ErrorKind` must be covered; unknown keys are rejected.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let table: HashMap<String, String> =
            toml::from_str(src).map_err(|e| SemaError::catalog_error(e.to_string()))?;

        let mut messages = HashMap::with_capacity(table.len());
        for (key, template) in table {
            let kind = ErrorKind::from_key(&key)
                .ok_or_else(|| SemaError::catalog_error(format!("unknown key `{key}`")))?;
            messages.insert(kind, template);
        }

        if let Some(kind) = ErrorKind::ALL.iter().find(|k| !messages.contains_key(k)) {
            return Err(SemaError::MissingMessage {
                key: kind.key().to_string(),
            });
        }

        Ok(Self { messages })
    }

    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN)
    }

    pub fn template(&self, kind: ErrorKind) -> Option<&str> {
        self.messages.get(&kind).map(String::as_str)
    }

    /// Message for `kind` with `args` substituted into its placeholders.
    pub fn format(&self, kind: ErrorKind, args: &[String]) -> String {
        match self.template(kind) {
            Some(template) => apply_placeholders(template, args),
            None => kind.key().to_string(),
        }
    }
}

/// Shared built-in catalog, parsed on first use.
pub fn global() -> &'static Catalog {
    GLOBAL.get_or_init(|| {
        Catalog::builtin().unwrap_or_else(|err| {
            tracing::error!(%err, "built-in message catalog is invalid");
            Catalog::default()
        })
    })
}

/// Replace each `@` with the next argument. Placeholders without an
/// argument stay as they are; surplus arguments are ignored.
pub fn apply_placeholders(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    for arg in args {
        let Some(i) = rest.find('@') else {
            break;
        };
        out.push_str(&rest[..i]);
        out.push_str(arg);
        rest = &rest[i + 1..];
    }
    out.push_str(rest);
    out
}
