//! Analysis options

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SemaError};

/// Options of one analysis session, usually read from a `sema.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SemaConfig {
    /// Width of `int`, `uint` and `uintptr`.
    pub arch_bits: u32,
    /// Stop recording diagnostics after this many.
    pub max_diagnostics: Option<usize>,
    /// Check the body of every new generic instance.
    pub check_generic_bodies: bool,
}

impl Default for SemaConfig {
    fn default() -> Self {
        Self {
            arch_bits: 64,
            max_diagnostics: None,
            check_generic_bodies: true,
        }
    }
}

impl SemaConfig {
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let config: SemaConfig =
            toml::from_str(src).map_err(|e| SemaError::config_error(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .map_err(|e| SemaError::io_error(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<()> {
        match self.arch_bits {
            32 | 64 => Ok(()),
            bits => Err(SemaError::invalid_config(format!(
                "arch_bits must be 32 or 64, got {bits}"
            ))),
        }
    }
}
