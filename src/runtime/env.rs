//! Environment and system information operations.

use anyhow::Result;
use std::env;
use std::path::PathBuf;

use super::RealRuntime;
use crate::error::ProdError;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn env_var_impl(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    #[tracing::instrument(skip(self, value))]
    pub(crate) fn set_var_impl(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        if value.contains('\0') {
            return Err(ProdError::EnvironmentVariable {
                key: key.to_string(),
                detail: "value contains a NUL byte".to_string(),
            }
            .into());
        }
        // SAFETY: prod is single-threaded; no other thread reads the environment concurrently.
        unsafe {
            env::set_var(key, value);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_var_impl(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        // SAFETY: see set_var_impl.
        unsafe {
            env::remove_var(key);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn home_dir_impl(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn config_dir_impl(&self) -> Option<PathBuf> {
        dirs::config_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn temp_dir_impl(&self) -> PathBuf {
        env::temp_dir()
    }
}

/// `std::env::set_var` panics on these; report them as errors instead.
fn validate_key(key: &str) -> Result<()> {
    let detail = if key.is_empty() {
        "name is empty"
    } else if key.contains('=') {
        "name contains '='"
    } else if key.contains('\0') {
        "name contains a NUL byte"
    } else {
        return Ok(());
    };
    Err(ProdError::EnvironmentVariable {
        key: key.to_string(),
        detail: detail.to_string(),
    }
    .into())
}
