//! Domain errors and their process exit codes.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by configuration loading, resolution and the session lifecycle.
///
/// They travel inside `anyhow::Error`; `main` downcasts to pick the exit code.
#[derive(Debug, Error)]
pub enum ProdError {
    #[error("failed to parse {}:{line}: {detail}", .path.display())]
    ConfigParse {
        path: PathBuf,
        line: usize,
        detail: String,
    },

    #[error("no configuration found in: {}", display_paths(.paths))]
    NoConfigFound { paths: Vec<PathBuf> },

    #[error("configuration file not found: {}", .path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("invalid settings in {}: {detail}", .path.display())]
    InvalidSettings { path: PathBuf, detail: String },

    #[error("software '{alias}' is not configured")]
    UnknownAlias { alias: String },

    #[error("invalid package specifier '{spec}'")]
    InvalidPackageSpec { spec: String },

    #[error("production '{name}' not found")]
    ProductionNotFound { name: String },

    #[error("production '{name}' is already active")]
    AlreadyActive { name: String },

    #[error("no production environment is active; enter one with 'prod enter <production>' or pass --prod")]
    NoActiveProduction,

    #[error("cannot set environment variable '{key}': {detail}")]
    EnvironmentVariable { key: String, detail: String },
}

impl ProdError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ProdError::ConfigParse { .. }
            | ProdError::NoConfigFound { .. }
            | ProdError::ConfigNotFound { .. }
            | ProdError::InvalidSettings { .. } => 2,
            ProdError::UnknownAlias { .. } | ProdError::InvalidPackageSpec { .. } => 3,
            ProdError::ProductionNotFound { .. } => 4,
            ProdError::AlreadyActive { .. } => 5,
            ProdError::NoActiveProduction => 6,
            ProdError::EnvironmentVariable { .. } => 1,
        }
    }
}

/// Exit code for a malformed command line (sysexits `EX_USAGE`), kept apart
/// from the configuration error code.
pub const USAGE_EXIT_CODE: i32 = 64;

/// Exit code for any error surfaced to `main`.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ProdError>())
        .map(ProdError::exit_code)
        .unwrap_or(1)
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "(empty path list)".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
