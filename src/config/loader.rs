//! Loading configuration layers from a path list.

use anyhow::Result;
use log::{debug, warn};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::layer::ConfigLayer;
use crate::error::ProdError;
use crate::runtime::Runtime;

/// Split a path-list string on the platform separator (`:` on Unix, `;` on Windows),
/// preserving order and dropping empty entries.
pub fn split_path_list(path_list: &str) -> Vec<PathBuf> {
    std::env::split_paths(OsStr::new(path_list))
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

/// Load the layers at `paths`, lowest precedence first.
///
/// Absent files are skipped with a warning; malformed files are an error.
/// Fails with [`ProdError::NoConfigFound`] when no layer could be read.
#[tracing::instrument(skip(runtime))]
pub fn load_layer_paths<R: Runtime>(runtime: &R, paths: &[PathBuf]) -> Result<Vec<ConfigLayer>> {
    let mut layers = Vec::with_capacity(paths.len());

    for path in paths {
        if !runtime.exists(path) {
            warn!("Config file not found, skipping: {}", path.display());
            continue;
        }
        layers.push(read_layer(runtime, path)?);
    }

    if layers.is_empty() {
        return Err(ProdError::NoConfigFound {
            paths: paths.to_vec(),
        }
        .into());
    }

    Ok(layers)
}

/// Read and parse one existing layer. A file that cannot be read as text
/// (bad encoding, a directory in its place) is malformed like a syntax error.
pub fn read_layer<R: Runtime>(runtime: &R, path: &Path) -> Result<ConfigLayer> {
    debug!("Loading config layer {}", path.display());
    let text = runtime
        .read_to_string(path)
        .map_err(|e| ProdError::ConfigParse {
            path: path.to_path_buf(),
            line: 0,
            detail: format!("{:#}", e),
        })?;
    ConfigLayer::parse(path, &text)
}
