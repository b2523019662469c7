//! Tool settings: where configuration lives and which productions exist.

use anyhow::Result;
use log::debug;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::{ConfigLayer, read_layer, split_path_list};
use crate::error::ProdError;
use crate::runtime::Runtime;

pub const SETTINGS_ENV: &str = "PROD_SETTINGS";
pub const SETTINGS_FILE_NAME: &str = "prod-settings.ini";
const SETTINGS_SECTION: &str = "settings";

/// Placeholder substituted with the production name in configured paths.
pub const PROD_NAME_TOKEN: &str = "{PROD_NAME}";

/// Contents of `prod-settings.ini`.
///
/// ```ini
/// [settings]
/// SOFTWARE_CONFIG = /studio/software.ini:/prods/{PROD_NAME}/software.ini
/// PIPELINE_CONFIG = /studio/pipeline.ini:/prods/{PROD_NAME}/pipeline.ini
/// PRODUCTIONS_ROOT = /prods
/// REZ_BIN = rez
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub path: PathBuf,
    pub software_config: String,
    pub pipeline_config: String,
    pub productions_root: String,
    pub rez_bin: String,
    pub shell: Option<String>,
}

/// Default settings location: `<config_dir>/prod/prod-settings.ini`.
pub fn default_settings_path<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let config_dir = runtime
        .config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine the user config directory"))?;
    Ok(config_dir.join("prod").join(SETTINGS_FILE_NAME))
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(p) => p,
            None => default_settings_path(runtime)?,
        };
        if !runtime.exists(&path) {
            return Err(ProdError::ConfigNotFound { path }.into());
        }
        debug!("Loading settings from {}", path.display());
        Self::from_layer(&read_layer(runtime, &path)?)
    }

    fn from_layer(layer: &ConfigLayer) -> Result<Self> {
        let path = layer.origin().to_path_buf();
        let required = |key: &str| -> Result<String> {
            layer
                .scalar(SETTINGS_SECTION, key)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .ok_or_else(|| {
                    ProdError::InvalidSettings {
                        path: path.clone(),
                        detail: format!("missing [{}] {}", SETTINGS_SECTION, key),
                    }
                    .into()
                })
        };

        Ok(Self {
            software_config: required("SOFTWARE_CONFIG")?,
            pipeline_config: required("PIPELINE_CONFIG")?,
            productions_root: required("PRODUCTIONS_ROOT")?,
            rez_bin: layer
                .scalar(SETTINGS_SECTION, "REZ_BIN")
                .filter(|v| !v.is_empty())
                .unwrap_or("rez")
                .to_string(),
            shell: layer
                .scalar(SETTINGS_SECTION, "SHELL")
                .filter(|v| !v.is_empty())
                .map(String::from),
            path,
        })
    }

    /// Software configuration paths for `production`, studio first.
    pub fn software_paths<R: Runtime>(&self, runtime: &R, production: &str) -> Vec<PathBuf> {
        expand_path_list(runtime, &self.software_config, production)
    }

    /// Pipeline configuration paths for `production`, studio first.
    pub fn pipeline_paths<R: Runtime>(&self, runtime: &R, production: &str) -> Vec<PathBuf> {
        expand_path_list(runtime, &self.pipeline_config, production)
    }

    pub fn productions_root<R: Runtime>(&self, runtime: &R) -> PathBuf {
        PathBuf::from(expand_path(runtime, &self.productions_root, ""))
    }

    /// Registered productions: the subdirectories of the productions root.
    /// A missing root yields an empty set.
    #[tracing::instrument(skip(self, runtime))]
    pub fn productions<R: Runtime>(&self, runtime: &R) -> Result<BTreeSet<String>> {
        let root = self.productions_root(runtime);
        if !runtime.is_dir(&root) {
            debug!("Productions root {} does not exist", root.display());
            return Ok(BTreeSet::new());
        }

        Ok(runtime
            .read_dir(&root)?
            .into_iter()
            .filter(|p| runtime.is_dir(p))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|name| !name.starts_with('.'))
            .collect())
    }

    /// Fail with [`ProdError::ProductionNotFound`] unless `name` is registered.
    pub fn require_production<R: Runtime>(&self, runtime: &R, name: &str) -> Result<()> {
        if self.productions(runtime)?.contains(name) {
            Ok(())
        } else {
            Err(ProdError::ProductionNotFound {
                name: name.to_string(),
            }
            .into())
        }
    }
}

fn expand_path_list<R: Runtime>(runtime: &R, list: &str, production: &str) -> Vec<PathBuf> {
    split_path_list(list)
        .iter()
        .map(|p| PathBuf::from(expand_path(runtime, &p.to_string_lossy(), production)))
        .collect()
}

/// Expand `{PROD_NAME}`, `$VAR`, `${VAR}` and a leading `~` in one path.
/// Unset variables are left as written.
pub fn expand_path<R: Runtime>(runtime: &R, input: &str, production: &str) -> String {
    let input = input.replace(PROD_NAME_TOKEN, production);
    let mut out = expand_vars(runtime, &input);

    if out == "~" || out.starts_with("~/") || out.starts_with("~\\") {
        if let Some(home) = runtime.home_dir() {
            out = format!("{}{}", home.display(), &out[1..]);
        }
    }
    out
}

fn expand_vars<R: Runtime>(runtime: &R, input: &str) -> String {
    if !input.contains('$') {
        return input.to_string();
    }

    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            let next = input[i..].find('$').map_or(input.len(), |off| i + off);
            out.push_str(&input[i..next]);
            i = next;
            continue;
        }

        let (name, end) = if bytes.get(i + 1) == Some(&b'{') {
            match input[i + 2..].find('}') {
                Some(off) => (&input[i + 2..i + 2 + off], i + 3 + off),
                None => ("", i + 1),
            }
        } else {
            let len = input[i + 1..]
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                .count();
            (&input[i + 1..i + 1 + len], i + 1 + len)
        };

        let value = if name.is_empty() {
            None
        } else {
            runtime.env_var(name).ok()
        };
        match value {
            Some(value) => out.push_str(&value),
            None => out.push_str(&input[i..end]),
        }
        i = end;
    }

    out
}
