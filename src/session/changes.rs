//! Reversible environment variable changes.

use anyhow::Result;
use log::{debug, warn};
use std::collections::BTreeMap;

use crate::config::EnvMap;
use crate::runtime::Runtime;

/// The variable-by-variable difference between the current process environment
/// and a target mapping, together with what each variable held before.
///
/// Applying it writes the target values; reverting it restores the snapshot
/// exactly, removing variables that did not exist before.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvChangeSet {
    previous: BTreeMap<String, Option<String>>,
    applied: EnvMap,
}

impl EnvChangeSet {
    /// Snapshot the variables in `target` and keep only those that would change.
    pub fn diff<R: Runtime>(runtime: &R, target: &EnvMap) -> Self {
        let mut changes = Self::default();
        for (key, value) in target {
            let current = runtime.env_var(key).ok();
            if current.as_deref() == Some(value.as_str()) {
                continue;
            }
            changes.previous.insert(key.clone(), current);
            changes.applied.insert(key.clone(), value.clone());
        }
        changes
    }

    /// Variables this change set writes.
    pub fn applied(&self) -> &EnvMap {
        &self.applied
    }

    /// Pre-activation value of `key`, if this change set touches it.
    pub fn previous(&self, key: &str) -> Option<Option<&str>> {
        self.previous.get(key).map(Option::as_deref)
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Write every variable. If a write fails, the ones already written are
    /// restored before the error is returned.
    pub fn apply<R: Runtime>(&self, runtime: &R) -> Result<()> {
        let mut written: Vec<&str> = Vec::with_capacity(self.applied.len());

        for (key, value) in &self.applied {
            if let Err(e) = runtime.set_var(key, value) {
                for done in written.iter().rev() {
                    if let Err(restore_err) = self.restore(runtime, done) {
                        warn!("Failed to roll back {}: {}", done, restore_err);
                    }
                }
                return Err(e);
            }
            debug!("Set environment variable: {}={}", key, value);
            written.push(key);
        }

        Ok(())
    }

    /// Restore every touched variable to its snapshot value.
    ///
    /// Never fails: anomalies (a variable changed or removed behind our back,
    /// a failed write) are returned as diagnostics.
    pub fn revert<R: Runtime>(&self, runtime: &R) -> Vec<String> {
        let mut diagnostics = Vec::new();

        for (key, expected) in &self.applied {
            match runtime.env_var(key) {
                Ok(current) if &current == expected => {}
                Ok(current) => diagnostics.push(format!(
                    "{} was changed during the session (now '{}')",
                    key, current
                )),
                Err(_) => diagnostics.push(format!("{} was removed during the session", key)),
            }

            if let Err(e) = self.restore(runtime, key) {
                diagnostics.push(format!("failed to restore {}: {}", key, e));
            }
        }

        for diagnostic in &diagnostics {
            warn!("{}", diagnostic);
        }
        diagnostics
    }

    fn restore<R: Runtime>(&self, runtime: &R, key: &str) -> Result<()> {
        match self.previous.get(key) {
            Some(Some(value)) => runtime.set_var(key, value),
            Some(None) => runtime.remove_var(key),
            None => Ok(()),
        }
    }
}
