//! Production sessions: activating a production's environment, handing
//! control to an interactive shell and restoring the environment afterwards.
//!
//! A manager is either inactive or holds exactly one active session. All
//! environment changes go through [`EnvChangeSet`] so exiting restores the
//! variables to their pre-activation values, including ones that were unset.

mod changes;
mod shell;

pub use changes::EnvChangeSet;
pub use shell::{InteractiveShell, SubShell};

#[cfg(test)]
pub use shell::MockInteractiveShell;

use anyhow::Result;
use log::{debug, info};
use std::collections::BTreeSet;

use crate::error::ProdError;
use crate::package::AliasTable;
use crate::production::ProductionConfig;
use crate::runtime::Runtime;
use crate::settings::Settings;

/// What an active session owns.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionSession {
    pub name: String,
    pub changes: EnvChangeSet,
    pub aliases: AliasTable,
}

impl ProductionSession {
    /// Prompt prefix shown while the session is active.
    pub fn prompt(&self) -> String {
        format!("[{}] ", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Inactive,
    Active(ProductionSession),
}

pub struct SessionManager<'a, R: Runtime, S: InteractiveShell> {
    runtime: &'a R,
    settings: &'a Settings,
    shell: S,
    state: SessionState,
}

impl<'a, R: Runtime, S: InteractiveShell> SessionManager<'a, R, S> {
    pub fn new(runtime: &'a R, settings: &'a Settings, shell: S) -> Self {
        Self {
            runtime,
            settings,
            shell,
            state: SessionState::Inactive,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    pub fn active(&self) -> Option<&ProductionSession> {
        match &self.state {
            SessionState::Active(session) => Some(session),
            SessionState::Inactive => None,
        }
    }

    /// Aliases of the active session; empty when inactive.
    pub fn aliases(&self) -> AliasTable {
        self.active()
            .map(|session| session.aliases.clone())
            .unwrap_or_default()
    }

    /// Registered production names, sorted.
    pub fn list(&self) -> Result<BTreeSet<String>> {
        self.settings.productions(self.runtime)
    }

    /// Activate `name`: set its environment and build its alias table.
    ///
    /// Fails with [`ProdError::AlreadyActive`] while a session is active,
    /// leaving that session untouched. Any later failure restores the
    /// environment before returning.
    #[tracing::instrument(skip(self))]
    pub fn activate(&mut self, name: &str) -> Result<()> {
        if let Some(session) = self.active() {
            return Err(ProdError::AlreadyActive {
                name: session.name.clone(),
            }
            .into());
        }

        let config = ProductionConfig::load(self.runtime, self.settings, name)?;

        let changes = EnvChangeSet::diff(self.runtime, &config.environment());
        changes.apply(self.runtime)?;
        debug!("Applied {} environment changes", changes.applied().len());

        let aliases = match config.alias_table() {
            Ok(aliases) => aliases,
            Err(e) => {
                changes.revert(self.runtime);
                return Err(e);
            }
        };

        info!("Activated production {} with {} aliases", name, aliases.len());
        self.state = SessionState::Active(ProductionSession {
            name: name.to_string(),
            changes,
            aliases,
        });
        Ok(())
    }

    /// Leave the active session, restoring the environment. Returns the
    /// anomalies found while restoring. A no-op when inactive.
    #[tracing::instrument(skip(self))]
    pub fn exit(&mut self) -> Vec<String> {
        match std::mem::take(&mut self.state) {
            SessionState::Active(session) => {
                let diagnostics = session.changes.revert(self.runtime);
                info!("Left production {}", session.name);
                diagnostics
            }
            SessionState::Inactive => Vec::new(),
        }
    }

    /// Activate `name`, run the interactive shell until it exits, then exit
    /// the session. Returns the shell's exit code.
    pub fn enter(&mut self, name: &str) -> Result<i32> {
        self.activate(name)?;

        let result = match self.active() {
            Some(session) => self
                .shell
                .open(&session.name, &session.prompt(), &session.aliases),
            None => Ok(0),
        };

        self.exit();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryRuntime, test_settings};
    use mockall::predicate::eq;

    fn runtime() -> MemoryRuntime {
        let runtime = MemoryRuntime::with_env(&[("HOME", "/home/user"), ("PROD_ROOT", "/old")]);
        runtime.add_file(
            "/studio/software.ini",
            "[maya]\nversion = 2023.3.2\npackages = [\"mtoa-2.3\"]\n[nuke]\nversion = 14.0\n",
        );
        runtime.add_file(
            "/studio/pipeline.ini",
            "[common]\npackages = [\"vfxCore-2.5\"]\n\
             [environment]\nPROD_ROOT = /prods/studio\nPROD_TYPE = feature\n",
        );
        runtime.add_file(
            "/prods/dlt/pipeline.ini",
            "[environment]\nPROD_ROOT = /prods/dlt\n",
        );
        runtime.add_dir("/prods/abc");
        runtime
    }

    fn idle_shell() -> MockInteractiveShell {
        let mut shell = MockInteractiveShell::new();
        shell.expect_open().never();
        shell
    }

    #[test]
    fn test_list_productions() {
        let runtime = runtime();
        let settings = test_settings();
        let manager = SessionManager::new(&runtime, &settings, idle_shell());

        let names: Vec<_> = manager.list().unwrap().into_iter().collect();
        assert_eq!(names, ["abc", "dlt"]);
    }

    #[test]
    fn test_activate_sets_environment_and_aliases() {
        let runtime = runtime();
        let settings = test_settings();
        let mut manager = SessionManager::new(&runtime, &settings, idle_shell());

        manager.activate("dlt").unwrap();

        assert!(manager.is_active());
        assert_eq!(runtime.get("PROD").as_deref(), Some("dlt"));
        assert_eq!(runtime.get("PROD_ROOT").as_deref(), Some("/prods/dlt"));
        assert_eq!(runtime.get("PROD_TYPE").as_deref(), Some("feature"));
        assert_eq!(manager.aliases().names().collect::<Vec<_>>(), ["maya", "nuke"]);
        assert_eq!(manager.active().unwrap().prompt(), "[dlt] ");
    }

    #[test]
    fn test_exit_restores_environment_exactly() {
        let runtime = runtime();
        let settings = test_settings();
        let before = runtime.snapshot();
        let mut manager = SessionManager::new(&runtime, &settings, idle_shell());

        manager.activate("dlt").unwrap();
        let diagnostics = manager.exit();

        assert!(diagnostics.is_empty());
        assert!(!manager.is_active());
        assert!(manager.aliases().is_empty());
        assert_eq!(runtime.snapshot(), before);
        assert_eq!(runtime.get("PROD"), None);
        assert_eq!(runtime.get("PROD_ROOT").as_deref(), Some("/old"));
    }

    #[test]
    fn test_exit_when_inactive_is_noop() {
        let runtime = runtime();
        let settings = test_settings();
        let mut manager = SessionManager::new(&runtime, &settings, idle_shell());
        assert!(manager.exit().is_empty());
        assert_eq!(manager.state(), &SessionState::Inactive);
    }

    #[test]
    fn test_activate_while_active_is_rejected() {
        let runtime = runtime();
        let settings = test_settings();
        let mut manager = SessionManager::new(&runtime, &settings, idle_shell());

        manager.activate("dlt").unwrap();
        let env_before = runtime.snapshot();
        let aliases_before = manager.aliases();

        let err = manager.activate("abc").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProdError>(),
            Some(ProdError::AlreadyActive { name }) if name == "dlt"
        ));
        assert_eq!(runtime.snapshot(), env_before);
        assert_eq!(manager.aliases(), aliases_before);
        assert_eq!(manager.active().unwrap().name, "dlt");
    }

    #[test]
    fn test_activate_unknown_production_changes_nothing() {
        let runtime = runtime();
        let settings = test_settings();
        let before = runtime.snapshot();
        let mut manager = SessionManager::new(&runtime, &settings, idle_shell());

        let err = manager.activate("zzz").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProdError>(),
            Some(ProdError::ProductionNotFound { .. })
        ));
        assert!(!manager.is_active());
        assert_eq!(runtime.snapshot(), before);
    }

    #[test]
    fn test_failed_environment_write_rolls_back() {
        let runtime = runtime();
        runtime.fail_on_set("PROD_TYPE");
        let settings = test_settings();
        let before = runtime.snapshot();
        let mut manager = SessionManager::new(&runtime, &settings, idle_shell());

        assert!(manager.activate("dlt").is_err());
        assert!(!manager.is_active());
        assert_eq!(runtime.snapshot(), before);
    }

    #[test]
    fn test_enter_runs_shell_inside_session_then_restores() {
        let runtime = runtime();
        let settings = test_settings();
        let before = runtime.snapshot();

        let mut shell = MockInteractiveShell::new();
        shell
            .expect_open()
            .with(eq("dlt"), eq("[dlt] "), mockall::predicate::always())
            .times(1)
            .returning(|_, _, aliases| {
                assert!(aliases.get("maya").is_some());
                Ok(7)
            });

        let mut manager = SessionManager::new(&runtime, &settings, shell);
        assert_eq!(manager.enter("dlt").unwrap(), 7);
        assert!(!manager.is_active());
        assert_eq!(runtime.snapshot(), before);
    }

    #[test]
    fn test_enter_restores_environment_when_shell_fails() {
        let runtime = runtime();
        let settings = test_settings();
        let before = runtime.snapshot();

        let mut shell = MockInteractiveShell::new();
        shell
            .expect_open()
            .returning(|_, _, _| Err(anyhow::anyhow!("shell not found")));

        let mut manager = SessionManager::new(&runtime, &settings, shell);
        assert!(manager.enter("dlt").is_err());
        assert_eq!(runtime.snapshot(), before);
    }
}
