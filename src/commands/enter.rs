use anyhow::Result;

use crate::{
    runtime::Runtime,
    session::{SessionManager, SubShell},
    settings::Settings,
};

/// Enter a production in a nested interactive shell.
///
/// `launcher` is the command the session's aliases call back into.
/// Returns the shell's exit code.
#[tracing::instrument(skip(runtime, settings))]
pub fn enter<R: Runtime>(
    runtime: &R,
    settings: &Settings,
    production: &str,
    launcher: &str,
) -> Result<i32> {
    let shell = SubShell::detect(runtime, settings.shell.as_deref(), launcher);
    let mut manager = SessionManager::new(runtime, settings, shell);
    manager.enter(production)
}
