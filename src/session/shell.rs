//! The interactive shell a production session runs in.

use anyhow::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::package::AliasTable;
use crate::runtime::Runtime;

/// Hands control to the user until they leave the session.
#[cfg_attr(test, mockall::automock)]
pub trait InteractiveShell {
    /// Run an interactive shell with `prompt` prefixed to its prompt and one
    /// command alias per entry in `aliases`. Returns the shell's exit code.
    fn open(&self, production: &str, prompt: &str, aliases: &AliasTable) -> Result<i32>;
}

/// Shell families that get a generated startup file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    /// `--rcfile <file>`.
    Bash,
    /// `$ZDOTDIR/.zshrc`.
    Zsh,
    /// `$ENV`, read by interactive POSIX shells.
    Posix,
    /// Started as is.
    Other,
}

impl ShellKind {
    pub fn of(program: &str) -> Self {
        let stem = Path::new(program)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match stem.as_str() {
            "bash" => ShellKind::Bash,
            "zsh" => ShellKind::Zsh,
            "sh" | "dash" | "ash" | "ksh" | "mksh" | "yash" | "posh" => ShellKind::Posix,
            _ => ShellKind::Other,
        }
    }
}

/// How to start a shell with its startup file in place.
#[derive(Debug, Clone, PartialEq)]
struct Launch {
    startup_file: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

/// A child shell process that inherits the session's environment.
///
/// Bash, zsh and POSIX shells get a startup file that runs the user's own
/// startup file, prefixes the prompt and defines the aliases. The file lives in
/// a fresh owner-only directory that is removed when the shell exits. Variables
/// pointing the shell at it are passed to the child alone.
pub struct SubShell<'a, R: Runtime> {
    runtime: &'a R,
    program: String,
    launcher: String,
}

impl<'a, R: Runtime> SubShell<'a, R> {
    /// `launcher` is the command aliases expand to, normally this executable.
    pub fn new(runtime: &'a R, program: impl Into<String>, launcher: impl Into<String>) -> Self {
        Self {
            runtime,
            program: program.into(),
            launcher: launcher.into(),
        }
    }

    /// Shell to run: the configured one, then `$SHELL`, then the platform default.
    pub fn detect(runtime: &'a R, configured: Option<&str>, launcher: impl Into<String>) -> Self {
        let program = configured
            .map(String::from)
            .or_else(|| runtime.env_var(default_shell_var()).ok())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| default_shell().to_string());
        Self::new(runtime, program, launcher)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn kind(&self) -> ShellKind {
        ShellKind::of(&self.program)
    }

    fn alias_lines(&self, aliases: &AliasTable) -> String {
        let mut lines = String::new();
        for alias in aliases.names() {
            if !is_alias_name(alias) {
                warn!("Skipping alias with unsupported name: {}", alias);
                continue;
            }
            let command = format!("{} run {}", quote_posix_single(&self.launcher), alias);
            lines.push_str(&format!("alias {}={}\n", alias, quote_posix_single(&command)));
        }
        lines
    }

    /// Startup script for bash.
    pub fn bash_rcfile(&self, prompt: &str, aliases: &AliasTable) -> String {
        let mut script = String::from("[ -f ~/.bashrc ] && . ~/.bashrc\n");
        script.push_str(&format!("PS1={}\"$PS1\"\n", quote_posix_single(prompt)));
        script.push_str(&self.alias_lines(aliases));
        script
    }

    /// Startup script for zsh. `user_zdotdir` is the `ZDOTDIR` the user had,
    /// restored before their own `.zshrc` runs.
    pub fn zsh_rcfile(&self, prompt: &str, aliases: &AliasTable, user_zdotdir: Option<&str>) -> String {
        let mut script = match user_zdotdir {
            Some(dir) => format!("ZDOTDIR={}\n", quote_posix_single(dir)),
            None => "unset ZDOTDIR\n".to_string(),
        };
        script.push_str("[ -f \"${ZDOTDIR:-$HOME}/.zshrc\" ] && . \"${ZDOTDIR:-$HOME}/.zshrc\"\n");
        script.push_str(&format!("PROMPT={}\"$PROMPT\"\n", quote_posix_single(prompt)));
        script.push_str(&self.alias_lines(aliases));
        script
    }

    /// `$ENV` script for POSIX shells. `user_env` is the `ENV` the user had,
    /// restored and sourced first.
    pub fn posix_envfile(&self, prompt: &str, aliases: &AliasTable, user_env: Option<&str>) -> String {
        let mut script = match user_env {
            Some(env) => format!(
                "ENV={}\n[ -f \"$ENV\" ] && . \"$ENV\"\n",
                quote_posix_single(env)
            ),
            None => "unset ENV\n".to_string(),
        };
        script.push_str(&format!("PS1={}\"${{PS1:-\\$ }}\"\n", quote_posix_single(prompt)));
        script.push_str(&self.alias_lines(aliases));
        script
    }

    fn prepare(&self, kind: ShellKind, dir: &Path, prompt: &str, aliases: &AliasTable) -> Option<(Launch, String)> {
        let user_var = |key: &str| self.runtime.env_var(key).ok().filter(|v| !v.is_empty());

        let launch = match kind {
            ShellKind::Bash => {
                let file = dir.join("bashrc");
                let script = self.bash_rcfile(prompt, aliases);
                let args = vec![
                    "--rcfile".to_string(),
                    file.to_string_lossy().into_owned(),
                    "-i".to_string(),
                ];
                (file, script, args, Vec::new())
            }
            ShellKind::Zsh => {
                let script = self.zsh_rcfile(prompt, aliases, user_var("ZDOTDIR").as_deref());
                let env = vec![("ZDOTDIR".to_string(), dir.to_string_lossy().into_owned())];
                (dir.join(".zshrc"), script, interactive_args(), env)
            }
            ShellKind::Posix => {
                let file = dir.join("env.sh");
                let script = self.posix_envfile(prompt, aliases, user_var("ENV").as_deref());
                let env = vec![("ENV".to_string(), file.to_string_lossy().into_owned())];
                (file, script, interactive_args(), env)
            }
            ShellKind::Other => return None,
        };

        let (startup_file, script, args, env) = launch;
        Some((
            Launch {
                startup_file,
                args,
                env,
            },
            script,
        ))
    }

    fn open_with_startup(&self, kind: ShellKind, prompt: &str, aliases: &AliasTable) -> Result<i32> {
        let dir = self
            .runtime
            .create_private_dir(&self.runtime.temp_dir(), "prod-")?;

        let result = match self.prepare(kind, &dir, prompt, aliases) {
            Some((launch, script)) => self
                .runtime
                .write(&launch.startup_file, script.as_bytes())
                .and_then(|()| {
                    debug!("Wrote shell startup file {}", launch.startup_file.display());
                    self.runtime
                        .run_command_with_env(&self.program, &launch.args, &launch.env)
                }),
            None => self.runtime.run_command(&self.program, &interactive_args()),
        };

        if let Err(e) = self.runtime.remove_dir_all(&dir) {
            warn!("Failed to remove {}: {}", dir.display(), e);
        }
        result
    }
}

impl<R: Runtime> InteractiveShell for SubShell<'_, R> {
    #[tracing::instrument(skip(self, aliases))]
    fn open(&self, production: &str, prompt: &str, aliases: &AliasTable) -> Result<i32> {
        let kind = self.kind();
        info!(
            "Starting {} ({:?}) for production {} ({} aliases)",
            self.program,
            kind,
            production,
            aliases.len()
        );

        if kind != ShellKind::Other {
            return self.open_with_startup(kind, prompt, aliases);
        }

        if !aliases.is_empty() {
            let names: Vec<_> = aliases.names().collect();
            eprintln!("Available software: {}", names.join(", "));
            eprintln!("Launch with: {} run <software>", self.launcher);
        }
        self.runtime.run_command(&self.program, &interactive_args())
    }
}

/// Alias names a shell accepts without quoting.
fn is_alias_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn quote_posix_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

#[cfg(not(windows))]
fn default_shell_var() -> &'static str {
    "SHELL"
}

#[cfg(windows)]
fn default_shell_var() -> &'static str {
    "COMSPEC"
}

#[cfg(not(windows))]
fn default_shell() -> &'static str {
    "/bin/sh"
}

#[cfg(windows)]
fn default_shell() -> &'static str {
    "cmd.exe"
}

#[cfg(not(windows))]
fn interactive_args() -> Vec<String> {
    vec!["-i".to_string()]
}

#[cfg(windows)]
fn interactive_args() -> Vec<String> {
    Vec::new()
}
