//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over system operations,
//! enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `env` - Environment variables and well-known directories
//! - `fs` - File system operations (read, write, directory)
//! - `process` - Running child processes with inherited stdio

mod env;
mod fs;
mod process;

use anyhow::Result;
use std::env as std_env;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    /// Set a variable in this process's environment. Children spawned later inherit it.
    fn set_var(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a variable from this process's environment.
    fn remove_var(&self, key: &str) -> Result<()>;

    // File System
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Create a new, uniquely named directory under `parent` that only the
    /// current user can access. Never reuses an existing path.
    fn create_private_dir(&self, parent: &Path, prefix: &str) -> Result<PathBuf>;

    // Directories
    fn home_dir(&self) -> Option<PathBuf>;
    fn config_dir(&self) -> Option<PathBuf>;
    fn temp_dir(&self) -> PathBuf;

    // Processes
    /// Run `program` with `args`, inheriting stdio and the current environment.
    /// Blocks until the child exits and returns its exit code.
    fn run_command(&self, program: &str, args: &[String]) -> Result<i32>;

    /// Like [`Runtime::run_command`], with `env` added to the child's
    /// environment only.
    fn run_command_with_env(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<i32>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn set_var(&self, key: &str, value: &str) -> Result<()> {
        self.set_var_impl(key, value)
    }

    fn remove_var(&self, key: &str) -> Result<()> {
        self.remove_var_impl(key)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.remove_file_impl(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.remove_dir_all_impl(path)
    }

    fn create_private_dir(&self, parent: &Path, prefix: &str) -> Result<PathBuf> {
        self.create_private_dir_impl(parent, prefix)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config_dir_impl()
    }

    fn temp_dir(&self) -> PathBuf {
        self.temp_dir_impl()
    }

    fn run_command(&self, program: &str, args: &[String]) -> Result<i32> {
        self.run_command_impl(program, args)
    }

    fn run_command_with_env(
        &self,
        program: &str,
        args: &[String],
        env: &[(String, String)],
    ) -> Result<i32> {
        self.run_command_with_env_impl(program, args, env)
    }
}
