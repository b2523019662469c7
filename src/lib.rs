pub mod commands;
pub mod config;
pub mod error;
pub mod package;
pub mod production;
pub mod runtime;
pub mod session;
pub mod settings;
