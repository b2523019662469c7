//! Entry points for the `prod` subcommands.

mod enter;
mod info;
mod list;
mod run;

pub use enter::enter;
pub use info::{ProductionInfo, info};
pub use list::list;
pub use run::{RunOptions, run, target_production};
