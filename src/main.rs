use anyhow::Result;
use clap::Parser;
use prod::{
    commands::{self, RunOptions},
    error::{USAGE_EXIT_CODE, exit_code_for},
    package::RezRuntime,
    runtime::RealRuntime,
    settings::{SETTINGS_ENV, Settings, expand_path},
};
use std::path::PathBuf;

/// prod - production environment launcher
///
/// Enter a production to get its environment and one command per configured
/// software; every launch resolves its rez packages from the studio and
/// production configuration.
///
/// Examples:
///   prod list                               # Show registered productions
///   prod enter dlt                          # Open a shell inside production dlt
///   prod run maya --packages golaem-7.0     # Launch maya with an extra package
#[derive(Parser, Debug)]
#[command(author, version = env!("PROD_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to <config dir>/prod/prod-settings.ini)
    #[arg(long, env = SETTINGS_ENV, value_name = "PATH", global = true)]
    settings: Option<PathBuf>,

    /// Verbose logging; also passed on to rez
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List registered productions
    List,

    /// Enter a production in a nested shell
    Enter(EnterArgs),

    /// Launch a configured software
    Run(RunArgs),

    /// Show a production's environment and software
    Info(InfoArgs),
}

#[derive(clap::Args, Debug)]
struct EnterArgs {
    /// Production name
    #[arg(value_name = "PRODUCTION")]
    production: String,
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Software alias, e.g. "maya"
    #[arg(value_name = "ALIAS")]
    alias: String,

    /// Production to use (defaults to the active one, $PROD)
    #[arg(long = "prod", value_name = "NAME")]
    production: Option<String>,

    /// Extra packages, applied by name over the configured ones
    #[arg(long, value_name = "SPEC", num_args = 1..)]
    packages: Vec<String>,

    /// Open the rez environment without launching the software
    #[arg(long)]
    env_only: bool,
}

#[derive(clap::Args, Debug)]
struct InfoArgs {
    /// Production to describe (defaults to the active one, $PROD)
    #[arg(long = "prod", value_name = "NAME")]
    production: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(usage_exit_code(&e));
        }
    };
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match execute(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

fn execute(cli: Cli) -> Result<i32> {
    let runtime = RealRuntime;
    let settings = Settings::load(&runtime, cli.settings)?;

    match cli.command {
        Commands::List => {
            commands::list(&runtime, &settings)?;
            Ok(0)
        }
        Commands::Enter(args) => {
            commands::enter(&runtime, &settings, &args.production, &launcher())
        }
        Commands::Run(args) => {
            let rez_bin = expand_path(&runtime, &settings.rez_bin, "");
            let rez = RezRuntime::new(&runtime, rez_bin);
            let options = RunOptions {
                alias: args.alias,
                production: args.production,
                packages: args.packages,
                env_only: args.env_only,
                verbose: cli.verbose,
            };
            commands::run(&runtime, &settings, &rez, &options)
        }
        Commands::Info(args) => {
            commands::info(&runtime, &settings, args.production.as_deref(), args.json)?;
            Ok(0)
        }
    }
}

/// Help and version requests succeed; anything else clap rejects is a usage error.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() { USAGE_EXIT_CODE } else { 0 }
}

/// Command the session's aliases run: this executable when it can be found.
fn launcher() -> String {
    std::env::current_exe()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| "prod".to_string())
}
