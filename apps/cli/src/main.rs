//! pkgbot CLI - command-line front end for the pkgbot package manager.
//!
//! Provides a `pkgbot` command for searching the package catalog and
//! installing, upgrading and uninstalling host extensions.

mod commands;
mod config;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::pkg;

/// pkgbot - package manager for host extensions
///
/// Packages are git repositories cloned under `<base-dir>/installed`. The
/// catalog of installable packages is itself a git repository cached under
/// `<base-dir>/repos`.
#[derive(Parser, Debug)]
#[command(
    name = "pkgbot",
    author,
    version,
    about = "pkgbot - package manager for host extensions"
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Package base directory (overrides PKGBOT_BASE_DIR and config files)
    #[arg(short = 'b', long, global = true)]
    base_dir: Option<PathBuf>,

    /// Extra configuration file merged over the discovered ones
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the catalog for packages
    ///
    /// The query is a case-insensitive regular expression matched against
    /// package names and descriptions.
    Search {
        /// Regular expression to match
        query: String,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Install packages by catalog name or git URL
    ///
    /// # Examples
    ///
    ///   $ pkgbot install weather
    ///
    ///   $ pkgbot install https://github.com/someone/dice.git
    Install {
        /// Package names or http(s) URLs
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Update the package catalog cache
    Update,

    /// Upgrade one installed package, or all of them
    Upgrade {
        /// Package to upgrade (all installed packages if omitted)
        name: Option<String>,
    },

    /// Uninstall packages (moved to the trash, never deleted)
    Uninstall {
        /// Installed package names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List installed packages
    List {
        /// List every package in the catalog instead
        #[arg(long)]
        all: bool,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask the host to reload installed extensions
    Reload,

    /// Show a one-line summary of every command
    Usage,

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let cli_config = config::load_config(args.config.as_deref(), args.base_dir)?;

    // Initialize tracing
    let level_name = args.log_level.as_deref().or(cli_config.log_level.as_deref()).unwrap_or("warn");
    let level = match level_name {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // If no command provided, show help
    let command = if let Some(cmd) = args.command {
        cmd
    } else {
        Args::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Search { query, json } => pkg::search(&cli_config, &query, json).await,
        Command::Install { names } => pkg::install(&cli_config, &names).await,
        Command::Update => pkg::update(&cli_config).await,
        Command::Upgrade { name } => pkg::upgrade(&cli_config, name.as_deref()).await,
        Command::Uninstall { names } => pkg::uninstall(&cli_config, &names).await,
        Command::List { all, json } => pkg::list(&cli_config, all, json).await,
        Command::Reload => pkg::reload(&cli_config).await,
        Command::Usage => {
            pkg::usage();
            Ok(())
        }
        Command::Completions { shell } => {
            let mut cmd = Args::command();
            generate(shell, &mut cmd, "pkgbot", &mut std::io::stdout());
            Ok(())
        }
    }
}
