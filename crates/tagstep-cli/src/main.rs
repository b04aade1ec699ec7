mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tagstep",
    about = "Advance mailing-list members along lifecycle tags for every address in a CRM export",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory holding tagstep.yaml (default: search upward from cwd)
    #[arg(long, global = true, env = "TAGSTEP_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log each remote call and applied batch
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default tagstep.yaml
    Init,

    /// Advance every CRM-matched member of a list to its next stage tag
    Advance {
        /// Name of the mailing list
        #[arg(long)]
        list: String,

        /// CSV export with an `email` column
        #[arg(long)]
        csv: PathBuf,

        /// Plan and report without sending any tag changes
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the lists in the account
    Lists,

    /// Show the configured stage progression
    Stages,

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Advance { list, csv, dry_run } => {
            cmd::advance::run(&root, list.trim(), &csv, dry_run, cli.json)
        }
        Commands::Lists => cmd::lists::run(&root, cli.json),
        Commands::Stages => cmd::stages::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
