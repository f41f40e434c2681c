use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "molcrowd - place rigid molecular bodies in a packed-sphere arena and crowd them with a Metropolis Monte Carlo search.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a crowding scenario: place subjects, fill with crowders, search.
    Run(RunArgs),
    /// Build the arena for a scenario and report its geometry.
    Arena(ArenaArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the scenario description (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub scenario: PathBuf,

    /// Write the final occupancy table (x y z c s) to this path.
    #[arg(short, long, value_name = "PATH")]
    pub occupancy: Option<PathBuf>,

    /// Write the post-warmup energy trace (CSV) to this path.
    #[arg(short, long, value_name = "PATH")]
    pub trace: Option<PathBuf>,

    /// Override the RNG seed from the scenario file.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

/// Arguments for the `arena` subcommand.
#[derive(Args, Debug)]
pub struct ArenaArgs {
    /// Path to the scenario description (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub scenario: PathBuf,
}
