mod shell;
mod user_interaction;
mod zfs_backing;

use crate::shell::Shell;
use crate::zfs_backing::ZfsBacking;
use camino::Utf8PathBuf;
use clap::Parser;
use common::constants::ZFS;
use common::types::Opts;
use snapmanage::{Dataset, SnapshotOperations, SnapshotStore};
use std::io;
use std::process::exit;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    version,
    about = "Takes, lists, and rolls back the snapshots of a ZFS dataset",
    long_about = None
)]
struct Cli {
    /// Dataset to be operated on
    #[clap(short = 's', long, env = "SNAPMANAGE_DATASET")]
    dataset: String,
    /// Command to be executed. Starts the interactive shell if omitted
    #[clap(short, long)]
    command: Option<String>,
    /// Print what would happen, without doing it
    #[clap(short, long)]
    noop: bool,
    /// Be verbose
    #[clap(short, long)]
    verbose: bool,
    /// Don't ask before rolling back or destroying snapshots
    #[clap(short, long)]
    yes: bool,
    /// Path to the zfs binary
    #[clap(long, default_value = ZFS)]
    zfs: Utf8PathBuf,
}

// RUST_LOG wins if it's set.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let dataset = Dataset::new(&cli.dataset).unwrap_or_else(|e| {
        eprintln!("ERROR: {}", e);
        exit(2);
    });

    let opts = Opts {
        verbose: cli.verbose,
        noop: cli.noop,
    };

    let mut ops = SnapshotOperations::new(
        SnapshotStore::new(dataset),
        ZfsBacking::new(cli.zfs, opts),
    );

    if let Err(e) = ops.reconcile() {
        eprintln!(
            "ERROR: could not list snapshots of {}: {:#}",
            ops.dataset(),
            anyhow::Error::from(e)
        );
        exit(1);
    }

    let mut shell = Shell::new(ops, io::stdin().lock(), io::stdout().lock(), cli.yes);

    match cli.command {
        Some(line) => {
            if let Err(e) = shell.onecmd(&line) {
                eprintln!("ERROR: {:#}", e);
                exit(1);
            }
        }
        None => match shell.cmdloop() {
            Ok(0) => (),
            Ok(errs) => {
                eprintln!("Encountered {} errors", errs);
                exit(1);
            }
            Err(e) => {
                eprintln!("ERROR: {:#}", e);
                exit(1);
            }
        },
    }
}
