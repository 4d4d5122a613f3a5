//! CLI driver for the VerseCraft story engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "vc",
    about = "VerseCraft: play and check branching story documents",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine decisions to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a story document for structural errors
    Validate {
        /// Story JSON file
        story: PathBuf,
    },

    /// Report authoring mistakes the engine would silently ignore
    Lint {
        /// Story JSON file
        story: PathBuf,
    },

    /// Start a new run and write its save
    New {
        /// Story JSON file
        story: PathBuf,

        /// Save file to write (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the current node, choices and character sheet of a save
    Show {
        /// Story JSON file
        story: PathBuf,

        /// Save JSON file
        save: PathBuf,
    },

    /// Take a choice of the current node
    Choose {
        /// Story JSON file
        story: PathBuf,

        /// Save JSON file
        save: PathBuf,

        /// Zero-based choice index
        index: usize,

        /// Save file to write (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Drop items from a save that the story no longer defines
    Sanitize {
        /// Story JSON file
        story: PathBuf,

        /// Save JSON file
        save: PathBuf,

        /// Save file to write (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Validate { story } => commands::validate::run(&story),
        Commands::Lint { story } => commands::lint::run(&story),
        Commands::New { story, output } => commands::new::run(&story, output.as_deref()),
        Commands::Show { story, save } => commands::show::run(&story, &save),
        Commands::Choose {
            story,
            save,
            index,
            output,
        } => commands::choose::run(&story, &save, index, output.as_deref()),
        Commands::Sanitize {
            story,
            save,
            output,
        } => commands::sanitize::run(&story, &save, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
