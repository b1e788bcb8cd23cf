//! CLI frontend for the Dedalus interactive fiction engine.

mod commands;
mod store;
mod terminal;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ded",
    about = "Dedalus — an interactive fiction engine",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a story and report diagnostics
    Check {
        /// Story file (.ded markup, or .dedlee/.dd for the terse syntax)
        story: PathBuf,
    },

    /// Lower a dedlee story to the structured markup
    Build {
        /// Story file in dedlee format
        story: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Play a story in the terminal
    Play {
        /// Story file
        story: PathBuf,

        /// Save file (default: `<story>.save.json`)
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { story } => commands::check::run(&story),
        Commands::Build { story, output } => commands::build::run(&story, output.as_deref()),
        Commands::Play { story, save } => commands::play::run(&story, save.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
