use clap::{Parser as ClapParser, Subcommand};
use fql::cli::{self, CliError, Command, CommandOptions};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "fql")]
#[command(about = "fql - Render saved query definitions as canonical FQL text")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical text of a query definition
    Render {
        /// Definition file (reads from stdin if not provided)
        file: Option<PathBuf>,
    },

    /// Print left, operator and right of every leaf constraint as JSON
    Decompose {
        /// Definition file (reads from stdin if not provided)
        file: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate a query definition
    Check {
        /// Definition file (reads from stdin if not provided)
        file: Option<PathBuf>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fql=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let (command, file, pretty) = match cli.command {
        Commands::Render { file } => (Command::Render, file, false),
        Commands::Decompose { file, pretty } => (Command::Decompose, file, pretty),
        Commands::Check { file } => (Command::Check, file, false),
    };

    if let Err(e) = run(command, file, pretty) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Command, file: Option<PathBuf>, pretty: bool) -> Result<(), CliError> {
    let input = match file {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CommandOptions { input, pretty };
    println!("{}", cli::execute(command, &options)?);
    Ok(())
}
