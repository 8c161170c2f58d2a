//! gemscan CLI entry point.

use clap::Parser;
use gemscan::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan(args) => cli::run_scan(&args),
        Commands::Models(args) => cli::run_models(&args),
        Commands::Init(args) => cli::run_init(&args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
