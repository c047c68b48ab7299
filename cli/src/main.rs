mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{apportion, lookup, validate};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    match &cli.command {
        Commands::Lookup(args) => lookup::run(&cli, args),
        Commands::Apportion(args) => apportion::run(&cli, args),
        Commands::Validate(args) => validate::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    run()
}
