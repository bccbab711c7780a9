mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use env_logger::Env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    commands::run(cli)
}
