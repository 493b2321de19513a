//! CLI entry point for the tileweave generator

use clap::Parser;
use tileweave::io::cli::{Cli, run};

fn main() -> tileweave::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    run(cli)
}
