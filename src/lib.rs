pub mod browse;
pub mod clean;
pub mod cli;
pub mod commands;
pub mod data;
pub mod dataset;
pub mod error;
pub mod export;
pub mod io_utils;
pub mod loader;
pub mod preview;
pub mod profile;
pub mod session;
pub mod table;
pub mod transform;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_station", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Profile(args) => commands::profile(&args),
        Commands::Frequency(args) => commands::frequency(&args),
        Commands::Clean(args) => commands::clean(&args),
        Commands::DropColumns(args) => commands::drop_columns(&args),
        Commands::Candidates(args) => commands::candidates(&args),
        Commands::Remap(args) => commands::remap(&args),
        Commands::Preview(args) => commands::preview(&args),
        Commands::Browse(args) => browse::execute(&args),
    }
}
