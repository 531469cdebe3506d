mod auth;
mod cli;
mod config;
mod error;
mod monitor;
mod output;
mod providers;
mod repo;

use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting circle");

    let code = match cli.execute().await {
        Ok(code) => code,
        Err(e) => {
            output::print_error(format!("{e:#}"));
            1
        }
    };

    std::process::exit(code);
}
