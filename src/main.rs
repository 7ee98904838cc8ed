mod archive;
mod auth;
mod cli;
mod config;
mod error;
mod manifest;
mod output;
mod providers;
mod state;
mod sync;

use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting ado-ad - Azure DevOps artifacts downloader");

    if let Err(err) = cli.execute().await {
        println!("{} {err:#}", output::failure("Error:"));
        std::process::exit(1);
    }
}
