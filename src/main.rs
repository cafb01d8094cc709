mod api;
mod cli;
mod config;
mod error;
mod model;
mod util;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use error::ZentaoError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("zentao=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli::run(cli.command).await {
        match err.downcast_ref::<ZentaoError>() {
            Some(zentao) => error!(
                code = zentao.code().as_str(),
                "{err:#}. {}",
                zentao.user_message()
            ),
            None => error!("{err:#}"),
        }
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
