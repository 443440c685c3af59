use clap::Parser;
use color_eyre::Result;
use dotenvy::dotenv;

use pgpdesk::cli::{run_cli, Cli};
use pgpdesk::{init_logging, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    // load environment variables from .env file, if present
    dotenv().ok();

    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    let filter = if cli.verbose {
        "pgpdesk=debug"
    } else {
        settings.log_filter.as_str()
    };
    init_logging(filter);
    tracing::debug!("Settings loaded: max input {} bytes", settings.max_input_bytes);

    match run_cli(cli, &settings).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
