use anyhow::Result;
use clap::Parser;

mod cli;

use books_api::{config, init_tracing, server};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    init_tracing();

    match args.get_command() {
        cli::Commands::Serve => {
            let cfg = config::load_config(&args.config)?;
            server::start_server(cfg).await?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => {
                let cfg = config::load_config(&args.config)?;
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            }
            cli::ConfigCommands::Validate => {
                config::load_config(&args.config)?;
                println!("Configuration OK");
            }
        },
        cli::Commands::Version => {
            println!("books-api v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
