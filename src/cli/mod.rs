use clap::{Parser, Subcommand};
use product_picker::{config::LoggingConfig, observability};

mod search;

#[derive(Debug, Parser)]
#[command(name = "product-picker", about = "Product catalog picker", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search the catalog the way a picker session does
    Search(search::SearchArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        observability::init_subscriber(&self.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        match self.command {
            Commands::Search(args) => search::run(args).await,
        }
    }
}
