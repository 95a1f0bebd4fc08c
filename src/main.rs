//! Product Picker CLI

use std::process;

use clap::Parser;

mod cli;

#[tokio::main]
#[expect(
    clippy::print_stderr,
    clippy::exit,
    reason = "the binary reports failures on stderr and sets the exit status"
)]
pub async fn main() {
    let _env = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    if let Err(error) = cli.run().await {
        eprintln!("{error}");
        process::exit(1);
    }
}
