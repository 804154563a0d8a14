//! Refinery CLI — resolve URL paths to pages in a localized content tree.
//!
//! Looks pages up by path, id, slug or title, and manages the page tree
//! stored in a local libSQL database.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
