//! CLI entrypoint for the `roostlight` binary.

use clap::Parser as _;
use eyre::Result;
use roostlight::{cli::Cli, inner_main};

#[tokio::main]
async fn main() -> Result<()> {
    inner_main(Cli::parse()).await
}
