//! Command-line entrypoint for the gofer agent.
use eyre::Result;

pub mod actions;
pub mod cli;
pub mod config;
pub mod display;
pub mod history;
pub mod logging;
pub mod memory;
pub mod oracle;
pub mod prompting;
pub mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
