//! # MentorMatch CLI
//!
//! Wires the embedding client and a vector index from configuration and
//! exposes profile storage and matching as subcommands.
//!
//! ```text
//! mentormatch init
//! mentormatch store mentors.json
//! mentormatch match mentees.json --json
//! mentormatch demo demos/fixture.json
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod output;

pub use cli::{Cli, Command};
pub use commands::{App, Fixture};
pub use config::MentorMatchConfig;

/// Load configuration and run one command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = MentorMatchConfig::load(cli.config.as_deref())?;
    let app = App::from_config(config)?;
    app.execute(cli.command).await
}
