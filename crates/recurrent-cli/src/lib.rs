//! Recurrent CLI library.
//!
//! Argument parsing, logging setup and report formatting for the `recurrent`
//! binary. The work itself is done by `recurrent-agent`.

pub mod cli;
pub mod output;

pub use cli::{Cli, ReportFormat};
pub use output::Formatter;

use recurrent_agent::{AgentConfig, AgentError, Mode, RecurrentAgent, RunOutput};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins over the `-v`/`-q` flags.
pub fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Load the configuration the arguments name and process its input file
pub async fn run(cli: &Cli) -> Result<(Mode, RunOutput), AgentError> {
    let config = AgentConfig::load(&cli.config)?;
    let mode = config.mode;
    info!("Loaded configuration from {}", cli.config.display());

    let agent = RecurrentAgent::from_config(config)?;
    let output = agent.run().await?;
    Ok((mode, output))
}
