// viki-ui binary - configuration, logging, then the requested command

use anyhow::Result;
use clap::Parser;

use viki_ui::cli::{self, Cli};
use viki_ui::config::Config;
use viki_ui::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config commands exit before logging is set up
    if cli::handle_config_command(&cli.command) {
        return Ok(());
    }

    Config::ensure_config_exists();
    let config = Config::from_env();

    // Dropping the guard flushes the file writer, so hold it until exit
    let _log_guard = logging::init(&config.logging);

    tracing::debug!(
        version = viki_ui::config::VERSION,
        api_url = %config.api_url,
        "viki-ui starting"
    );

    cli::run(cli.command, config).await
}
