// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, parse arguments and hand them to the UI.
// - `RUST_LOG` overrides the log level picked from `-v`.

use clap::Parser;
use overview_upload::{config::Cli, ui};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    ui::run(cli)
}
