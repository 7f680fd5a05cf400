//! Serve command: run the HTTP analysis server.

use anyhow::Context;
use clap::Args;
use tokio::net::TcpListener;
use tracing::{info, instrument};

use snippet_lint_core::config::Config;

use crate::server::{self, AppState};

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to listen on (overrides config; default 127.0.0.1:5000).
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Maximum line length in characters.
    #[arg(long)]
    pub max_line_length: Option<usize>,
}

/// Start the HTTP server and block until shutdown.
#[instrument(name = "cmd_serve", skip_all)]
pub async fn cmd_serve(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind = Some(bind);
    }
    if let Some(max) = args.max_line_length {
        config.max_line_length = Some(max);
    }
    anyhow::ensure!(
        config.line_length() > 0,
        "max_line_length must be positive"
    );

    let state = AppState::from_config(&config).context("invalid server configuration")?;
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        addr = %listener.local_addr().context("failed to read local address")?,
        backend = config.backend.as_str(),
        max_line_length = config.line_length(),
        "listening"
    );

    server::serve(listener, state)
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}
