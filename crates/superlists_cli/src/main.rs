//! `superlists` server entry point.
//!
//! # Responsibility
//! - Resolve configuration from defaults, file, environment and flags.
//! - Initialize logging, open the database and serve until shutdown.

mod config;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{AppConfig, CliOverrides, MailConfig, MailTransport};
use log::{error, info};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use superlists_core::db::open_db;
use superlists_core::init_logging;
use superlists_web::{app, AppState, Mailer, StreamMailer};
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Debug, Parser)]
#[command(name = "superlists", version, about = "Shared to-do lists server")]
struct Cli {
    /// TOML config file (defaults to ./superlists.toml when present)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database file
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            port: self.port,
            database: self.database.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("failed to load configuration")?;

    init_logging(&config.logging.level, config.logging.dir.as_deref())
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))?;

    let conn = open_db(&config.database.path).with_context(|| {
        format!(
            "failed to open database at {}",
            config.database.path.display()
        )
    })?;

    let mailer = build_mailer(&config.mail)?;
    let state = AppState::new(conn, mailer, config.server.public_base_url())
        .context("failed to build application state")?;

    let address = SocketAddr::new(config.server.address, config.server.port);
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("event=server_start module=cli status=ok address={address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("event=server_stop module=cli status=ok");
    Ok(())
}

fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    let mailer: Arc<dyn Mailer> = match config.transport {
        MailTransport::Console => Arc::new(StreamMailer::stdout()),
        MailTransport::File => {
            let path = config
                .file
                .as_deref()
                .ok_or_else(|| anyhow!("mail.file is required when mail.transport = \"file\""))?;
            let mailer = StreamMailer::append_to(path)
                .with_context(|| format!("failed to open mail file {}", path.display()))?;
            Arc::new(mailer)
        }
    };
    info!(
        "event=mail_init module=cli status=ok transport={:?}",
        config.transport
    );
    Ok(mailer)
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("event=shutdown_signal module=cli status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("event=shutdown_signal module=cli status=error signal=sigterm error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("event=shutdown_signal module=cli status=ok");
}
