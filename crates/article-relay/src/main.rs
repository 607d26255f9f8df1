use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tracing::{info, warn};

use article_relay::config::{Config, Secrets};
use article_relay::discord::WebhookClient;
use article_relay::queue::{Disposition, QueueHandler, QueueMessage};
use article_relay::relay::Relay;
use article_relay::server::{AppState, build_app};

/// Relay article publication events to a Discord webhook.
#[derive(Parser)]
#[command(name = "article-relay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the YAML config file. A missing file means defaults.
    #[arg(long, global = true, default_value = "article-relay.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default).
    Serve(ServeArgs),

    /// Process one queue batch read from a JSON file.
    ///
    /// The file holds an array of `{"id", "body", "attempts"?}` messages.
    /// One `{"id", "disposition"}` line is printed per message; the exit
    /// status is non-zero when any message must be retried.
    Drain(DrainArgs),
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Override `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Override `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args)]
struct DrainArgs {
    /// Batch file, or `-` for stdin.
    input: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so `drain` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "article_relay=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let secrets = Secrets::from_env()?;

    let relay = Relay::new(Arc::new(
        WebhookClient::new(
            secrets.webhook_url.clone(),
            Duration::from_secs(config.delivery.timeout_seconds),
        )
        .context("building webhook client")?,
    ));

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => serve(config, secrets, relay, args).await,
        Commands::Drain(args) => drain(secrets, relay, args).await,
    }
}

async fn serve(
    config: Config,
    secrets: Secrets,
    relay: Relay,
    args: ServeArgs,
) -> anyhow::Result<ExitCode> {
    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);

    let state = AppState {
        relay,
        secret: secrets.token,
    };
    let app = build_app(state, config.server.request_timeout_seconds);

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding {host}:{port}"))?;
    info!(address = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(ExitCode::SUCCESS)
}

async fn drain(secrets: Secrets, relay: Relay, args: DrainArgs) -> anyhow::Result<ExitCode> {
    let raw = if args.input == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(&args.input)
            .await
            .with_context(|| format!("reading {}", args.input))?
    };
    let batch: Vec<QueueMessage> = serde_json::from_str(&raw).context("parsing queue batch")?;

    let handler = QueueHandler::new(relay, secrets.token);
    let outcomes = handler.process_batch(batch).await;

    let mut retries = 0;
    for outcome in &outcomes {
        if outcome.disposition == Disposition::Retry {
            retries += 1;
        }
        println!("{}", serde_json::to_string(outcome)?);
    }

    if retries > 0 {
        warn!(
            retries,
            total = outcomes.len(),
            "Some messages need redelivery"
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
