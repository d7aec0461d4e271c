//! resizer daemon
//!
//! Listens for instance resize requests on NATS and runs each one as a
//! `ResizeActor` against EC2.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use kameo::actor::{ActorRef, Spawn};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use resizer_core::{DispatcherActor, DispatcherActorArgs, GetStats};

mod config;
mod factory;
mod gateway;

use config::{Config, ConfigSource, DaemonConfig, LogFormat};
use factory::Ec2ProviderFactory;
use gateway::NatsPublisher;

#[derive(Parser)]
#[command(name = "resizer")]
#[command(about = "Resize EC2 instances on request from NATS", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to resizer.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let (config, source) = Config::load_default(cli.config.as_deref())?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_tracing(&config.daemon)?;

    match &source {
        ConfigSource::File(path) => info!(path = %path.display(), "loaded configuration"),
        ConfigSource::Defaults => warn!("no config file found, using defaults"),
    }

    let client = gateway::connect(&config.nats).await?;
    let publisher = Arc::new(NatsPublisher::new(client.clone()));
    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();

    let dispatcher = DispatcherActor::spawn(DispatcherActorArgs {
        provider_factory: Arc::new(Ec2ProviderFactory::new(config.provider.ec2_settings())),
        publisher,
        config: config.workflow.clone(),
        fatal_tx,
    });

    let subscriber = gateway::subscribe(&client, &config.nats).await?;

    let result = tokio::select! {
        res = gateway::run(subscriber, dispatcher.clone()) => res,
        Some(fatal) = fatal_rx.recv() => Err(eyre::Report::new(fatal)),
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down, waiting for in-flight requests");
            drain(&dispatcher).await;
            Ok(())
        }
    };

    if let Ok(stats) = dispatcher.ask(GetStats).await {
        info!(
            received = stats.received,
            completed = stats.completed,
            failed = stats.failed,
            in_flight = stats.in_flight,
            "final counters"
        );
    }

    if let Err(e) = client.flush().await {
        warn!(error = %e, "failed to flush pending events");
    }
    dispatcher.stop_gracefully().await.ok();

    if let Err(e) = &result {
        error!(error = %e, "resizer stopped");
    }
    result
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(config: &DaemonConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    let installed = match config.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    };

    installed.map_err(|e| eyre::eyre!("failed to install tracing subscriber: {e}"))
}

/// Wait for running workers to emit their terminal events
///
/// A second ctrl-c stops waiting.
async fn drain(dispatcher: &ActorRef<DispatcherActor>) {
    let wait = async {
        loop {
            match dispatcher.ask(GetStats).await {
                Ok(stats) if stats.in_flight > 0 => {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                _ => return,
            }
        }
    };

    tokio::select! {
        () = wait => {}
        _ = tokio::signal::ctrl_c() => warn!("abandoning in-flight requests"),
    }
}
