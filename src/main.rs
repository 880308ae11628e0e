mod args;

use anyhow::Context;
use args::Args;
use clap::Parser;
use geo_sim::generator::{EventGenerator, RngSource, Roster, SystemClock};
use geo_sim::publishers::{
    DryRunPublisher, IotConfig, IotDataPublisher, Publisher, RetryPolicy, RetryingPublisher,
};
use geo_sim::simulator::{Simulator, SimulatorConfig};
use std::process;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(published) => info!(published, "Simulator stopped"),
        Err(e) => {
            eprintln!("{}", error_line(&e));
            process::exit(1);
        }
    }
}

async fn run(args: Args) -> anyhow::Result<u64> {
    let publisher = build_publisher(&args).await;
    let random = match args.seed {
        Some(seed) => RngSource::seeded(seed),
        None => RngSource::from_entropy(),
    };
    let generator = EventGenerator::new(Roster::default(), random, SystemClock);

    let mut simulator = Simulator::new(simulator_config(&args), publisher, generator);
    let summary = simulator
        .run(shutdown_signal())
        .await
        .context("location simulator stopped on error")?;

    Ok(summary.published)
}

fn error_line(e: &anyhow::Error) -> String {
    format!("geo-sim: {e:#}")
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn simulator_config(args: &Args) -> SimulatorConfig {
    SimulatorConfig {
        echo: !args.quiet,
        max_events: args.count,
        ..Default::default()
    }
}

async fn build_publisher(args: &Args) -> Box<dyn Publisher> {
    let publisher: Box<dyn Publisher> = if args.dry_run {
        Box::new(DryRunPublisher)
    } else {
        let config = IotConfig {
            region: args.region.clone(),
            endpoint_url: args.endpoint.clone(),
            ..Default::default()
        };
        Box::new(IotDataPublisher::new(config).await)
    };

    if args.retries == 0 {
        publisher
    } else {
        Box::new(RetryingPublisher::new(
            publisher,
            RetryPolicy::with_retries(args.retries),
        ))
    }
}

fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received interrupt signal (Ctrl+C)");
                let _ = tx.send(true);
            }
            Err(e) => error!("Failed to install Ctrl+C handler: {e}"),
        }
    });

    rx
}
