//! hipache-sync daemon entry point.

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use tokio::signal;

mod aggregate;
mod bindings;
mod config;
mod error;
mod publisher;
mod reconciler;
mod runtime;
mod store;
mod types;
mod watcher;

use config::{Args, Config};
use reconciler::Reconciler;
use runtime::DockerRuntime;
use store::RedisStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load configuration
    let args = Args::parse();
    let cfg = Config::load(&args)?;
    info!("Starting hipache-sync with config: {:?}", cfg);

    let bindings = bindings::load(&cfg.config).context("Unable to read binding file")?;

    let runtime =
        DockerRuntime::connect(&cfg.docker, cfg.network.clone(), cfg.docker_timeout_secs)
            .await
            .context("Unable to initialize Docker client")?;

    let store = RedisStore::connect(&cfg.redis_url(), cfg.store_timeout())
        .await
        .context("Unable to connect to Redis")?;

    // Best effort: the event request goes out when the watcher task first
    // polls the stream, which may be after the startup pass has listed
    // containers. A change in that window is picked up by the next event.
    let (events, watcher_handle) = watcher::spawn(&runtime, cfg.queue_capacity);

    let reconciler = Reconciler::new(bindings, runtime, store);

    let outcome = tokio::select! {
        res = reconciler.run(events) => res,
        sig = signal::ctrl_c() => {
            match sig {
                Ok(()) => info!("Received Ctrl+C, shutting down..."),
                Err(err) => error!("Unable to listen for shutdown signal: {}", err),
            }
            Ok(())
        }
    };

    if let Err(e) = outcome {
        // The watcher knows why the event stream went away.
        let cause = match e {
            error::Error::EventStreamEnded => match watcher_handle.await {
                Ok(Err(cause)) => cause,
                _ => e,
            },
            _ => {
                watcher_handle.abort();
                e
            }
        };
        error!("Reconciler stopped: {}", cause);
        return Err(anyhow::Error::new(cause).context("Reconciliation loop terminated"));
    }

    watcher_handle.abort();
    info!("Shutdown complete.");
    Ok(())
}
