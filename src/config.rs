use clap::Parser;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::watcher::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Docker endpoint: `unix://` socket path or `tcp://host:port`.
    pub docker: String,
    /// Path to the JSON binding file.
    pub config: PathBuf,
    /// Redis address, either a `redis://` URL or `host:port`.
    pub redis: String,
    /// Only use container addresses on this network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    pub queue_capacity: usize,
    pub store_timeout_secs: u64,
    pub docker_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docker: "unix:///var/run/docker.sock".into(),
            config: PathBuf::from("config.json"),
            redis: ":6379".into(),
            network: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            store_timeout_secs: 5,
            docker_timeout_secs: 120,
        }
    }
}

/// Command-line overrides. Anything left unset falls through to the
/// environment, `hipache-sync.json`, `hipache-sync.toml`, then the defaults.
#[derive(Debug, Default, Parser, Serialize)]
#[command(name = "hipache-sync")]
#[command(about = "Keep Hipache's Redis routing table in sync with running Docker containers")]
pub struct Args {
    /// Docker endpoint (unix:///var/run/docker.sock, tcp://host:2375)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker: Option<String>,

    /// Path to the JSON binding file
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,

    /// Redis address (host:port or redis:// URL)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<String>,

    /// Docker network whose addresses are published
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    /// Capacity of the trigger queue between event watcher and reconciler
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,

    /// Timeout for each Redis operation, in seconds
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_timeout_secs: Option<u64>,

    /// Timeout for Docker API requests, in seconds
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        Self::figment(args)
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
    }

    fn figment(args: &Args) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("hipache-sync.toml"))
            .merge(Json::file("hipache-sync.json"))
            .merge(Env::prefixed("HIPACHE_SYNC_"))
            .merge(Serialized::defaults(args))
    }

    /// The Redis address as a connection URL. The `:6379` shorthand means
    /// localhost.
    pub fn redis_url(&self) -> String {
        let addr = self.redis.trim();
        if addr.contains("://") {
            return addr.to_string();
        }
        if let Some(port) = addr.strip_prefix(':') {
            return format!("redis://127.0.0.1:{}/", port);
        }
        format!("redis://{}/", addr)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}
