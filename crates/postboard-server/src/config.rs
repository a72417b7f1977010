//! Server configuration.

use std::path::PathBuf;

use clap::Parser;
use postboard_core::{StoreConfig, DEFAULT_SUBSCRIPTION_CAPACITY};

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "postboard_server=info,postboard_core=info";

/// Postboard server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory for durable storage. `None` keeps data in memory only.
    pub data_path: Option<PathBuf>,

    /// Events buffered per subscriber before the oldest are dropped.
    pub subscription_capacity: usize,

    /// Load the demo dataset into an empty store at startup.
    pub seed_demo_data: bool,

    /// Log every post event at info level.
    pub log_events: bool,
}

impl ServerConfig {
    /// In-memory configuration with demo data.
    pub fn new() -> Self {
        Self {
            data_path: None,
            subscription_capacity: DEFAULT_SUBSCRIPTION_CAPACITY,
            seed_demo_data: true,
            log_events: true,
        }
    }

    /// Persist data under `path`.
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Set the per-subscriber buffer depth.
    pub fn with_subscription_capacity(mut self, capacity: usize) -> Self {
        self.subscription_capacity = capacity.max(1);
        self
    }

    /// Do not load demo data.
    pub fn without_seed(mut self) -> Self {
        self.seed_demo_data = false;
        self
    }

    /// Do not log post events.
    pub fn without_event_log(mut self) -> Self {
        self.log_events = false;
        self
    }

    /// Store configuration derived from this server configuration.
    pub fn store_config(&self) -> StoreConfig {
        let config = match &self.data_path {
            Some(path) => StoreConfig::persistent(path),
            None => StoreConfig::in_memory(),
        };
        config.with_subscription_capacity(self.subscription_capacity)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Command-line arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "postboard-server")]
#[command(version, about = "Postboard data server", long_about = None)]
pub struct Args {
    /// Directory for durable storage (in-memory when omitted).
    #[arg(short, long)]
    pub data_path: Option<PathBuf>,

    /// Events buffered per subscriber before the oldest are dropped.
    #[arg(long, default_value_t = DEFAULT_SUBSCRIPTION_CAPACITY)]
    pub buffer_capacity: usize,

    /// Skip loading the demo dataset.
    #[arg(long)]
    pub no_seed: bool,

    /// Do not log post events.
    #[arg(long)]
    pub no_event_log: bool,
}

impl Args {
    /// Convert command-line arguments to server configuration.
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            data_path: self.data_path,
            subscription_capacity: self.buffer_capacity.max(1),
            seed_demo_data: !self.no_seed,
            log_events: !self.no_event_log,
        }
    }
}
