//! Configuration management for the IP gate service.
//! Settings come from built-in defaults, an optional `ipgate.toml`
//! and `IPGATE_`-prefixed environment variables.

mod settings;

pub use settings::{
    AdminConfig, MetricsConfig, RateLimitConfig, ServerConfig, Settings, StorageConfig,
    SweeperConfig,
};
