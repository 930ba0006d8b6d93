use config::builder::DefaultState;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration settings for the IP gate service
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// On-disk locations for lists, audit log and backups
    pub storage: StorageConfig,
    /// Admin API authentication
    #[serde(default)]
    pub admin: AdminConfig,
    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
    /// Expiry sweeper configuration
    pub sweeper: SweeperConfig,
    /// Prometheus exporter configuration
    pub metrics: MetricsConfig,
}

/// Server configuration settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind the server to
    pub host: String,
    /// Port number to listen on
    pub port: u16,
    /// Take the client IP from `X-Forwarded-For` when present
    pub trust_proxy: bool,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
}

/// Storage locations
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding attempts.json, allow.json and deny.json
    pub data_dir: PathBuf,
    /// Directory holding the plain-text access.log
    pub log_dir: PathBuf,
    /// Directory receiving a copy of each list before it is overwritten
    pub backup_dir: PathBuf,
}

/// Admin API configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Bearer token expected on every admin request
    pub token: Option<String>,
}

/// Rate limiting configuration settings
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum number of requests allowed per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_seconds: u64,
}

/// Expiry sweeper configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SweeperConfig {
    /// Seconds between sweeps of the allow list
    pub interval_seconds: u64,
}

/// Prometheus exporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Install the recorder and serve `/metrics`
    pub enabled: bool,
}

impl Settings {
    /// Load configuration from defaults, an optional file and environment variables
    ///
    /// Environment variables use the `IPGATE` prefix with `__` between
    /// sections, e.g. `IPGATE_SERVER__PORT=9000`. The bare `ADMIN_TOKEN` and
    /// `PORT` variables are honored when the prefixed forms are absent.
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let config_file = env::var("IPGATE_CONFIG").unwrap_or_else(|_| "ipgate".to_string());

        let mut builder = Self::with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(&config_file).required(false))
            .add_source(
                config::Environment::with_prefix("IPGATE")
                    .separator("__")
                    .try_parsing(true),
            );

        if env::var("IPGATE_SERVER__PORT").is_err() {
            if let Ok(port) = env::var("PORT") {
                builder = builder.set_override("server.port", port)?;
            }
        }

        let mut settings: Settings = builder.build()?.try_deserialize()?;

        if settings.admin.token.is_none() {
            settings.admin.token = env::var("ADMIN_TOKEN").ok();
        }
        settings.admin.token = settings.admin.token.filter(|t| !t.trim().is_empty());

        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values that would leave a background task or limiter unusable
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let zero = [
            ("sweeper.interval_seconds", self.sweeper.interval_seconds == 0),
            ("rate_limit.max_requests", self.rate_limit.max_requests == 0),
            ("rate_limit.window_seconds", self.rate_limit.window_seconds == 0),
            ("server.request_timeout_seconds", self.server.request_timeout_seconds == 0),
        ];
        match zero.iter().find(|(_, is_zero)| *is_zero) {
            Some((key, _)) => Err(config::ConfigError::Message(format!(
                "{} must be positive",
                key
            ))),
            None => Ok(()),
        }
    }

    fn with_defaults(
        builder: config::ConfigBuilder<DefaultState>,
    ) -> Result<config::ConfigBuilder<DefaultState>, config::ConfigError> {
        let defaults = Settings::default();
        builder
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.trust_proxy", defaults.server.trust_proxy)?
            .set_default(
                "server.request_timeout_seconds",
                defaults.server.request_timeout_seconds as i64,
            )?
            .set_default("storage.data_dir", path_string(&defaults.storage.data_dir))?
            .set_default("storage.log_dir", path_string(&defaults.storage.log_dir))?
            .set_default("storage.backup_dir", path_string(&defaults.storage.backup_dir))?
            .set_default("rate_limit.max_requests", i64::from(defaults.rate_limit.max_requests))?
            .set_default("rate_limit.window_seconds", defaults.rate_limit.window_seconds as i64)?
            .set_default("sweeper.interval_seconds", defaults.sweeper.interval_seconds as i64)?
            .set_default("metrics.enabled", defaults.metrics.enabled)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

fn path_string(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Default values for configuration settings
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8787,
                trust_proxy: true,
                request_timeout_seconds: 30,
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
                log_dir: PathBuf::from("logs"),
                backup_dir: PathBuf::from("backups"),
            },
            admin: AdminConfig::default(),
            rate_limit: RateLimitConfig {
                max_requests: 30,
                window_seconds: 300,
            },
            sweeper: SweeperConfig {
                interval_seconds: 60,
            },
            metrics: MetricsConfig { enabled: true },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_deployment() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8787);
        assert!(settings.server.trust_proxy);
        assert_eq!(settings.rate_limit.max_requests, 30);
        assert_eq!(settings.rate_limit.window(), Duration::from_secs(300));
        assert_eq!(settings.sweeper.interval(), Duration::from_secs(60));
        assert!(settings.admin.token.is_none());
        assert_eq!(settings.bind_address(), "0.0.0.0:8787");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let mut settings = Settings::default();
        settings.sweeper.interval_seconds = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("sweeper.interval_seconds"));
    }

    #[test]
    fn zero_rate_limit_window_is_rejected() {
        let mut settings = Settings::default();
        settings.rate_limit.window_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn defaults_deserialize_through_the_builder() {
        let settings: Settings = Settings::with_defaults(config::Config::builder())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.storage.data_dir, PathBuf::from("data"));
        assert_eq!(settings.server.request_timeout(), Duration::from_secs(30));
        assert!(settings.metrics.enabled);
    }
}
