use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_TEMPERATURE_API_URL: &str = "http://localhost:8000/";
pub const DEFAULT_WINDSPEED_API_URL: &str = "http://localhost:8080/";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_WORKERS: usize = 1;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Zone applied to date strings that carry no UTC offset.
///
/// `Local` follows the host's timezone database, so results depend on the
/// machine the service runs on. `Utc` makes naive input reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NaiveZone {
    #[default]
    Local,
    Utc,
}

impl FromStr for NaiveZone {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" | "z" => Ok(Self::Utc),
            other => Err(ConfigError::Invalid(format!(
                "api_naive_tz: expected `local` or `utc`, got `{other}`"
            ))),
        }
    }
}

impl fmt::Display for NaiveZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Utc => f.write_str("utc"),
        }
    }
}

/// Upstream provider endpoints
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the temperature provider
    pub temperature_api_url: String,

    /// Base URL of the wind-speed provider
    pub windspeed_api_url: String,
}

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Raises the default log level to `debug`
    pub debug: bool,

    /// Tokio worker threads
    pub workers: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DateConfig {
    pub naive_zone: NaiveZone,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub providers: ProviderConfig,
    pub server: ServerConfig,
    pub dates: DateConfig,
}

/// Flat view of the environment, one field per variable.
#[derive(Debug, Deserialize)]
struct RawSettings {
    temperature_api_url: String,
    windspeed_api_url: String,
    api_host: String,
    api_port: i64,
    api_debug: bool,
    api_workers: i64,
    api_naive_tz: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProviderConfig {
                temperature_api_url: DEFAULT_TEMPERATURE_API_URL.to_string(),
                windspeed_api_url: DEFAULT_WINDSPEED_API_URL.to_string(),
            },
            server: ServerConfig {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                debug: false,
                workers: DEFAULT_WORKERS,
            },
            dates: DateConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(config::Environment::default())
    }

    /// Load configuration from an explicit environment source.
    ///
    /// Tests pass `Environment::default().source(Some(map))` here instead of
    /// mutating the process environment.
    pub fn load_from(env: config::Environment) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .set_default("temperature_api_url", DEFAULT_TEMPERATURE_API_URL)?
            .set_default("windspeed_api_url", DEFAULT_WINDSPEED_API_URL)?
            .set_default("api_host", DEFAULT_HOST)?
            .set_default("api_port", i64::from(DEFAULT_PORT))?
            .set_default("api_debug", false)?
            .set_default("api_workers", DEFAULT_WORKERS as i64)?
            .set_default("api_naive_tz", NaiveZone::default().to_string())?
            .add_source(env.try_parsing(true))
            .build()?;

        let raw: RawSettings = settings.try_deserialize()?;
        Self::from_raw(raw)
    }

    /// Validate the configuration, logging warnings.
    ///
    /// Call after tracing is initialised so warnings are not lost.
    pub fn ensure_valid(&self) -> Result<ValidationResult, ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let port = u16::try_from(raw.api_port).map_err(|_| {
            ConfigError::Invalid(format!("api_port: {} is not a valid port", raw.api_port))
        })?;
        let workers = usize::try_from(raw.api_workers).map_err(|_| {
            ConfigError::Invalid(format!(
                "api_workers: {} is not a valid worker count",
                raw.api_workers
            ))
        })?;

        Ok(Self {
            providers: ProviderConfig {
                temperature_api_url: raw.temperature_api_url,
                windspeed_api_url: raw.windspeed_api_url,
            },
            server: ServerConfig {
                host: raw.api_host,
                port,
                debug: raw.api_debug,
                workers,
            },
            dates: DateConfig {
                naive_zone: raw.api_naive_tz.parse()?,
            },
        })
    }

    /// `host:port` the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.providers.temperature_api_url,
            "temperature_api_url",
            &mut result,
        );
        self.validate_url(
            &self.providers.windspeed_api_url,
            "windspeed_api_url",
            &mut result,
        );

        if self.providers.temperature_api_url == self.providers.windspeed_api_url {
            result.add_warning(
                "windspeed_api_url",
                "Temperature and wind-speed providers share the same URL",
            );
        }

        let own_origin = format!("http://{}/", self.bind_address());
        for (field, url) in [
            ("temperature_api_url", &self.providers.temperature_api_url),
            ("windspeed_api_url", &self.providers.windspeed_api_url),
        ] {
            if url.trim_end_matches('/') == own_origin.trim_end_matches('/') {
                result.add_warning(field, "Provider URL points at this service's own address");
            }
        }

        if self.server.host.trim().is_empty() {
            result.add_error("api_host", "Host cannot be empty");
        }

        if self.server.port == 0 {
            result.add_error("api_port", "Port cannot be 0");
        }

        if self.server.workers == 0 {
            result.add_error("api_workers", "At least one worker is required");
        } else if self.server.workers > 512 {
            result.add_warning("api_workers", "Worker count is unusually large (>512)");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.query().is_some() {
                    result.add_error(field_name, "URL must not carry a query string");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }
}
