use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "suno-proxy.toml";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(20);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;

#[derive(Clone)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub server: ServerConfig,
    pub polling: PollConfig,
}

#[derive(Clone)]
pub struct UpstreamConfig {
    /// Base URL of the generation API, without trailing slash.
    pub base_url: String,
    pub api_key: String,
    /// Injected when a caller does not supply its own callback URL.
    pub default_callback_url: Option<String>,
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("default_callback_url", &self.default_callback_url)
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("upstream", &self.upstream)
            .field("server", &self.server)
            .field("polling", &self.polling)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `["*"]` means any origin.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

// ---------------------------------------------------------------------------
// TOML file shape (every key optional; secrets are env-only)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    server: FileServer,
    #[serde(default)]
    polling: FilePolling,
    #[serde(default)]
    upstream: FileUpstream,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileServer {
    host: Option<String>,
    port: Option<u16>,
    cors_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilePolling {
    interval_secs: Option<u64>,
    max_attempts: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileUpstream {
    callback_url: Option<String>,
}

impl Config {
    /// Load from `.env`-populated process env plus the optional TOML file.
    ///
    /// File path: `SUNO_PROXY_CONFIG` if set (must exist), else
    /// `./suno-proxy.toml` if present.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// [`Config::load`] with an explicit env lookup.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let file = match lookup("SUNO_PROXY_CONFIG").filter(|p| !p.trim().is_empty()) {
            Some(path) => Some(read_file_config(Path::new(path.trim()))?),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Some(read_file_config(&default)?)
                } else {
                    None
                }
            }
        };

        Self::from_sources(file.unwrap_or_default(), lookup)
    }

    /// Build from an explicit TOML string and env lookup. Used by `load` and tests.
    pub fn from_toml_and_env(
        toml_src: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(toml_src).map_err(|source| ConfigError::Toml {
            path: "<inline>".to_string(),
            source,
        })?;
        Self::from_sources(file, lookup)
    }

    /// Build from env lookup only.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::from_sources(FileConfig::default(), lookup)
    }

    fn from_sources(
        file: FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("API_KEY").ok_or(ConfigError::Missing("API_KEY"))?;
        let base_url = get("SUNO_API_URL").ok_or(ConfigError::Missing("SUNO_API_URL"))?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "SUNO_API_URL",
                message: format!("expected an http(s) URL, got {base_url:?}"),
            });
        }
        let base_url = base_url.trim_end_matches('/').to_string();

        let defaults = ServerConfig::default();
        let host = get("HOST").or(file.server.host).unwrap_or(defaults.host);
        let port = match get("PORT") {
            Some(raw) => parse_number("PORT", &raw)?,
            None => file.server.port.unwrap_or(defaults.port),
        };
        let cors_origins = match get("CORS_ORIGINS") {
            Some(raw) => split_origins(&raw),
            None => file.server.cors_origins.unwrap_or(defaults.cors_origins),
        };

        let interval_secs = match get("POLL_INTERVAL_SECS") {
            Some(raw) => parse_number("POLL_INTERVAL_SECS", &raw)?,
            None => file
                .polling
                .interval_secs
                .unwrap_or(DEFAULT_POLL_INTERVAL.as_secs()),
        };
        let max_attempts: u32 = match get("POLL_MAX_ATTEMPTS") {
            Some(raw) => parse_number("POLL_MAX_ATTEMPTS", &raw)?,
            None => file.polling.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        };
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "POLL_MAX_ATTEMPTS",
                message: "attempt budget must be at least 1".to_string(),
            });
        }

        let default_callback_url = get("SUNO_CALLBACK_URL").or(file
            .upstream
            .callback_url
            .filter(|u| !u.trim().is_empty()));

        Ok(Self {
            upstream: UpstreamConfig {
                base_url,
                api_key,
                default_callback_url,
            },
            server: ServerConfig {
                host,
                port,
                cors_origins,
            },
            polling: PollConfig {
                interval: Duration::from_secs(interval_secs),
                max_attempts,
            },
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Toml {
        path: display,
        source,
    })
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        message: format!("{raw:?}: {e}"),
    })
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
