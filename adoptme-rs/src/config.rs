use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "memory://";
const DEFAULT_SESSION_TTL: &str = "1h";
const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Parser)]
#[command(
    name = "adoptme-rs",
    version,
    about = "Pet adoption REST API"
)]
pub struct Cli {
    #[arg(long, value_name = "ADDR", conflicts_with = "port")]
    pub bind: Option<SocketAddr>,

    /// Listen on 0.0.0.0:<PORT>.
    #[arg(long, short = 'p', value_name = "PORT")]
    pub port: Option<u16>,

    /// `memory://` or `file://<path>`.
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Session lifetime, e.g. `30m`, `1h`, `7d`.
    #[arg(long, value_name = "DURATION")]
    pub session_ttl: Option<String>,

    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub database_url: String,
    /// `None` when no secret was configured; the caller generates one.
    pub session_secret: Option<String>,
    pub session_ttl: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid value for env var {key}: {value}")]
    InvalidEnv { key: String, value: String },
    #[error("invalid session ttl {value}: {source}")]
    InvalidTtl {
        value: String,
        source: humantime::DurationError,
    },
    #[error("session ttl {value} exceeds the maximum of 365 days")]
    TtlTooLong { value: String },
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<SocketAddr>,
    port: Option<u16>,
    #[serde(alias = "mongo_url")]
    database_url: Option<String>,
    session_secret: Option<String>,
    session_ttl: Option<String>,
}

/// Values read from the process environment.
#[derive(Debug, Default)]
struct EnvConfig {
    port: Option<u16>,
    database_url: Option<String>,
    session_secret: Option<String>,
    session_ttl: Option<String>,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let from_file = read_file_config(cli.config.as_deref())?;
        let from_env = read_env_config()?;
        Self::resolve(cli, from_env, from_file)
    }

    /// CLI wins over env, env over file, file over defaults.
    fn resolve(cli: Cli, env: EnvConfig, file: FileConfig) -> Result<Self, ConfigError> {
        let bind = match (cli.bind, cli.port.or(env.port)) {
            (Some(bind), _) => bind,
            (None, Some(port)) => SocketAddr::from(([0, 0, 0, 0], port)),
            (None, None) => file.bind.unwrap_or_else(|| {
                SocketAddr::from(([0, 0, 0, 0], file.port.unwrap_or(DEFAULT_PORT)))
            }),
        };
        let database_url = cli
            .database_url
            .or(env.database_url)
            .or(file.database_url)
            .unwrap_or_else(|| String::from(DEFAULT_DATABASE_URL));
        let session_secret = env
            .session_secret
            .or(file.session_secret)
            .filter(|secret| !secret.trim().is_empty());
        let ttl_raw = cli
            .session_ttl
            .or(env.session_ttl)
            .or(file.session_ttl)
            .unwrap_or_else(|| String::from(DEFAULT_SESSION_TTL));
        let session_ttl =
            humantime::parse_duration(&ttl_raw).map_err(|source| ConfigError::InvalidTtl {
                value: ttl_raw.clone(),
                source,
            })?;
        if session_ttl > MAX_SESSION_TTL {
            return Err(ConfigError::TtlTooLong { value: ttl_raw });
        }

        Ok(Self {
            bind,
            database_url,
            session_secret,
            session_ttl: session_ttl.max(Duration::from_secs(1)),
        })
    }
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn read_env_config() -> Result<EnvConfig, ConfigError> {
    let port = match read_env("PORT")? {
        Some(raw) => Some(parse_port("PORT", &raw)?),
        None => None,
    };
    let database_url = match read_env("DATABASE_URL")? {
        Some(url) => Some(url),
        None => read_env("MONGO_URL")?,
    };
    Ok(EnvConfig {
        port,
        database_url,
        session_secret: read_env("SESSION_SECRET")?,
        session_ttl: read_env("SESSION_TTL")?,
    })
}

fn read_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidEnv {
            key: String::from(key),
            value: String::from("<non-unicode>"),
        }),
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: String::from(key),
        value: String::from(raw),
    })
}
