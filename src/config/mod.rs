//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::store::BLOG_POSTS;

mod cli;

pub use cli::{CliArgs, Command, ListArgs, ServeArgs, ServeOverrides, ShowArgs, StoreOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "sanluis";
const ENV_PREFIX: &str = "SANLUIS";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub request_timeout: Duration,
    pub collection: String,
}

/// The store a process talks to, with the connection details that backend needs.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Rest(RestStoreSettings),
    Postgres(PostgresStoreSettings),
}

#[derive(Debug, Clone)]
pub struct RestStoreSettings {
    pub url: Url,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct PostgresStoreSettings {
    pub url: String,
    pub max_connections: NonZeroU32,
}

impl StoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            StoreBackend::Rest(_) => "rest",
            StoreBackend::Postgres(_) => "postgres",
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::List(args)) => raw.apply_store_overrides(&args.store),
        Some(Command::Show(args)) => raw.apply_store_overrides(&args.store),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    store: RawStoreSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStoreSettings {
    backend: Option<String>,
    rest_url: Option<String>,
    api_key: Option<String>,
    database_url: Option<String>,
    max_connections: Option<u64>,
    request_timeout_seconds: Option<u64>,
    collection: Option<String>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        self.apply_store_overrides(&overrides.store);

        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_store_overrides(&mut self, overrides: &StoreOverrides) {
        if let Some(backend) = overrides.backend.as_ref() {
            self.store.backend = Some(backend.clone());
        }
        if let Some(url) = overrides.rest_url.as_ref() {
            self.store.rest_url = Some(url.clone());
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.store.database_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.request_timeout_seconds {
            self.store.request_timeout_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            store,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let store = build_store_settings(store)?;

        Ok(Self {
            server,
            logging,
            store,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_store_settings(store: RawStoreSettings) -> Result<StoreSettings, LoadError> {
    let timeout_secs = store
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "store.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    let collection = match store.collection {
        Some(collection) => non_blank(Some(collection))
            .ok_or_else(|| LoadError::invalid("store.collection", "must not be empty"))?,
        None => BLOG_POSTS.to_string(),
    };

    let backend_name = non_blank(store.backend).unwrap_or_else(|| "rest".to_string());
    let backend = match backend_name.to_ascii_lowercase().as_str() {
        "rest" | "postgrest" | "supabase" => {
            let raw_url = non_blank(store.rest_url).ok_or_else(|| {
                LoadError::invalid("store.rest_url", "required when store.backend is `rest`")
            })?;
            let url = Url::parse(&raw_url).map_err(|err| {
                LoadError::invalid("store.rest_url", format!("invalid URL `{raw_url}`: {err}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "store.rest_url",
                    format!("unsupported scheme `{}`", url.scheme()),
                ));
            }
            let api_key = non_blank(store.api_key).ok_or_else(|| {
                LoadError::invalid("store.api_key", "required when store.backend is `rest`")
            })?;
            StoreBackend::Rest(RestStoreSettings { url, api_key })
        }
        "postgres" | "postgresql" => {
            let url = non_blank(store.database_url).ok_or_else(|| {
                LoadError::invalid(
                    "store.database_url",
                    "required when store.backend is `postgres`",
                )
            })?;
            let max_connections = non_zero_u32(
                store.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
                "store.max_connections",
            )?;
            StoreBackend::Postgres(PostgresStoreSettings {
                url,
                max_connections,
            })
        }
        other => {
            return Err(LoadError::invalid(
                "store.backend",
                format!("unknown backend `{other}` (expected `rest` or `postgres`)"),
            ));
        }
    };

    Ok(StoreSettings {
        backend,
        request_timeout: Duration::from_secs(timeout_secs),
        collection,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
