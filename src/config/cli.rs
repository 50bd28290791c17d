use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

use crate::domain::types::Locale;

/// Command-line arguments for the San Luis Way blog binary.
#[derive(Debug, Parser)]
#[command(name = "sanluis-blog", version, about = "San Luis Way blog content service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SANLUIS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve published posts over HTTP.
    Serve(Box<ServeArgs>),
    /// Print every published post as JSON, newest first.
    List(ListArgs),
    /// Print the post with the given slug as JSON.
    Show(ShowArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct StoreOverrides {
    /// Override the store backend (rest|postgres).
    #[arg(long = "store-backend", value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Override the Supabase/PostgREST base URL.
    #[arg(long = "store-rest-url", value_name = "URL")]
    pub rest_url: Option<String>,

    /// Override the Postgres connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the store request timeout.
    #[arg(long = "store-request-timeout-seconds", value_name = "SECONDS")]
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub store: StoreOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    #[command(flatten)]
    pub store: StoreOverrides,

    /// Collapse language variants into one language (es|en).
    #[arg(long, value_name = "LOCALE")]
    pub locale: Option<Locale>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub store: StoreOverrides,

    /// Collapse language variants into one language (es|en).
    #[arg(long, value_name = "LOCALE")]
    pub locale: Option<Locale>,

    /// Slug of the post to print.
    #[arg(value_name = "SLUG")]
    pub slug: String,
}
