use clap::{Parser, ValueEnum};
use jiff::SignedDuration;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "SNIP_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "SNIP_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "SNIP_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "SNIP_MYSQL_DSN";
pub const DEFAULT_TTL_ENV: &str = "SNIP_DEFAULT_TTL";
pub const LOG_LEVEL_ENV: &str = "SNIP_LOG_LEVEL";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TTL: &str = "0s";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "snip-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix of the short links handed out to clients.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    /// Lifetime of new links, e.g. `24h` or `P7D`. Zero never expires.
    #[arg(long, env = DEFAULT_TTL_ENV, default_value = DEFAULT_TTL)]
    pub default_ttl: SignedDuration,

    /// Fallback filter when `RUST_LOG` is unset.
    #[arg(long, env = LOG_LEVEL_ENV, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

impl CLI {
    pub fn default_ttl(&self) -> Result<Duration, String> {
        Duration::try_from(self.default_ttl)
            .map_err(|_| format!("default TTL must not be negative: {}", self.default_ttl))
    }
}
