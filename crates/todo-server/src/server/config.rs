use crate::store::StoreConfig;
use anyhow::{Context, bail};
use clap::Parser;
use core::net::SocketAddr;
use core::time::Duration;

/// Runtime configuration for the `todo-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file in the working directory is loaded first).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "todo-server",
    version,
    about = "A gRPC todo service with an HTTP/JSON gateway"
)]
pub struct CliArgs {
    /// Address the gRPC server listens on.
    ///
    /// Environment variable: `GRPC_ADDR`
    #[arg(long, env = "GRPC_ADDR", default_value_t = String::from("0.0.0.0:50051"))]
    pub grpc_addr: String,

    /// Address the HTTP/JSON gateway listens on.
    ///
    /// Environment variable: `HTTP_ADDR`
    #[arg(long, env = "HTTP_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub http_addr: String,

    /// SQLite connection URL. The database file is created if missing.
    ///
    /// Environment variable: `DATABASE_URL`
    #[arg(long, env = "DATABASE_URL", default_value_t = String::from("sqlite://todo.db"))]
    pub database_url: String,

    /// Maximum number of pooled database connections.
    ///
    /// Environment variable: `DB_MAX_CONNECTIONS`
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,

    /// How long a request waits for a pooled connection before the store
    /// reports itself unavailable.
    ///
    /// Environment variable: `DB_ACQUIRE_TIMEOUT_MS`
    #[arg(long, env = "DB_ACQUIRE_TIMEOUT_MS", default_value_t = 3000)]
    pub acquire_timeout_ms: u64,

    /// Keep todos in process memory instead of SQLite.
    ///
    /// Environment variable: `IN_MEMORY`
    #[arg(long, env = "IN_MEMORY", default_value_t = false)]
    pub in_memory: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub grpc_addr: SocketAddr,
    pub http_addr: SocketAddr,
    pub store: StoreConfig,
    pub in_memory: bool,
}

impl ServerConfig {
    /// Loopback listeners on ephemeral ports over an in-memory store. Used
    /// by tests and benchmarks.
    pub fn ephemeral() -> Self {
        Self {
            grpc_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            http_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            store: StoreConfig::in_memory(),
            in_memory: true,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be greater than 0");
        }

        let grpc_addr = args
            .grpc_addr
            .parse()
            .with_context(|| format!("invalid GRPC_ADDR: {}", args.grpc_addr))?;
        let http_addr = args
            .http_addr
            .parse()
            .with_context(|| format!("invalid HTTP_ADDR: {}", args.http_addr))?;

        Ok(Self {
            grpc_addr,
            http_addr,
            store: StoreConfig {
                database_url: args.database_url,
                max_connections: args.max_connections,
                acquire_timeout: Duration::from_millis(args.acquire_timeout_ms),
            },
            in_memory: args.in_memory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let args = CliArgs::try_parse_from(std::iter::once("todo-server").chain(args.iter().copied()))?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn overrides_are_applied() {
        let config = parse(&[
            "--grpc-addr",
            "127.0.0.1:6000",
            "--http-addr",
            "127.0.0.1:6001",
            "--database-url",
            "sqlite::memory:",
            "--acquire-timeout-ms",
            "250",
        ])
        .unwrap();

        assert_eq!(config.grpc_addr.port(), 6000);
        assert_eq!(config.http_addr.port(), 6001);
        assert_eq!(config.store.database_url, "sqlite::memory:");
        assert_eq!(config.store.acquire_timeout, Duration::from_millis(250));
    }

    #[test]
    fn rejects_zero_connections() {
        assert!(parse(&["--max-connections", "0"]).is_err());
    }

    #[test]
    fn rejects_unparseable_addresses() {
        assert!(parse(&["--grpc-addr", "not-an-address"]).is_err());
    }
}
