use sessionauth_auth::SessionConfig;
use sessionauth_database::DatabaseConfig;
use std::str::FromStr;

/// Where users, accounts and sessions live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local and lost on restart. Development and tests only.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub store_backend: StoreBackend,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, using postgres", e);
                StoreBackend::Postgres
            }),
            Err(_) => StoreBackend::default(),
        };

        Self {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            store_backend,
            database: DatabaseConfig::from_env(),
            session: SessionConfig::from_env(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_store_backend() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!("postgresql".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
