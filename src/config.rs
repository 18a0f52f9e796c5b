//! Server configuration parsed from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Build server config from environment variables.
    ///
    /// - `PORT`: default 8080
    /// - `BIND_ADDR`: default `0.0.0.0`
    /// - `CORS_ALLOWED_ORIGINS`: comma-separated, defaults to the local dev servers
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `PORT` or `BIND_ADDR` is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(
            std::env::var("PORT").ok().as_deref(),
            std::env::var("BIND_ADDR").ok().as_deref(),
            std::env::var("CORS_ALLOWED_ORIGINS").ok().as_deref(),
        )
    }

    fn from_vars(port: Option<&str>, bind_addr: Option<&str>, origins: Option<&str>) -> Result<Self, ConfigError> {
        let port = match port {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value: raw.to_string() })?,
            None => DEFAULT_PORT,
        };
        let bind_addr = match bind_addr {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "BIND_ADDR", value: raw.to_string() })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        Ok(Self { bind_addr, port, cors_origins: parse_origins(origins) })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_origins(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(list) => list
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/'))
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect(),
        None => DEFAULT_CORS_ORIGINS.iter().map(|o| (*o).to_owned()).collect(),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
