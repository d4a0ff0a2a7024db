//! Server configuration.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};

use super::error::ValidationError;

/// Deployment environment.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Server configuration (host, port, environment).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub environment: Environment,
}

impl ServerConfig {
    /// Returns the socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ValidationError::invalid("server.host", "not an IP address"))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Validates server configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.socket_addr()?;
        if self.port == 0 {
            return Err(ValidationError::invalid("server.port", "port 0 not allowed"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_loopback() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_host_fails_validation() {
        let config = ServerConfig {
            host: "localhost.example".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
