//! Connection settings for a Consul agent

use crate::error::ConsulError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default Consul HTTP API port
pub const DEFAULT_PORT: u16 = 8500;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// URL scheme used to reach the agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(format!("invalid scheme '{other}', expected one of: http, https")),
        }
    }
}

/// Everything needed to open a client against one Consul endpoint.
///
/// Built once per invocation and handed to [`crate::ConsulClient::connect`] by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub scheme: Scheme,
    /// Verify the agent's TLS certificate (only meaningful with `https`)
    pub verify_tls: bool,
    /// ACL token, sent as `X-Consul-Token`
    pub token: Option<String>,
    pub datacenter: Option<String>,
    pub request_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            scheme: Scheme::Http,
            verify_tls: false,
            token: None,
            datacenter: None,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    /// Build and validate the agent base URL, e.g. `http://localhost:8500`
    ///
    /// # Errors
    /// Returns `ConsulError::Connection` if the host is empty or the
    /// host/port/scheme combination does not form a valid URL.
    pub fn base_url(&self) -> Result<String, ConsulError> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConsulError::Connection("Consul host must not be empty".to_string()));
        }

        let raw = format!("{}://{}:{}", self.scheme, host, self.port);
        let url = reqwest::Url::parse(&raw)
            .map_err(|e| ConsulError::Connection(format!("Invalid Consul address '{raw}': {e}")))?;

        // A host like "consul/v1" or "user@consul" parses but points somewhere else
        if url.path() != "/"
            || url.query().is_some()
            || url.fragment().is_some()
            || !url.username().is_empty()
        {
            return Err(ConsulError::Connection(format!(
                "Invalid Consul address '{raw}': host must not contain a path, query or credentials"
            )));
        }

        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8500);
        assert_eq!(config.scheme, Scheme::Http);
        assert!(!config.verify_tls);
        assert!(config.token.is_none());
        assert!(config.datacenter.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_base_url() {
        let config = ConnectionConfig {
            host: "consul.service.dc1".to_string(),
            port: 8501,
            scheme: Scheme::Https,
            ..Default::default()
        };
        assert_eq!(config.base_url().unwrap(), "https://consul.service.dc1:8501");
    }

    #[test]
    fn test_base_url_rejects_empty_host() {
        let config = ConnectionConfig {
            host: "  ".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.base_url(), Err(ConsulError::Connection(_))));
    }

    #[test]
    fn test_base_url_rejects_malformed_host() {
        for host in ["consul host", "consul/v1", "user@consul", "consul:80"] {
            let config = ConnectionConfig {
                host: host.to_string(),
                ..Default::default()
            };
            assert!(
                matches!(config.base_url(), Err(ConsulError::Connection(_))),
                "host {host:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_scheme_from_str() {
        assert_eq!("http".parse::<Scheme>().unwrap(), Scheme::Http);
        assert_eq!("https".parse::<Scheme>().unwrap(), Scheme::Https);
        assert!("ftp".parse::<Scheme>().is_err());
        assert!("HTTP".parse::<Scheme>().is_err());
    }
}
