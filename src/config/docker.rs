// ABOUTME: Container daemon connection configuration.
// ABOUTME: Endpoint, runtime override, TLS client certificates, and environment loading.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::runtime::{RuntimeType, SocketOverride, detect_local};

pub const DEFAULT_DOCKER_ENDPOINT: &str = "unix:///var/run/docker.sock";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerConfig {
    /// Connect using DOCKER_HOST and friends instead of `endpoint`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub load_from_environment: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub use_tls: bool,

    #[serde(default, skip_serializing_if = "TlsConfig::is_empty")]
    pub tls_config: TlsConfig,

    /// `unix:///path`, `tcp://host:port` or `http://host:port`.
    #[serde(default)]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<RuntimeType>,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

impl Default for DockerConfig {
    fn default() -> Self {
        DockerConfig {
            load_from_environment: false,
            use_tls: false,
            tls_config: TlsConfig::default(),
            endpoint: String::new(),
            runtime: None,
            timeout: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_pem_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_pem_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_pem_path: Option<PathBuf>,
}

impl TlsConfig {
    fn is_empty(&self) -> bool {
        self.ca_pem_path.is_none() && self.cert_pem_path.is_none() && self.key_pem_path.is_none()
    }

    /// Every PEM path must be set and point at an existing file.
    pub fn validate(&self) -> Result<()> {
        let paths = [
            ("ca pem", &self.ca_pem_path),
            ("cert pem", &self.cert_pem_path),
            ("key pem", &self.key_pem_path),
        ];
        for (name, path) in paths {
            match path {
                None => {
                    return Err(Error::InvalidConfig(format!("no {} path specified", name)));
                }
                Some(p) if !p.exists() => {
                    return Err(Error::InvalidConfig(format!(
                        "{} at {} not found",
                        name,
                        p.display()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl DockerConfig {
    /// Fill in an endpoint when none is configured.
    ///
    /// Prefers a locally detected Podman or Docker socket and falls back to
    /// the standard Docker socket path.
    pub fn fill_with_defaults(&mut self) {
        if self.load_from_environment || !self.endpoint.trim().is_empty() {
            return;
        }
        match detect_local() {
            Ok(socket) => {
                self.endpoint = socket.endpoint();
                if self.runtime.is_none() {
                    self.runtime = Some(socket.runtime_type);
                }
            }
            Err(_) => {
                self.endpoint = DEFAULT_DOCKER_ENDPOINT.to_string();
            }
        }
        tracing::info!(endpoint = %self.endpoint, "using default container daemon endpoint");
    }

    pub fn validate(&self) -> Result<()> {
        if self.use_tls {
            self.tls_config.validate()?;
        }
        if !self.load_from_environment && self.endpoint.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "no container daemon endpoint specified".to_string(),
            ));
        }
        Ok(())
    }

    /// Runtime and socket choices for connecting to the configured daemon.
    pub fn socket_override(&self) -> SocketOverride {
        SocketOverride {
            runtime: self.runtime,
            socket: self.socket_path().map(str::to_string),
        }
    }

    /// The filesystem socket path for `unix://` endpoints.
    pub fn socket_path(&self) -> Option<&str> {
        self.endpoint.trim().strip_prefix("unix://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_endpoint_is_kept() {
        let mut config = DockerConfig {
            endpoint: "tcp://10.0.0.2:2376".to_string(),
            ..Default::default()
        };
        config.fill_with_defaults();
        assert_eq!(config.endpoint, "tcp://10.0.0.2:2376");
    }

    #[test]
    fn defaults_always_produce_an_endpoint() {
        let mut config = DockerConfig::default();
        config.fill_with_defaults();
        assert!(config.endpoint.starts_with("unix://"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tls_requires_all_paths() {
        let config = DockerConfig {
            endpoint: "tcp://10.0.0.2:2376".to_string(),
            use_tls: true,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ca pem"));
    }

    #[test]
    fn socket_path_from_unix_endpoint() {
        let config = DockerConfig {
            endpoint: "unix:///run/podman/podman.sock".to_string(),
            ..Default::default()
        };
        assert_eq!(config.socket_path(), Some("/run/podman/podman.sock"));
    }
}
