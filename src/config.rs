use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "CLUSTER_SYNC_CONFIG";

/// Path prefix the local proxy forwards to the Kubernetes API.
pub const DEFAULT_API_KUBE_PREFIX: &str = "/api-kube";

pub const DEFAULT_LOOPBACK_HOST: &str = "127.0.0.1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Replaces the `/<cluster id>` prefix of loopback requests.
    pub api_kube_prefix: String,
    /// Hosts starting with this value are routed by their first path segment.
    pub loopback_host: String,
    pub health: HealthConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_kube_prefix: DEFAULT_API_KUBE_PREFIX.to_string(),
            loopback_host: DEFAULT_LOOPBACK_HOST.to_string(),
            health: HealthConfig::default(),
        }
    }
}

/// Thresholds used when probing `<server>/healthz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthConfig {
    pub timeout_secs: u64,
    pub slow_threshold_ms: u64,
    /// Many clusters serve self-signed certificates.
    pub accept_invalid_certs: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            slow_threshold_ms: 1500,
            accept_invalid_certs: true,
        }
    }
}

impl HealthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_threshold_ms)
    }
}

impl EngineConfig {
    /// Resolves the config file location.
    /// Respects `CLUSTER_SYNC_CONFIG`, then `<config dir>/cluster-sync/config.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var(CONFIG_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("cluster-sync").join("config.yaml")))
    }

    /// Loads the config from the default location, falling back to defaults
    /// when no file exists there.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("config: cannot determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// A missing file yields defaults; a malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("config: skip (not found)     — {}", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&raw)?;
        log::info!("config: loaded               — {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.api_kube_prefix.starts_with('/') {
            return Err(Error::config(format!(
                "apiKubePrefix must start with '/', got {:?}",
                self.api_kube_prefix
            )));
        }
        if self.loopback_host.is_empty() {
            return Err(Error::config("loopbackHost must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let config = EngineConfig::from_yaml_str("health:\n  timeoutSecs: 2\n").unwrap();

        assert_eq!(config.api_kube_prefix, "/api-kube");
        assert_eq!(config.loopback_host, "127.0.0.1");
        assert_eq!(config.health.timeout(), Duration::from_secs(2));
        assert_eq!(config.health.slow_threshold(), Duration::from_millis(1500));
    }

    #[test]
    fn prefix_without_leading_slash_is_rejected() {
        let err = EngineConfig::from_yaml_str("apiKubePrefix: api-kube\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_from(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "health: [not, a, map]\n").unwrap();

        assert!(matches!(
            EngineConfig::load_from(&path),
            Err(Error::Yaml(_))
        ));
    }
}
