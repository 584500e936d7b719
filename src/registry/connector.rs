use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::kubeconfig::{context_server_url, load_kubeconfig};
use crate::config::HealthConfig;
use crate::error::{Error, Result};
use crate::models::cluster::ClusterId;

/// Outcome of a connection probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Responded within the slow threshold
    Healthy,
    /// Responded, but only after the slow threshold
    Slow,
    /// Timed out or connection refused
    Unreachable,
}

impl ConnectionStatus {
    pub fn is_reachable(self) -> bool {
        !matches!(self, Self::Unreachable)
    }
}

/// What a connector needs to know to reach a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub id: ClusterId,
    pub kubeconfig_path: PathBuf,
    pub context_name: String,
}

/// Transport seam between a cluster and its API server.
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    async fn probe(&self, target: &ProbeTarget) -> Result<ConnectionStatus>;

    /// Tears down whatever the connector holds open for `id`.
    fn disconnect(&self, _id: &str) -> Result<()> {
        Ok(())
    }
}

/// Probes `<server>/healthz` of the context's API server.
pub struct HealthzConnector {
    client: reqwest::Client,
    slow_threshold: Duration,
}

impl HealthzConnector {
    pub fn new(config: &HealthConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::probe(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            slow_threshold: config.slow_threshold(),
        })
    }
}

#[async_trait]
impl ClusterConnector for HealthzConnector {
    async fn probe(&self, target: &ProbeTarget) -> Result<ConnectionStatus> {
        let kubeconfig = load_kubeconfig(&target.kubeconfig_path)?;
        let server = context_server_url(&kubeconfig, &target.context_name).ok_or_else(|| {
            Error::kubeconfig(format!(
                "context {} has no server in {}",
                target.context_name,
                target.kubeconfig_path.display()
            ))
        })?;

        let url = format!("{}/healthz", server.trim_end_matches('/'));
        let started = Instant::now();

        Ok(match self.client.get(&url).send().await {
            Ok(_) if started.elapsed() > self.slow_threshold => ConnectionStatus::Slow,
            Ok(_) => ConnectionStatus::Healthy,
            Err(e) => {
                log::debug!("healthz: {} unreachable: {e}", target.id);
                ConnectionStatus::Unreachable
            }
        })
    }
}
