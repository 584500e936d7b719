//! Error types for cluster registration, probing and configuration

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::cluster::ClusterId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The kubeconfig file is not present at registration time
    #[error("kubeconfig file not found: {}", .path.display())]
    KubeconfigMissing { path: PathBuf },

    /// The kubeconfig exists but could not be read or understood
    #[error("kubeconfig error: {0}")]
    Kubeconfig(String),

    /// Any other failure while adding a cluster to the store
    #[error("failed to register cluster: {0}")]
    Registration(String),

    /// A cluster with the same id is already registered
    #[error("cluster {0} is already registered")]
    DuplicateCluster(ClusterId),

    /// Connection-status probe failed before producing a verdict
    #[error("probe error: {0}")]
    Probe(String),

    #[error("failed to disconnect cluster {id}: {message}")]
    Disconnect { id: ClusterId, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn kubeconfig_missing(path: impl Into<PathBuf>) -> Self {
        Self::KubeconfigMissing { path: path.into() }
    }

    pub fn kubeconfig(msg: impl Into<String>) -> Self {
        Self::Kubeconfig(msg.into())
    }

    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    pub fn disconnect(id: impl Into<ClusterId>, msg: impl Into<String>) -> Self {
        Self::Disconnect {
            id: id.into(),
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when this is a missing-kubeconfig failure for exactly `path`.
    pub fn is_missing_kubeconfig(&self, path: &Path) -> bool {
        matches!(self, Self::KubeconfigMissing { path: missing } if missing == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_kubeconfig_matches_only_its_own_path() {
        let err = Error::kubeconfig_missing("/home/me/.kube/config");

        assert!(err.is_missing_kubeconfig(Path::new("/home/me/.kube/config")));
        assert!(!err.is_missing_kubeconfig(Path::new("/home/me/.kube/other")));
        assert!(err.to_string().contains("/home/me/.kube/config"));
    }

    #[test]
    fn other_failures_are_never_missing_kubeconfig() {
        let err = Error::registration("context not found");

        assert!(!err.is_missing_kubeconfig(Path::new("/home/me/.kube/config")));
        assert_eq!(
            err.to_string(),
            "failed to register cluster: context not found"
        );
    }
}
