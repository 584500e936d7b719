use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use super::cluster::{Cluster, StoreSignals};
use super::connector::ClusterConnector;
use super::kubeconfig::load_kubeconfig;
use crate::error::{Error, Result};
use crate::models::cluster::{ClusterModel, ClusterState};

/// Source of truth for configured clusters, in registration order.
pub struct ClusterStore {
    clusters: RwLock<Vec<Arc<Cluster>>>,
    connector: Arc<dyn ClusterConnector>,
    signals: Arc<StoreSignals>,
}

impl ClusterStore {
    pub fn new(connector: Arc<dyn ClusterConnector>) -> Self {
        Self {
            clusters: RwLock::new(Vec::new()),
            connector,
            signals: Arc::new(StoreSignals::new()),
        }
    }

    pub fn get_by_id(&self, id: &str) -> Option<Arc<Cluster>> {
        self.clusters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|cluster| cluster.id() == id)
            .cloned()
    }

    /// Order-stable copy of the cluster list.
    pub fn clusters(&self) -> Vec<Arc<Cluster>> {
        self.clusters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.clusters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a cluster after checking its kubeconfig can be read.
    ///
    /// # Errors
    /// [`Error::KubeconfigMissing`] when the file is absent,
    /// [`Error::Registration`] when it has no such context,
    /// [`Error::DuplicateCluster`] when the id is taken, and any read or parse
    /// failure of the kubeconfig.
    pub fn add_cluster(&self, model: ClusterModel) -> Result<Arc<Cluster>> {
        let kubeconfig = load_kubeconfig(&model.kubeconfig_path)?;
        if !kubeconfig
            .contexts
            .iter()
            .any(|named| named.name == model.context_name)
        {
            return Err(Error::registration(format!(
                "context {} not found in {}",
                model.context_name,
                model.kubeconfig_path.display()
            )));
        }

        let cluster = {
            let mut clusters = self.clusters.write().unwrap_or_else(PoisonError::into_inner);
            if clusters.iter().any(|c| c.id() == model.id) {
                return Err(Error::DuplicateCluster(model.id));
            }

            let cluster = Arc::new(Cluster::new(
                ClusterState::from_model(model),
                self.connector.clone(),
                self.signals.clone(),
            ));
            clusters.push(cluster.clone());
            cluster
        };

        log::info!("cluster-store: added cluster {}", cluster.id());
        self.signals.bump_state();
        Ok(cluster)
    }

    pub fn remove_by_id(&self, id: &str) -> Option<Arc<Cluster>> {
        let removed = {
            let mut clusters = self.clusters.write().unwrap_or_else(PoisonError::into_inner);
            let index = clusters.iter().position(|c| c.id() == id)?;
            clusters.remove(index)
        };

        log::info!("cluster-store: removed cluster {id}");
        self.signals.bump_state();
        Some(removed)
    }

    /// Fires whenever the list or any cluster's non-preference state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<u64> {
        self.signals.state.subscribe()
    }

    /// Fires whenever any cluster's preferences change.
    pub fn subscribe_preferences(&self) -> watch::Receiver<u64> {
        self.signals.preferences.subscribe()
    }
}
