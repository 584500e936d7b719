//! Keeps the cluster store and the catalog in step
//!
//! # Architecture
//!
//! ```text
//! ClusterStore ──state/preferences──┐
//! CatalogRegistry ──entities────────┤
//! visible cluster ──────────────────┼──▶ driver task ──▶ Reconciler handlers
//! network signals ──────────────────┘
//! ```
//!
//! The driver is a single task: handlers run to completion one after the
//! other, on full snapshots, and only when one of the streams moves after the
//! manager started.

mod active;
mod bootstrap;
mod deleting;
mod merge;
mod network;
mod reconciler;
mod status;

use std::sync::{Arc, Mutex, PoisonError};

use http::Request;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub use bootstrap::{RegistrationFailure, SyncReport};
pub use deleting::DeletionTracker;
pub use network::{NetworkSignal, NETWORK_OFFLINE, NETWORK_ONLINE};
pub use reconciler::Reconciler;
pub use status::derive_status;

use crate::config::EngineConfig;
use crate::error::Error;
use crate::models::catalog::{CatalogEntity, KubernetesCluster};
use crate::models::cluster::ClusterId;
use crate::registry::{CatalogRegistry, Cluster, ClusterStore};
use crate::router::RequestRouter;

pub struct ClusterManager {
    reconciler: Arc<Reconciler>,
    router: RequestRouter,
    network: mpsc::UnboundedSender<NetworkSignal>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl ClusterManager {
    /// Spawns the driver task. Must be called from within a Tokio runtime.
    pub fn start(
        store: Arc<ClusterStore>,
        catalog: Arc<CatalogRegistry>,
        config: &EngineConfig,
    ) -> Self {
        let reconciler = Arc::new(Reconciler::new(store.clone(), catalog));
        let (network, signals) = mpsc::unbounded_channel();
        // Subscribe before spawning so changes made right after start() fire.
        let streams = ChangeStreams::subscribe(&reconciler, signals);
        let driver = tokio::spawn(drive(reconciler.clone(), streams));

        Self {
            reconciler,
            router: RequestRouter::new(store, config),
            network,
            driver: Mutex::new(Some(driver)),
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn deletion_tracker(&self) -> &DeletionTracker {
        self.reconciler.deletion_tracker()
    }

    pub fn set_visible_cluster(&self, id: Option<ClusterId>) {
        self.reconciler.set_visible_cluster(id);
    }

    pub fn notify_network(&self, signal: NetworkSignal) {
        if self.network.send(signal).is_err() {
            log::warn!("cluster-manager: driver stopped, dropping {signal:?}");
        }
    }

    /// Sender for hosts that deliver network signals from elsewhere.
    pub fn network_sender(&self) -> mpsc::UnboundedSender<NetworkSignal> {
        self.network.clone()
    }

    pub fn router(&self) -> RequestRouter {
        self.router.clone()
    }

    pub fn get_cluster_for_request<B>(&self, req: &mut Request<B>) -> Option<Arc<Cluster>> {
        self.router.cluster_for_request(req)
    }

    /// Stops reconciling and disconnects every cluster.
    pub fn stop(&self) -> Vec<Error> {
        if let Some(driver) = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            driver.abort();
        }
        self.reconciler.stop()
    }
}

impl Drop for ClusterManager {
    fn drop(&mut self) {
        if let Some(driver) = self
            .driver
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            driver.abort();
        }
    }
}

struct ChangeStreams {
    cluster_state: watch::Receiver<u64>,
    cluster_prefs: watch::Receiver<u64>,
    entities: watch::Receiver<Vec<CatalogEntity>>,
    visible: watch::Receiver<Option<ClusterId>>,
    network: mpsc::UnboundedReceiver<NetworkSignal>,
    tracked: Vec<KubernetesCluster>,
}

impl ChangeStreams {
    fn subscribe(reconciler: &Reconciler, network: mpsc::UnboundedReceiver<NetworkSignal>) -> Self {
        Self {
            cluster_state: reconciler.store().subscribe_state(),
            cluster_prefs: reconciler.store().subscribe_preferences(),
            entities: reconciler.catalog().subscribe(),
            visible: reconciler.subscribe_visible(),
            network,
            tracked: reconciler.catalog().kubernetes_clusters(),
        }
    }
}

async fn drive(reconciler: Arc<Reconciler>, streams: ChangeStreams) {
    let ChangeStreams {
        mut cluster_state,
        mut cluster_prefs,
        mut entities,
        mut visible,
        mut network,
        mut tracked,
    } = streams;

    loop {
        tokio::select! {
            changed = cluster_state.changed() => {
                if changed.is_err() {
                    break;
                }
                reconciler.update_catalog();
            }
            changed = cluster_prefs.changed() => {
                if changed.is_err() {
                    break;
                }
                reconciler.update_catalog();
            }
            changed = entities.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = reconciler.catalog().kubernetes_clusters();
                if current != tracked {
                    reconciler.sync_clusters_from_catalog(&current);
                    reconciler.update_active();
                    tracked = reconciler.catalog().kubernetes_clusters();
                }
            }
            changed = visible.changed() => {
                if changed.is_err() {
                    break;
                }
                reconciler.update_active();
            }
            Some(signal) = network.recv() => reconciler.on_network(signal),
        }
    }

    log::info!("cluster-manager: change streams closed, driver exiting");
}
