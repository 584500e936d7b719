use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use super::active::mark_active;
use super::bootstrap::{apply_entity_spec, minimal_model, RegistrationFailure, SyncReport};
use super::deleting::DeletionTracker;
use super::merge::update_entity_from_cluster;
use super::network::{on_network_offline, on_network_online, NetworkSignal};
use crate::error::Error;
use crate::models::catalog::KubernetesCluster;
use crate::models::cluster::{ClusterId, IconPreference};
use crate::registry::{CatalogRegistry, Cluster, ClusterStore};

/// The reconciliation handlers, callable one at a time.
///
/// Every handler reads a full snapshot and publishes its catalog writes as
/// one batch. Running a handler twice against the same snapshot is a no-op.
pub struct Reconciler {
    store: Arc<ClusterStore>,
    catalog: Arc<CatalogRegistry>,
    deleting: DeletionTracker,
    visible: watch::Sender<Option<ClusterId>>,
    /// Entities whose kubeconfig was missing, keyed to the path that was tried.
    missing_kubeconfigs: Mutex<HashMap<ClusterId, PathBuf>>,
}

impl Reconciler {
    pub fn new(store: Arc<ClusterStore>, catalog: Arc<CatalogRegistry>) -> Self {
        Self {
            deleting: DeletionTracker::new(catalog.clone()),
            store,
            catalog,
            visible: watch::channel(None).0,
            missing_kubeconfigs: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<ClusterStore> {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<CatalogRegistry> {
        &self.catalog
    }

    pub fn deletion_tracker(&self) -> &DeletionTracker {
        &self.deleting
    }

    pub fn visible_cluster(&self) -> Option<ClusterId> {
        self.visible.borrow().clone()
    }

    /// Publishes only when the reference actually moves.
    pub fn set_visible_cluster(&self, id: Option<ClusterId>) {
        self.visible.send_if_modified(|visible| {
            if *visible == id {
                return false;
            }
            *visible = id;
            true
        });
    }

    pub fn subscribe_visible(&self) -> watch::Receiver<Option<ClusterId>> {
        self.visible.subscribe()
    }

    /// Projects every registered cluster onto its entity.
    pub fn update_catalog(&self) -> bool {
        log::debug!("cluster-manager: updating catalog from cluster store");
        self.merge_clusters(&self.store.clusters())
    }

    pub fn update_entity_from_cluster(&self, cluster: &Arc<Cluster>) -> bool {
        self.merge_clusters(std::slice::from_ref(cluster))
    }

    fn merge_clusters(&self, clusters: &[Arc<Cluster>]) -> bool {
        let snapshots: Vec<_> = clusters.iter().map(|cluster| cluster.snapshot()).collect();
        let mut reset_icons = Vec::new();

        let changed = self.catalog.update(|items| {
            // Read under the catalog lock: a concurrent `DeletionTracker::add`
            // either lands before this batch or writes after it.
            let deleting = self.deleting.snapshot();
            let mut changed = false;
            for state in &snapshots {
                let outcome = update_entity_from_cluster(items, state, deleting.contains(&state.id));
                changed |= outcome.changed;
                if outcome.clear_cluster_icon {
                    reset_icons.push(state.id.clone());
                }
            }
            changed
        });

        for cluster in clusters.iter().filter(|c| reset_icons.iter().any(|id| id == c.id())) {
            cluster.update(|state| {
                if state.preferences.icon == IconPreference::Cleared {
                    state.preferences.icon = IconPreference::Unset;
                }
            });
        }
        changed
    }

    /// Creates or updates the cluster behind every entity, then merges the
    /// updated clusters back in one batch.
    pub fn sync_clusters_from_catalog(&self, entities: &[KubernetesCluster]) -> SyncReport {
        let mut report = SyncReport::default();
        let mut touched = Vec::new();

        self.missing_kubeconfigs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, _| entities.iter().any(|entity| entity.id() == id));

        for entity in entities {
            match self.store.get_by_id(entity.id()) {
                None => self.register(entity, &mut report),
                Some(cluster) => {
                    cluster.update(|state| apply_entity_spec(state, &entity.spec));
                    report.updated.push(entity.id().to_string());
                    touched.push(cluster);
                }
            }
        }

        if !touched.is_empty() {
            self.merge_clusters(&touched);
        }
        report
    }

    fn register(&self, entity: &KubernetesCluster, report: &mut SyncReport) {
        let id = entity.id().to_string();
        let path = &entity.spec.kubeconfig_path;
        let mut missing = self
            .missing_kubeconfigs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if missing.get(&id) == Some(path) && !path.exists() {
            log::debug!("cluster-manager: {id} still waiting for {}", path.display());
            report.skipped.push(id);
            return;
        }

        match self.store.add_cluster(minimal_model(entity)) {
            Ok(_) => {
                missing.remove(&id);
                report.created.push(id);
            }
            Err(error) if error.is_missing_kubeconfig(path) => {
                log::warn!(
                    "cluster-manager: kubeconfig file disappeared for {id}: {}",
                    path.display()
                );
                missing.insert(id.clone(), path.clone());
                report.failures.push(RegistrationFailure { id, error });
            }
            Err(error) => {
                log::error!("cluster-manager: failed to add cluster {id}: {error}");
                missing.remove(&id);
                report.failures.push(RegistrationFailure { id, error });
            }
        }
    }

    /// Sets `active` on the visible cluster's entity and clears it elsewhere.
    pub fn update_active(&self) -> bool {
        let visible = self.visible_cluster();
        self.catalog
            .update(|items| mark_active(items, visible.as_deref()))
    }

    /// Must be called from within a Tokio runtime; refreshes are spawned.
    pub fn on_network(&self, signal: NetworkSignal) {
        match signal {
            NetworkSignal::Offline => on_network_offline(&self.store),
            NetworkSignal::Online => on_network_online(&self.store),
        }
    }

    /// Disconnects every cluster, carrying on past failures.
    pub fn stop(&self) -> Vec<Error> {
        let mut failures = Vec::new();
        for cluster in self.store.clusters() {
            if let Err(error) = cluster.disconnect() {
                log::warn!("cluster-manager: {error}");
                failures.push(error);
            }
        }
        failures
    }
}
