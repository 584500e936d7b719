use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use tokio::sync::watch;

use super::connector::{ClusterConnector, ConnectionStatus, ProbeTarget};
use crate::error::Result;
use crate::models::cluster::{ClusterId, ClusterState};

/// Revision counters the store publishes; observers only care that they moved.
pub(crate) struct StoreSignals {
    pub(crate) state: watch::Sender<u64>,
    pub(crate) preferences: watch::Sender<u64>,
}

impl StoreSignals {
    pub(crate) fn new() -> Self {
        Self {
            state: watch::channel(0).0,
            preferences: watch::channel(0).0,
        }
    }

    pub(crate) fn bump_state(&self) {
        self.state.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    pub(crate) fn bump_preferences(&self) {
        self.preferences.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

/// A registered cluster and its live connection flags.
///
/// All writes go through [`Cluster::update`], which holds the write lock for
/// the whole closure so readers never observe a half-applied change.
pub struct Cluster {
    id: ClusterId,
    state: RwLock<ClusterState>,
    connector: Arc<dyn ClusterConnector>,
    signals: Arc<StoreSignals>,
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("id", &self.id)
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl Cluster {
    pub(crate) fn new(
        state: ClusterState,
        connector: Arc<dyn ClusterConnector>,
        signals: Arc<StoreSignals>,
    ) -> Self {
        Self {
            id: state.id.clone(),
            state: RwLock::new(state),
            connector,
            signals,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn snapshot(&self) -> ClusterState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_disconnected(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .disconnected
    }

    /// Applies `f` as one batch and notifies store observers of whatever
    /// actually changed.
    pub fn update<R>(&self, f: impl FnOnce(&mut ClusterState) -> R) -> R {
        let (result, state_changed, prefs_changed) = {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let before = guard.clone();
            let result = f(&mut *guard);
            guard.id.clone_from(&self.id);

            let prefs_changed = before.preferences != guard.preferences;
            let state_changed = {
                let mut without_prefs = before;
                without_prefs.preferences = guard.preferences.clone();
                without_prefs != *guard
            };
            (result, state_changed, prefs_changed)
        };

        if state_changed {
            self.signals.bump_state();
        }
        if prefs_changed {
            self.signals.bump_preferences();
        }
        result
    }

    fn probe_target(&self) -> ProbeTarget {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        ProbeTarget {
            id: state.id.clone(),
            kubeconfig_path: state.kubeconfig_path.clone(),
            context_name: state.context_name.clone(),
        }
    }

    /// Probes the API server and records the verdict in `online`/`accessible`.
    ///
    /// A cluster that got disconnected while the probe was in flight keeps
    /// both flags down.
    pub async fn refresh_connection_status(&self) -> Result<ConnectionStatus> {
        let target = self.probe_target();
        let status = self.connector.probe(&target).await?;
        log::debug!("cluster: {} probed as {status:?}", self.id);

        self.update(|state| {
            let reachable = status.is_reachable() && !state.disconnected;
            state.online = reachable;
            state.accessible = reachable;
            state.last_refreshed_at = Some(Utc::now());
        });
        Ok(status)
    }

    pub async fn connect(&self) -> Result<ConnectionStatus> {
        self.update(|state| state.disconnected = false);
        self.refresh_connection_status().await
    }

    /// Marks the cluster disconnected even when the connector fails to
    /// release its resources; the failure is still returned.
    pub fn disconnect(&self) -> Result<()> {
        let released = self.connector.disconnect(&self.id);
        self.update(|state| {
            state.disconnected = true;
            state.online = false;
            state.accessible = false;
        });
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cluster::{ClusterModel, ClusterPreferences, IconPreference};
    use crate::registry::connector::fake::FakeConnector;

    fn cluster(connector: Arc<FakeConnector>) -> (Cluster, Arc<StoreSignals>) {
        let signals = Arc::new(StoreSignals::new());
        let state = ClusterState::from_model(ClusterModel {
            id: "c1".into(),
            kubeconfig_path: "/k/config".into(),
            context_name: "dev".into(),
            accessible_namespaces: vec![],
            preferences: ClusterPreferences::default(),
        });
        (Cluster::new(state, connector, signals.clone()), signals)
    }

    #[test]
    fn update_bumps_only_the_signal_that_changed() {
        let (cluster, signals) = cluster(Arc::new(FakeConnector::default()));
        let state_rx = signals.state.subscribe();
        let prefs_rx = signals.preferences.subscribe();

        cluster.update(|s| s.preferences.icon = IconPreference::Set("x".into()));
        assert!(prefs_rx.has_changed().unwrap());
        assert!(!state_rx.has_changed().unwrap());

        cluster.update(|s| s.accessible = true);
        assert!(state_rx.has_changed().unwrap());
    }

    #[test]
    fn no_op_update_publishes_nothing() {
        let (cluster, signals) = cluster(Arc::new(FakeConnector::default()));
        let state_rx = signals.state.subscribe();
        let prefs_rx = signals.preferences.subscribe();

        cluster.update(|s| s.disconnected = true);

        assert!(!state_rx.has_changed().unwrap());
        assert!(!prefs_rx.has_changed().unwrap());
    }

    #[test]
    fn update_cannot_change_the_id() {
        let (cluster, _signals) = cluster(Arc::new(FakeConnector::default()));
        cluster.update(|s| s.id = "other".into());
        assert_eq!(cluster.snapshot().id, "c1");
    }

    #[tokio::test]
    async fn connect_then_refresh_marks_accessible() {
        let connector = Arc::new(FakeConnector::answering(ConnectionStatus::Healthy));
        let (cluster, _signals) = cluster(connector.clone());

        cluster.connect().await.unwrap();

        let state = cluster.snapshot();
        assert!(!state.disconnected);
        assert!(state.online && state.accessible);
        assert!(state.last_refreshed_at.is_some());
        assert_eq!(connector.probes_for("c1"), 1);
    }

    #[tokio::test]
    async fn failed_probe_leaves_flags_untouched() {
        let (cluster, _signals) = cluster(Arc::new(FakeConnector::default()));
        cluster.update(|s| {
            s.disconnected = false;
            s.accessible = true;
        });

        assert!(cluster.refresh_connection_status().await.is_err());
        assert!(cluster.snapshot().accessible);
    }

    #[test]
    fn disconnect_failure_still_marks_disconnected() {
        let connector = Arc::new(FakeConnector::default());
        connector.fail_disconnect.lock().unwrap().insert("c1".into());
        let (cluster, _signals) = cluster(connector);
        cluster.update(|s| {
            s.disconnected = false;
            s.online = true;
            s.accessible = true;
        });

        assert!(cluster.disconnect().is_err());
        let state = cluster.snapshot();
        assert!(state.disconnected && !state.online && !state.accessible);
    }
}
