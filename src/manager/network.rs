use std::sync::Arc;

use crate::registry::{Cluster, ClusterStore};

pub const NETWORK_OFFLINE: &str = "network:offline";
pub const NETWORK_ONLINE: &str = "network:online";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSignal {
    Offline,
    Online,
}

impl NetworkSignal {
    /// Maps a named signal from the host application.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            NETWORK_OFFLINE => Some(Self::Offline),
            NETWORK_ONLINE => Some(Self::Online),
            _ => None,
        }
    }
}

/// Forces every live cluster offline, then re-probes it.
pub(crate) fn on_network_offline(store: &ClusterStore) {
    log::info!("cluster-manager: network is offline");
    for cluster in store.clusters() {
        if cluster.is_disconnected() {
            continue;
        }
        cluster.update(|state| {
            state.online = false;
            state.accessible = false;
        });
        spawn_refresh(cluster);
    }
}

pub(crate) fn on_network_online(store: &ClusterStore) {
    log::info!("cluster-manager: network is online");
    for cluster in store.clusters() {
        if !cluster.is_disconnected() {
            spawn_refresh(cluster);
        }
    }
}

// Fire-and-forget: probe failures are dropped without logging.
// TODO: count dropped refresh failures once the engine exports metrics.
fn spawn_refresh(cluster: Arc<Cluster>) {
    tokio::spawn(async move {
        let _ = cluster.refresh_connection_status().await;
    });
}
