use super::status::apply_status;
use crate::models::catalog::{CatalogEntity, KubernetesCluster, KubernetesClusterMetrics};
use crate::models::cluster::{ClusterState, IconPreference};
use crate::registry::catalog::cluster_position;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergeOutcome {
    /// The entity was rewritten in place.
    pub changed: bool,
    /// The cluster's icon preference was a reset request and must be dropped.
    pub clear_cluster_icon: bool,
}

/// Projects `cluster` onto its catalog entity, if it has one.
///
/// The entity keeps its position in `items`.
pub(crate) fn update_entity_from_cluster(
    items: &mut [CatalogEntity],
    cluster: &ClusterState,
    deleting: bool,
) -> MergeOutcome {
    let Some(index) = cluster_position(items, &cluster.id) else {
        return MergeOutcome::default();
    };
    let Some(slot) = items.get_mut(index) else {
        return MergeOutcome::default();
    };
    let Some(current) = slot.as_cluster() else {
        return MergeOutcome::default();
    };

    let mut entity = current.clone();
    let clear_cluster_icon = merge_cluster(&mut entity, cluster, deleting);
    let changed = entity != *current;
    if changed {
        *slot = entity.into();
    }

    MergeOutcome {
        changed,
        clear_cluster_icon,
    }
}

/// Returns true when the cluster's icon preference should be cleared.
fn merge_cluster(entity: &mut KubernetesCluster, cluster: &ClusterState, deleting: bool) -> bool {
    apply_status(entity, Some(cluster), deleting);

    entity
        .metadata
        .labels
        .extend(cluster.labels.iter().map(|(k, v)| (k.clone(), v.clone())));
    entity.metadata.distro = Some(cluster.distribution.clone());
    entity.metadata.kube_version.clone_from(&cluster.version);

    // Without an override the entity's own source owns the name.
    if let Some(name) = cluster.preferences.cluster_name.as_ref().filter(|n| !n.is_empty()) {
        entity.metadata.name.clone_from(name);
    }

    let metrics = entity
        .spec
        .metrics
        .get_or_insert_with(KubernetesClusterMetrics::local);
    if metrics.is_local() {
        let prometheus = metrics.prometheus.get_or_insert_with(Default::default);
        prometheus.kind = cluster
            .preferences
            .prometheus_provider
            .as_ref()
            .map(|provider| provider.kind.clone());
        prometheus.address.clone_from(&cluster.preferences.prometheus);
    }

    match &cluster.preferences.icon {
        IconPreference::Set(src) if !src.is_empty() => {
            entity.spec.icon.get_or_insert_with(Default::default).src = Some(src.clone());
            false
        }
        IconPreference::Cleared => {
            entity.spec.icon = None;
            true
        }
        _ => false,
    }
}
