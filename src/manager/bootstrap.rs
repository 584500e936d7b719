use crate::error::Error;
use crate::models::catalog::{KubernetesCluster, KubernetesClusterSpec};
use crate::models::cluster::{ClusterId, ClusterModel, ClusterState, PrometheusProvider};

/// What one bootstrap pass did, entity by entity.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Entities that got a freshly registered cluster
    pub created: Vec<ClusterId>,
    /// Entities whose existing cluster was updated from the entity spec
    pub updated: Vec<ClusterId>,
    /// Entities left un-backed because their kubeconfig is still missing
    pub skipped: Vec<ClusterId>,
    pub failures: Vec<RegistrationFailure>,
}

impl SyncReport {
    pub fn failure_for(&self, id: &str) -> Option<&RegistrationFailure> {
        self.failures.iter().find(|failure| failure.id == id)
    }
}

#[derive(Debug)]
pub struct RegistrationFailure {
    pub id: ClusterId,
    pub error: Error,
}

impl RegistrationFailure {
    /// Missing kubeconfig is expected while a sync source catches up.
    pub fn is_recoverable_warning(&self) -> bool {
        matches!(self.error, Error::KubeconfigMissing { .. })
    }
}

/// Bare minimum for the cluster store. Preferences stay empty because the
/// entity's source may configure them itself.
pub(crate) fn minimal_model(entity: &KubernetesCluster) -> ClusterModel {
    ClusterModel {
        id: entity.metadata.uid.clone(),
        kubeconfig_path: entity.spec.kubeconfig_path.clone(),
        context_name: entity.spec.kubeconfig_context.clone(),
        accessible_namespaces: entity.spec.accessible_namespaces.clone().unwrap_or_default(),
        preferences: Default::default(),
    }
}

/// Pushes the fields the entity spec is authoritative for onto a cluster.
pub(crate) fn apply_entity_spec(state: &mut ClusterState, spec: &KubernetesClusterSpec) {
    state.kubeconfig_path.clone_from(&spec.kubeconfig_path);
    state.context_name.clone_from(&spec.kubeconfig_context);

    if spec.has_accessible_namespaces {
        state.accessible_namespaces = spec.accessible_namespaces.clone().unwrap_or_default();
    }

    let Some(metrics) = spec.metrics.as_ref().filter(|m| !m.is_local()) else {
        return;
    };
    let Some(prometheus) = metrics.prometheus.as_ref() else {
        return;
    };

    if let Some(kind) = prometheus.kind.as_ref().filter(|k| !k.is_empty()) {
        state.preferences.prometheus_provider = Some(PrometheusProvider { kind: kind.clone() });
    }
    if let Some(address) = prometheus.address.as_ref() {
        state.preferences.prometheus = Some(address.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{EntityMetadata, KubernetesClusterMetrics, PrometheusMetrics};
    use crate::models::cluster::{ClusterPreferences, PrometheusAddress};

    fn state() -> ClusterState {
        ClusterState::from_model(ClusterModel {
            id: "c1".into(),
            kubeconfig_path: "/old/config".into(),
            context_name: "old".into(),
            accessible_namespaces: vec!["kept".into()],
            preferences: ClusterPreferences {
                prometheus_provider: Some(PrometheusProvider {
                    kind: "existing".into(),
                }),
                ..Default::default()
            },
        })
    }

    fn spec() -> KubernetesClusterSpec {
        KubernetesClusterSpec {
            kubeconfig_path: "/new/config".into(),
            kubeconfig_context: "new".into(),
            accessible_namespaces: Some(vec!["a".into(), "b".into()]),
            ..Default::default()
        }
    }

    fn address() -> PrometheusAddress {
        PrometheusAddress {
            namespace: "monitoring".into(),
            service: "prom".into(),
            port: 9090,
            prefix: String::new(),
        }
    }

    #[test]
    fn minimal_model_defaults_namespaces_and_carries_no_preferences() {
        let entity = KubernetesCluster {
            metadata: EntityMetadata {
                uid: "c1".into(),
                ..Default::default()
            },
            spec: KubernetesClusterSpec {
                accessible_namespaces: None,
                ..spec()
            },
            ..Default::default()
        };

        let model = minimal_model(&entity);
        assert_eq!(model.id, "c1");
        assert_eq!(model.context_name, "new");
        assert!(model.accessible_namespaces.is_empty());
        assert_eq!(model.preferences, ClusterPreferences::default());
    }

    #[test]
    fn namespaces_only_move_when_the_restriction_flag_is_set() {
        let mut cluster = state();
        apply_entity_spec(&mut cluster, &spec());
        assert_eq!(cluster.kubeconfig_path, std::path::Path::new("/new/config"));
        assert_eq!(cluster.context_name, "new");
        assert_eq!(cluster.accessible_namespaces, ["kept"]);

        apply_entity_spec(
            &mut cluster,
            &KubernetesClusterSpec {
                has_accessible_namespaces: true,
                ..spec()
            },
        );
        assert_eq!(cluster.accessible_namespaces, ["a", "b"]);
    }

    #[test]
    fn remote_metrics_copy_only_non_empty_fields() {
        let mut cluster = state();
        let mut with_address = spec();
        with_address.metrics = Some(KubernetesClusterMetrics {
            source: "remote".into(),
            prometheus: Some(PrometheusMetrics {
                kind: Some(String::new()),
                address: Some(address()),
                ..Default::default()
            }),
        });

        apply_entity_spec(&mut cluster, &with_address);

        assert_eq!(
            cluster.preferences.prometheus_provider,
            Some(PrometheusProvider {
                kind: "existing".into()
            })
        );
        assert_eq!(cluster.preferences.prometheus, Some(address()));
    }

    #[test]
    fn local_metrics_never_reach_the_cluster() {
        let mut cluster = state();
        let mut local = spec();
        local.metrics = Some(KubernetesClusterMetrics {
            prometheus: Some(PrometheusMetrics {
                kind: Some("helm".into()),
                address: Some(address()),
                ..Default::default()
            }),
            ..KubernetesClusterMetrics::local()
        });

        apply_entity_spec(&mut cluster, &local);

        assert_eq!(cluster.preferences.prometheus_provider.unwrap().kind, "existing");
        assert_eq!(cluster.preferences.prometheus, None);
    }
}
