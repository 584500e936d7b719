use crate::models::catalog::{ClusterPhase, KubernetesCluster};
use crate::models::cluster::ClusterState;

/// Derives `(phase, enabled)` for a cluster entity.
///
/// Rules are evaluated in order: deletion wins, then a missing backing
/// cluster, then the cluster's connection flags. A disconnected cluster keeps
/// an extension-owned phase; a reserved phase falls back to `Disconnected`.
pub fn derive_status(
    current: &ClusterPhase,
    cluster: Option<&ClusterState>,
    deleting: bool,
) -> (ClusterPhase, bool) {
    if deleting {
        return (ClusterPhase::Deleting, false);
    }

    let phase = match cluster {
        None => ClusterPhase::Disconnected,
        Some(cluster) if cluster.accessible => ClusterPhase::Connected,
        Some(cluster) if !cluster.disconnected => ClusterPhase::Connecting,
        Some(_) => match current {
            ClusterPhase::Extension(_) => current.clone(),
            _ => ClusterPhase::Disconnected,
        },
    };
    (phase, true)
}

/// Writes the derived status onto `entity`.
pub(crate) fn apply_status(
    entity: &mut KubernetesCluster,
    cluster: Option<&ClusterState>,
    deleting: bool,
) {
    let (phase, enabled) = derive_status(&entity.status.phase, cluster, deleting);
    entity.status.phase = phase;
    entity.status.enabled = enabled;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cluster::{ClusterModel, ClusterPreferences};

    fn cluster(accessible: bool, disconnected: bool) -> ClusterState {
        let mut state = ClusterState::from_model(ClusterModel {
            id: "c1".into(),
            kubeconfig_path: "/k/config".into(),
            context_name: "dev".into(),
            accessible_namespaces: vec![],
            preferences: ClusterPreferences::default(),
        });
        state.accessible = accessible;
        state.disconnected = disconnected;
        state
    }

    fn priors() -> Vec<ClusterPhase> {
        vec![
            ClusterPhase::Deleting,
            ClusterPhase::Connected,
            ClusterPhase::Connecting,
            ClusterPhase::Disconnected,
            ClusterPhase::Extension("CustomPhase".into()),
        ]
    }

    #[test]
    fn deleting_overrides_every_other_input() {
        for prior in priors() {
            assert_eq!(derive_status(&prior, None, true), (ClusterPhase::Deleting, false));
            for accessible in [false, true] {
                for disconnected in [false, true] {
                    let state = cluster(accessible, disconnected);
                    assert_eq!(
                        derive_status(&prior, Some(&state), true),
                        (ClusterPhase::Deleting, false)
                    );
                }
            }
        }
    }

    #[test]
    fn missing_cluster_is_disconnected_even_over_extension_phase() {
        for prior in priors() {
            assert_eq!(derive_status(&prior, None, false), (ClusterPhase::Disconnected, true));
        }
    }

    #[test]
    fn accessible_cluster_is_connected_even_when_disconnected_flag_is_set() {
        for prior in priors() {
            for disconnected in [false, true] {
                let state = cluster(true, disconnected);
                assert_eq!(
                    derive_status(&prior, Some(&state), false),
                    (ClusterPhase::Connected, true)
                );
            }
        }
    }

    #[test]
    fn inaccessible_but_not_disconnected_is_connecting() {
        let state = cluster(false, false);
        for prior in priors() {
            assert_eq!(
                derive_status(&prior, Some(&state), false),
                (ClusterPhase::Connecting, true)
            );
        }
    }

    #[test]
    fn disconnected_cluster_preserves_only_extension_phases() {
        let state = cluster(false, true);
        for prior in priors() {
            let expected = if prior.is_reserved() {
                ClusterPhase::Disconnected
            } else {
                prior.clone()
            };
            assert_eq!(derive_status(&prior, Some(&state), false), (expected, true));
        }
    }

    #[test]
    fn apply_status_writes_phase_and_enabled() {
        let mut entity = KubernetesCluster::default();
        entity.status.enabled = true;

        apply_status(&mut entity, None, true);
        assert_eq!(entity.status.phase, ClusterPhase::Deleting);
        assert!(!entity.status.enabled);

        let state = cluster(true, false);
        apply_status(&mut entity, Some(&state), false);
        assert_eq!(entity.status.phase, ClusterPhase::Connected);
        assert!(entity.status.enabled);
    }
}
