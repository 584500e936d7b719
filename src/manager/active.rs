use crate::models::catalog::CatalogEntity;

/// Rewrites `active` on every cluster entity so only `visible` is set.
/// Returns whether anything changed.
pub(crate) fn mark_active(items: &mut [CatalogEntity], visible: Option<&str>) -> bool {
    let mut changed = false;
    for entity in items.iter_mut().filter_map(CatalogEntity::as_cluster_mut) {
        let active = visible == Some(entity.id());
        if entity.status.active != active {
            entity.status.active = active;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{EntityMetadata, KubernetesCluster};

    fn items(ids: &[&str]) -> Vec<CatalogEntity> {
        ids.iter()
            .map(|id| {
                KubernetesCluster {
                    metadata: EntityMetadata {
                        uid: (*id).into(),
                        ..Default::default()
                    },
                    ..Default::default()
                }
                .into()
            })
            .collect()
    }

    fn active_ids(items: &[CatalogEntity]) -> Vec<&str> {
        items
            .iter()
            .filter_map(CatalogEntity::as_cluster)
            .filter(|e| e.status.active)
            .map(KubernetesCluster::id)
            .collect()
    }

    #[test]
    fn exactly_the_visible_entity_is_active() {
        let mut items = items(&["a", "b", "c"]);
        items[0].as_cluster_mut().unwrap().status.active = true;

        assert!(mark_active(&mut items, Some("b")));
        assert_eq!(active_ids(&items), ["b"]);
        assert!(!mark_active(&mut items, Some("b")));
    }

    #[test]
    fn no_visible_cluster_clears_everything() {
        let mut items = items(&["a", "b"]);
        mark_active(&mut items, Some("a"));

        assert!(mark_active(&mut items, None));
        assert!(active_ids(&items).is_empty());
    }
}
