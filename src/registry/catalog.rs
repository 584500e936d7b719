use tokio::sync::watch;

use crate::models::catalog::{CatalogEntity, KubernetesCluster};

/// Ordered list of discoverable entities.
///
/// Writers hand a closure to [`CatalogRegistry::update`]; the whole closure is
/// published as one new revision, and only if it reports a change.
pub struct CatalogRegistry {
    items: watch::Sender<Vec<CatalogEntity>>,
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<CatalogEntity>) -> Self {
        Self {
            items: watch::channel(items).0,
        }
    }

    pub fn items(&self) -> Vec<CatalogEntity> {
        self.items.borrow().clone()
    }

    pub fn get_items_by_kind(&self, kind: &str) -> Vec<CatalogEntity> {
        self.items
            .borrow()
            .iter()
            .filter(|entity| entity.kind() == kind)
            .cloned()
            .collect()
    }

    /// All `KubernetesCluster` entities, in registry order.
    pub fn kubernetes_clusters(&self) -> Vec<KubernetesCluster> {
        self.items
            .borrow()
            .iter()
            .filter_map(CatalogEntity::as_cluster)
            .cloned()
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<CatalogEntity> {
        self.items
            .borrow()
            .iter()
            .find(|entity| entity.uid() == id)
            .cloned()
    }

    pub fn add(&self, entity: impl Into<CatalogEntity>) {
        let entity = entity.into();
        self.items.send_modify(|items| items.push(entity));
    }

    pub fn remove_by_id(&self, id: &str) -> Option<CatalogEntity> {
        let mut removed = None;
        self.items.send_if_modified(|items| {
            removed = items
                .iter()
                .position(|entity| entity.uid() == id)
                .map(|index| items.remove(index));
            removed.is_some()
        });
        removed
    }

    /// Runs `f` against the live list; `f` returns whether it changed anything.
    pub fn update(&self, f: impl FnOnce(&mut Vec<CatalogEntity>) -> bool) -> bool {
        self.items.send_if_modified(f)
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<CatalogEntity>> {
        self.items.subscribe()
    }
}

/// Position of the cluster entity whose uid is `id`.
pub(crate) fn cluster_position(items: &[CatalogEntity], id: &str) -> Option<usize> {
    items
        .iter()
        .position(|entity| entity.as_cluster().is_some_and(|cluster| cluster.id() == id))
}
