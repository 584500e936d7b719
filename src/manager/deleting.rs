use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use super::status::apply_status;
use crate::models::catalog::CatalogEntity;
use crate::models::cluster::ClusterId;
use crate::registry::catalog::{cluster_position, CatalogRegistry};

/// Ids of clusters currently being torn down.
///
/// Cheap to clone; every clone shares the same set. Safe to use while a
/// reconciliation pass is running, the next pass sees the latest membership.
#[derive(Clone)]
pub struct DeletionTracker {
    ids: Arc<Mutex<HashSet<ClusterId>>>,
    catalog: Arc<CatalogRegistry>,
}

impl DeletionTracker {
    pub(crate) fn new(catalog: Arc<CatalogRegistry>) -> Self {
        Self {
            ids: Arc::new(Mutex::new(HashSet::new())),
            catalog,
        }
    }

    /// Marks `id` as deleting and flips its entity to `Deleting` right away.
    pub fn add(&self, id: impl Into<ClusterId>) -> bool {
        let id = id.into();
        let inserted = self
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone());

        if inserted {
            log::info!("cluster-manager: deleting cluster {id}");
            self.catalog.update(|items| {
                let Some(index) = cluster_position(items, &id) else {
                    return false;
                };
                let Some(entity) = items.get_mut(index).and_then(CatalogEntity::as_cluster_mut)
                else {
                    return false;
                };
                let before = entity.status.clone();
                apply_status(entity, None, true);
                entity.status != before
            });
        }
        inserted
    }

    /// Ends tracking of `id`. The entity status is left for the next pass.
    pub fn remove(&self, id: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    pub(crate) fn snapshot(&self) -> HashSet<ClusterId> {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
