pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod registry;
pub mod router;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use manager::{ClusterManager, DeletionTracker, NetworkSignal, Reconciler, SyncReport};
pub use models::catalog::{CatalogEntity, ClusterPhase, KubernetesCluster};
pub use models::cluster::{ClusterId, ClusterModel, ClusterPreferences, ClusterState, IconPreference};
pub use registry::{CatalogRegistry, Cluster, ClusterConnector, ClusterStore, HealthzConnector};
pub use router::RequestRouter;
