//! Cluster and catalog registries the reconciliation engine works against

pub mod catalog;
pub mod cluster;
pub mod connector;
pub mod kubeconfig;
pub mod store;

pub use catalog::CatalogRegistry;
pub use cluster::Cluster;
pub use connector::{ClusterConnector, ConnectionStatus, HealthzConnector, ProbeTarget};
pub use store::ClusterStore;
