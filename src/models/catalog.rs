// Catalog entities as published to the rest of the application
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::cluster::{ClusterId, ClusterState, PrometheusAddress};

pub const KUBERNETES_CLUSTER_KIND: &str = "KubernetesCluster";

/// Metrics source meaning "use the cluster's own preferences".
pub const LOCAL_METRICS_SOURCE: &str = "local";

/// Provenance tag for entities built from the cluster store itself.
pub const LOCAL_ENTITY_SOURCE: &str = "local";

/// Lifecycle phase of a cluster entity.
///
/// The first four variants are owned by the reconciliation engine. Anything
/// else was put there by an extension and is carried as `Extension`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClusterPhase {
    Deleting,
    Connected,
    Connecting,
    #[default]
    Disconnected,
    Extension(String),
}

impl ClusterPhase {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Deleting => "deleting",
            Self::Connected => "connected",
            Self::Connecting => "connecting",
            Self::Disconnected => "disconnected",
            Self::Extension(phase) => phase,
        }
    }

    pub fn is_reserved(&self) -> bool {
        !matches!(self, Self::Extension(_))
    }
}

impl From<String> for ClusterPhase {
    fn from(value: String) -> Self {
        match value.as_str() {
            "deleting" => Self::Deleting,
            "connected" => Self::Connected,
            "connecting" => Self::Connecting,
            "disconnected" => Self::Disconnected,
            _ => Self::Extension(value),
        }
    }
}

impl From<&str> for ClusterPhase {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ClusterPhase> for String {
    fn from(phase: ClusterPhase) -> Self {
        match phase {
            ClusterPhase::Extension(phase) => phase,
            reserved => reserved.as_str().to_string(),
        }
    }
}

impl fmt::Display for ClusterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub uid: ClusterId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterEntityStatus {
    #[serde(default)]
    pub phase: ClusterPhase,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusMetrics {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<PrometheusAddress>,
    /// Descriptor fields the engine does not interpret.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesClusterMetrics {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus: Option<PrometheusMetrics>,
}

impl KubernetesClusterMetrics {
    pub fn local() -> Self {
        Self {
            source: LOCAL_METRICS_SOURCE.to_string(),
            prometheus: None,
        }
    }

    pub fn is_local(&self) -> bool {
        self.source == LOCAL_METRICS_SOURCE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityIcon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesClusterSpec {
    pub kubeconfig_path: PathBuf,
    pub kubeconfig_context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessible_namespaces: Option<Vec<String>>,
    /// Whether `accessible_namespaces` should be pushed onto the cluster.
    #[serde(rename = "accessibleNamespace", default)]
    pub has_accessible_namespaces: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<KubernetesClusterMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<EntityIcon>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesCluster {
    pub metadata: EntityMetadata,
    pub spec: KubernetesClusterSpec,
    #[serde(default)]
    pub status: ClusterEntityStatus,
}

impl KubernetesCluster {
    pub fn id(&self) -> &str {
        &self.metadata.uid
    }

    /// Builds a local-source entity describing `cluster`.
    pub fn from_cluster(cluster: &ClusterState) -> Self {
        let phase = if cluster.disconnected {
            ClusterPhase::Disconnected
        } else {
            ClusterPhase::Connected
        };

        Self {
            metadata: EntityMetadata {
                uid: cluster.id.clone(),
                name: cluster.name().to_string(),
                source: Some(LOCAL_ENTITY_SOURCE.to_string()),
                labels: cluster.labels.clone(),
                distro: Some(cluster.distribution.clone()),
                kube_version: cluster.version.clone(),
            },
            spec: KubernetesClusterSpec {
                kubeconfig_path: cluster.kubeconfig_path.clone(),
                kubeconfig_context: cluster.context_name.clone(),
                icon: Some(EntityIcon::default()),
                ..Default::default()
            },
            status: ClusterEntityStatus {
                phase,
                enabled: true,
                active: !cluster.disconnected,
                reason: Some(String::new()),
                message: Some(String::new()),
            },
        }
    }
}

/// Any catalog entity that is not a Kubernetes cluster. The engine never
/// touches these; they only share the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericEntity {
    pub kind: String,
    pub metadata: EntityMetadata,
    #[serde(default)]
    pub spec: serde_json::Value,
    #[serde(default)]
    pub status: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntity {
    KubernetesCluster(KubernetesCluster),
    Other(GenericEntity),
}

impl CatalogEntity {
    pub fn uid(&self) -> &str {
        match self {
            Self::KubernetesCluster(entity) => &entity.metadata.uid,
            Self::Other(entity) => &entity.metadata.uid,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::KubernetesCluster(_) => KUBERNETES_CLUSTER_KIND,
            Self::Other(entity) => &entity.kind,
        }
    }

    pub fn as_cluster(&self) -> Option<&KubernetesCluster> {
        match self {
            Self::KubernetesCluster(entity) => Some(entity),
            Self::Other(_) => None,
        }
    }

    pub fn as_cluster_mut(&mut self) -> Option<&mut KubernetesCluster> {
        match self {
            Self::KubernetesCluster(entity) => Some(entity),
            Self::Other(_) => None,
        }
    }
}

impl From<KubernetesCluster> for CatalogEntity {
    fn from(entity: KubernetesCluster) -> Self {
        Self::KubernetesCluster(entity)
    }
}

impl From<GenericEntity> for CatalogEntity {
    fn from(entity: GenericEntity) -> Self {
        Self::Other(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cluster::{ClusterModel, ClusterPreferences};

    #[test]
    fn reserved_phases_parse_and_unknown_values_become_extensions() {
        assert_eq!(ClusterPhase::from("connected"), ClusterPhase::Connected);
        assert_eq!(ClusterPhase::from("deleting"), ClusterPhase::Deleting);
        assert_eq!(
            ClusterPhase::from("Provisioning"),
            ClusterPhase::Extension("Provisioning".into())
        );
        assert!(!ClusterPhase::from("Provisioning").is_reserved());
        assert!(ClusterPhase::Connecting.is_reserved());
    }

    #[test]
    fn entity_spec_reads_camel_case_json() {
        let raw = r#"{
            "metadata": {"uid": "c1", "name": "prod", "labels": {"env": "prod"}},
            "spec": {
                "kubeconfigPath": "/k/config",
                "kubeconfigContext": "prod",
                "accessibleNamespaces": ["a"],
                "accessibleNamespace": true,
                "metrics": {"source": "remote", "prometheus": {"type": "helm", "scrape": "30s"}}
            },
            "status": {"phase": "Provisioning"}
        }"#;

        let entity: KubernetesCluster = serde_json::from_str(raw).unwrap();

        assert!(entity.spec.has_accessible_namespaces);
        assert_eq!(entity.status.phase, ClusterPhase::Extension("Provisioning".into()));
        let prometheus = entity.spec.metrics.unwrap().prometheus.unwrap();
        assert_eq!(prometheus.kind.as_deref(), Some("helm"));
        assert_eq!(prometheus.extra.get("scrape"), Some(&serde_json::json!("30s")));
    }

    #[test]
    fn from_cluster_reflects_connection_state() {
        let mut state = ClusterState::from_model(ClusterModel {
            id: "c1".into(),
            kubeconfig_path: "/k/config".into(),
            context_name: "kind-dev".into(),
            accessible_namespaces: vec![],
            preferences: ClusterPreferences::default(),
        });
        state.labels.insert("team".into(), "infra".into());

        let entity = KubernetesCluster::from_cluster(&state);
        assert_eq!(entity.metadata.name, "kind-dev");
        assert_eq!(entity.metadata.source.as_deref(), Some(LOCAL_ENTITY_SOURCE));
        assert_eq!(entity.status.phase, ClusterPhase::Disconnected);
        assert!(!entity.status.active);

        state.disconnected = false;
        let entity = KubernetesCluster::from_cluster(&state);
        assert_eq!(entity.status.phase, ClusterPhase::Connected);
        assert!(entity.status.active);
        assert_eq!(entity.metadata.labels.get("team").map(String::as_str), Some("infra"));
    }
}
