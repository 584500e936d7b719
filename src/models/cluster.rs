// Plain data held by the cluster store; the live handle lives in registry::cluster
use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type ClusterId = String;

/// Distribution reported until the cluster has been probed.
pub const UNKNOWN_DISTRIBUTION: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusAddress {
    pub namespace: String,
    pub service: String,
    pub port: u16,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrometheusProvider {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Icon override chosen in the cluster settings.
///
/// `Cleared` is an explicit reset request and is distinct from `Unset`: it
/// serialises as `null` while `Unset` is omitted entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IconPreference {
    #[default]
    Unset,
    Set(String),
    Cleared,
}

impl IconPreference {
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// The icon source, if one is set and non-empty.
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Set(src) if !src.is_empty() => Some(src),
            _ => None,
        }
    }
}

impl Serialize for IconPreference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(src) => serializer.serialize_some(src),
            Self::Unset | Self::Cleared => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for IconPreference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            None => Self::Cleared,
            Some(src) if src.is_empty() => Self::Unset,
            Some(src) => Self::Set(src),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "IconPreference::is_unset")]
    pub icon: IconPreference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus_provider: Option<PrometheusProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prometheus: Option<PrometheusAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_cwd: Option<PathBuf>,
}

/// The minimum needed to register a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterModel {
    pub id: ClusterId,
    pub kubeconfig_path: PathBuf,
    pub context_name: String,
    #[serde(default)]
    pub accessible_namespaces: Vec<String>,
    #[serde(default)]
    pub preferences: ClusterPreferences,
}

/// Snapshot of everything the engine reads from a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterState {
    pub id: ClusterId,
    pub kubeconfig_path: PathBuf,
    pub context_name: String,
    pub accessible_namespaces: Vec<String>,
    pub preferences: ClusterPreferences,
    /// The API server answered the last probe at all.
    pub online: bool,
    /// The API server answered the last probe successfully.
    pub accessible: bool,
    /// The connection was deliberately torn down.
    pub disconnected: bool,
    pub labels: BTreeMap<String, String>,
    pub distribution: String,
    pub version: Option<String>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl ClusterState {
    /// A freshly registered cluster starts disconnected until it is connected.
    pub fn from_model(model: ClusterModel) -> Self {
        Self {
            id: model.id,
            kubeconfig_path: model.kubeconfig_path,
            context_name: model.context_name,
            accessible_namespaces: model.accessible_namespaces,
            preferences: model.preferences,
            online: false,
            accessible: false,
            disconnected: true,
            labels: BTreeMap::new(),
            distribution: UNKNOWN_DISTRIBUTION.to_string(),
            version: None,
            last_refreshed_at: None,
        }
    }

    /// Preference override, falling back to the kubeconfig context name.
    pub fn name(&self) -> &str {
        self.preferences
            .cluster_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.context_name)
    }
}
