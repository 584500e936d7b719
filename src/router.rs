//! Maps inbound proxy requests to the cluster that should serve them
//!
//! The local proxy listens on the loopback address and receives requests as
//! `http://127.0.0.1:<port>/<cluster id>/<kube api path>`. Those are rewritten
//! onto the API-proxy prefix. Everything else is routed by host name,
//! `<cluster id>.<frame>.<domain>`.

use std::net::IpAddr;
use std::sync::Arc;

use http::header::HOST;
use http::uri::{PathAndQuery, Uri};
use http::Request;

use crate::config::EngineConfig;
use crate::registry::{Cluster, ClusterStore};

/// Read-only view of the cluster store used per request.
#[derive(Clone)]
pub struct RequestRouter {
    store: Arc<ClusterStore>,
    api_kube_prefix: String,
    loopback_host: String,
}

impl RequestRouter {
    pub fn new(store: Arc<ClusterStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            api_kube_prefix: config.api_kube_prefix.clone(),
            loopback_host: config.loopback_host.clone(),
        }
    }

    /// Finds the cluster for `req`, rewriting its URI for loopback requests.
    ///
    /// Returns `None` when no cluster matches.
    pub fn cluster_for_request<B>(&self, req: &mut Request<B>) -> Option<Arc<Cluster>> {
        let host = request_host(req)?;

        if host.starts_with(&self.loopback_host) {
            if let Some(cluster) = self.route_loopback(req) {
                return Some(cluster);
            }
        }

        cluster_id_from_host(&host).and_then(|id| self.store.get_by_id(id))
    }

    fn route_loopback<B>(&self, req: &mut Request<B>) -> Option<Arc<Cluster>> {
        let path_and_query = req.uri().path_and_query()?.as_str();
        let id = req.uri().path().split('/').nth(1).filter(|id| !id.is_empty())?;
        let cluster = self.store.get_by_id(id)?;

        let rest = path_and_query.get(1 + id.len()..).unwrap_or_default();
        let rewritten: PathAndQuery = format!("{}{rest}", self.api_kube_prefix).parse().ok()?;

        let mut parts = req.uri().clone().into_parts();
        parts.path_and_query = Some(rewritten);
        let uri = Uri::from_parts(parts).ok()?;

        log::debug!("router: {} -> {uri} (cluster {})", req.uri(), cluster.id());
        *req.uri_mut() = uri;
        Some(cluster)
    }
}

fn request_host<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| req.uri().authority().map(|authority| authority.as_str()))
        .map(str::to_string)
}

/// Extracts the cluster id from a `<id>.<frame>.<domain>[:port]` host, the
/// third label from the right. IP literals carry no id.
pub fn cluster_id_from_host(host: &str) -> Option<&str> {
    let hostname = host.split(':').next()?;
    if hostname.parse::<IpAddr>().is_ok() {
        return None;
    }
    let labels: Vec<&str> = hostname.split('.').collect();

    labels
        .len()
        .checked_sub(3)
        .and_then(|index| labels.get(index))
        .copied()
        .filter(|label| !label.is_empty())
}
