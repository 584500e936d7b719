use std::io::ErrorKind;
use std::path::Path;

use kube::config::Kubeconfig;

use crate::error::{Error, Result};

/// Reads and parses a single kubeconfig file.
///
/// A file that does not exist is reported as [`Error::KubeconfigMissing`] so
/// callers can tell a vanished file apart from a broken one.
pub fn load_kubeconfig(path: &Path) -> Result<Kubeconfig> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("kubeconfig: skip (not found)     — {}", path.display());
            return Err(Error::kubeconfig_missing(path));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    match Kubeconfig::from_yaml(&raw) {
        Ok(cfg) => {
            log::debug!(
                "kubeconfig: ok   ({} context(s))   — {}",
                cfg.contexts.len(),
                path.display()
            );
            Ok(cfg)
        }
        Err(e) => {
            log::info!("kubeconfig: skip (parse error: {e}) — {}", path.display());
            Err(Error::kubeconfig(format!("{}: {e}", path.display())))
        }
    }
}

/// Looks up the API server URL of `context` through its clusters stanza.
pub fn context_server_url(kubeconfig: &Kubeconfig, context: &str) -> Option<String> {
    let cluster_name = kubeconfig
        .contexts
        .iter()
        .find(|named| named.name == context)?
        .context
        .as_ref()?
        .cluster
        .clone();

    kubeconfig
        .clusters
        .iter()
        .find(|named| named.name == cluster_name)?
        .cluster
        .as_ref()?
        .server
        .clone()
}
