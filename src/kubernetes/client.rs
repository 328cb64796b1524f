// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client session bootstrap and credential resolution

use crate::config::Config;
use crate::constants::defaults::{FALLBACK_KUBECONFIG, HOME_KUBECONFIG};
use crate::error::{ProbeError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ClusterResourceScope, NamespaceResourceScope};
use kube::{Api, Client, Config as KConfig, Resource};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// One authenticated connection to the control plane, plus the namespace
/// namespaced probes run in.
///
/// Built once per suite run and shared read-only by every probe.
#[derive(Clone)]
pub struct Session {
    client: Client,
    namespace: String,
}

impl Session {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Resolve credentials and build the session.
    ///
    /// In-cluster service account credentials win; otherwise the kubeconfig
    /// from [`resolve_kubeconfig_path`] is loaded. Any failure here is fatal
    /// for the suite.
    #[instrument(skip(config), fields(namespace = %config.namespace))]
    pub async fn connect(config: &Config) -> Result<Self> {
        let client_config = match KConfig::incluster() {
            Ok(c) => {
                info!("Using in-cluster service account credentials");
                c
            }
            Err(e) => {
                debug!("In-cluster credentials unavailable: {}", e);
                let home = home_dir();
                let path = resolve_kubeconfig_path(config.kubeconfig.as_deref(), home.as_deref());
                load_kubeconfig(&path).await?
            }
        };

        let client = Client::try_from(client_config)
            .map_err(|e| ProbeError::CredentialsError(format!("Failed to create client: {}", e)))?;

        info!("Connected to Kubernetes cluster");
        Ok(Self::new(client, config.namespace.clone()))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Api handle for a namespaced kind, bound to the session namespace
    pub fn namespaced<K>(&self) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// Api handle for a cluster-scoped kind
    pub fn cluster<K>(&self) -> Api<K>
    where
        K: Resource<Scope = ClusterResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Api::all(self.client.clone())
    }
}

/// Pick the kubeconfig file to load when not running in-cluster.
///
/// Explicit path first, then `~/.kube/config`, then a fixed fallback.
pub fn resolve_kubeconfig_path(explicit: Option<&Path>, home: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match home {
        Some(home) => home.join(HOME_KUBECONFIG),
        None => PathBuf::from(FALLBACK_KUBECONFIG),
    }
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Build a client config from a kubeconfig file
async fn load_kubeconfig(path: &Path) -> Result<KConfig> {
    info!("Loading kubeconfig from {}", path.display());

    let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
        ProbeError::CredentialsError(format!(
            "Failed to read kubeconfig {}: {}",
            path.display(),
            e
        ))
    })?;

    KConfig::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| ProbeError::CredentialsError(format!("Failed to create config: {}", e)))
}
