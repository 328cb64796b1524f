// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{defaults, env as vars, poll};
use crate::probe::ResourceKind;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Probe suite configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit kubeconfig path, consulted when in-cluster credentials are absent
    pub kubeconfig: Option<PathBuf>,
    pub namespace: String,
    pub results_dir: PathBuf,
    /// Kinds to probe, in run order
    pub kinds: Vec<ResourceKind>,
    pub parallelism: usize,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
    pub create_namespace: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let kinds = match get(vars::KINDS) {
            Some(list) => parse_kinds(&list)?,
            None => ResourceKind::ALL.to_vec(),
        };

        let parallelism = parse_or(
            get(vars::PARALLELISM),
            vars::PARALLELISM,
            defaults::PARALLELISM,
        )?;
        if parallelism == 0 {
            anyhow::bail!("{} must be at least 1", vars::PARALLELISM);
        }

        let interval_secs = parse_or(
            get(vars::POLL_INTERVAL_SECS),
            vars::POLL_INTERVAL_SECS,
            poll::INTERVAL_SECS,
        )?;
        if interval_secs == 0 {
            anyhow::bail!("{} must be at least 1", vars::POLL_INTERVAL_SECS);
        }
        let timeout_secs =
            parse_or(get(vars::TIMEOUT_SECS), vars::TIMEOUT_SECS, poll::TIMEOUT_SECS)?;

        Ok(Config {
            kubeconfig: get(vars::KUBECONFIG).map(PathBuf::from),
            namespace: get(vars::TEST_NAMESPACE)
                .unwrap_or_else(|| defaults::NAMESPACE.to_string()),
            results_dir: get(vars::RESULTS_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(defaults::RESULTS_DIR)),
            kinds,
            parallelism,
            poll_interval: Duration::from_secs(interval_secs),
            poll_timeout: Duration::from_secs(timeout_secs),
            create_namespace: parse_or(
                get(vars::CREATE_NAMESPACE),
                vars::CREATE_NAMESPACE,
                false,
            )?,
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

fn parse_kinds(list: &str) -> Result<Vec<ResourceKind>> {
    let mut kinds = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind: ResourceKind = item
            .parse()
            .with_context(|| format!("Invalid entry in {}", vars::KINDS))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}
