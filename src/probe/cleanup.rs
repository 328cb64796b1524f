// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Unconditional, best-effort removal of everything a probe created.
//!
//! Objects are registered before they are created, so a create whose
//! response was lost is still cleaned up. A create rejected because the name
//! is taken drops its registration again: that object is not ours. Entries
//! run in reverse order of registration: dependents go before the objects
//! they use.

use super::outcome::ProbeReport;
use crate::error::Result;
use crate::retry::is_already_exists;
use crate::wait::Poller;
use futures::future::BoxFuture;
use futures::FutureExt;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// What a cleanup entry found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Deleted,
    AlreadyAbsent,
}

/// Handle to a registered entry, used to withdraw it
#[derive(Debug, PartialEq, Eq)]
pub struct Registration(u64);

struct CleanupEntry {
    id: u64,
    label: String,
    task: BoxFuture<'static, Result<Deletion>>,
}

pub struct CleanupStack {
    poller: Poller,
    entries: Vec<CleanupEntry>,
    next_id: u64,
}

impl CleanupStack {
    pub fn new(poller: Poller) -> Self {
        Self {
            poller,
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schedule deletion of `name` through `api`
    pub fn register<K>(&mut self, api: Api<K>, name: &str, params: DeleteParams) -> Registration
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        let label = format!("delete {}/{}", K::kind(&()), name);
        let task = delete_if_present(api, name.to_string(), params, self.poller).boxed();
        self.entries.push(CleanupEntry { id, label, task });
        Registration(id)
    }

    /// Withdraw a registered entry without running it
    pub fn disarm(&mut self, registration: Registration) {
        self.entries.retain(|entry| entry.id != registration.0);
    }

    /// Register the deletion of `obj`, then create it.
    ///
    /// Any failure other than `AlreadyExists` keeps the registration, the
    /// object may exist even though the response was lost.
    pub async fn create<K>(&mut self, api: &Api<K>, obj: &K, params: DeleteParams) -> Result<K>
    where
        K: Resource<DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Serialize
            + Debug
            + Send
            + Sync
            + 'static,
    {
        let name = obj.meta().name.clone().unwrap_or_default();
        let registration = self.register(api.clone(), &name, params);

        match api.create(&PostParams::default(), obj).await {
            Ok(created) => Ok(created),
            Err(e) if is_already_exists(&e) => {
                debug!("{} {} already exists, leaving it alone", K::kind(&()), name);
                self.disarm(registration);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run every entry, newest first, recording each into `report`.
    ///
    /// A failing entry does not stop the ones after it.
    pub async fn run(self, report: &mut ProbeReport) {
        for entry in self.entries.into_iter().rev() {
            let started = Instant::now();
            let result = entry.task.await;
            let note = match result {
                Ok(Deletion::AlreadyAbsent) => Some("already absent".to_string()),
                _ => None,
            };
            report.record(&entry.label, started.elapsed(), &result, note);
        }
    }
}

/// Delete `name` unless it is already gone, then wait until it no longer
/// resolves.
#[instrument(skip(api, params, poller), fields(kind = %K::kind(&())))]
pub async fn delete_if_present<K>(
    api: Api<K>,
    name: String,
    params: DeleteParams,
    poller: Poller,
) -> Result<Deletion>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    if api.get_opt(&name).await?.is_none() {
        debug!("{} {} already absent", K::kind(&()), name);
        return Ok(Deletion::AlreadyAbsent);
    }

    match api.delete(&name, &params).await {
        Ok(_) => info!("Deleted {} {}", K::kind(&()), name),
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("{} {} disappeared before delete", K::kind(&()), name);
            return Ok(Deletion::AlreadyAbsent);
        }
        Err(e) => return Err(e.into()),
    }

    let api = &api;
    let name = name.as_str();
    let description = format!("{} {} to be deleted", K::kind(&()), name);
    poller
        .until(&description, move || async move {
            Ok(api.get_opt(name).await?.is_none())
        })
        .await?;

    Ok(Deletion::Deleted)
}
