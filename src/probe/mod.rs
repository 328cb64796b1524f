// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource-lifecycle probes.
//!
//! Every kind goes through the same sequence, driven by [`run_probe`]:
//!
//! ```text
//! Absent -> Created -> [Ready] -> Verified -> (mutated) -> Verified' -> Absent
//! ```
//!
//! A kind only describes what differs: the object it creates, the fields it
//! checks, how it becomes ready and how it is mutated. See [`Probe`].

pub mod assert;
pub mod cleanup;
pub mod configmap;
pub mod deployment;
pub mod hpa;
pub mod job;
pub mod kind;
pub mod lifecycle;
pub mod naming;
pub mod outcome;
pub mod priority_class;
pub mod pvc;
pub mod secret;

pub use cleanup::{CleanupStack, Deletion};
pub use kind::{ParseKindError, ResourceKind};
pub use lifecycle::run_probe;
pub use outcome::{ProbeReport, StepOutcome, StepStatus};

use crate::constants::{labels, results::PLUGIN_NAME};
use crate::error::Result;
use crate::kubernetes::Session;
use crate::wait::Poller;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use kube::api::{DeleteParams, ObjectMeta};
use kube::{Api, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::future::Future;

/// The object a single probe run works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub kind: ResourceKind,
    pub name: String,
    /// `None` for cluster-scoped kinds
    pub namespace: Option<String>,
}

impl Target {
    /// Fresh target with a generated name, scoped to the session namespace
    /// when the kind is namespaced
    pub fn generate(kind: ResourceKind, session: &Session) -> Self {
        Self {
            kind,
            name: naming::unique_name(kind.name_prefix()),
            namespace: kind
                .is_namespaced()
                .then(|| session.namespace().to_string()),
        }
    }

    pub fn metadata(&self) -> ObjectMeta {
        self.metadata_named(&self.name)
    }

    /// Metadata for a companion object living next to the target
    pub fn metadata_named(&self, name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: self.namespace.clone(),
            labels: Some(BTreeMap::from([(
                labels::MANAGED_BY.to_string(),
                PLUGIN_NAME.to_string(),
            )])),
            ..Default::default()
        }
    }
}

/// Shared, read-only state handed to the per-kind hooks
pub struct ProbeContext<'a> {
    pub session: &'a Session,
    pub poller: Poller,
    pub target: Target,
}

/// Condition an asynchronously converging object must reach after creation
pub struct Readiness<K> {
    /// Completes "<kind> <name> to be ..." in timeout messages
    pub condition: &'static str,
    pub predicate: fn(&K) -> bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Re-fetch and re-apply the mutation on a stale resourceVersion
    Retry,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Immediate,
    /// Poll until the check passes; the string completes "<kind> <name> to be ..."
    Eventually(&'static str),
}

/// Fetch-mutate-replace step and the check that it took effect
pub struct Update<K> {
    pub mutate: fn(&mut K),
    pub verify: fn(&K) -> Result<()>,
    pub conflicts: ConflictPolicy,
    pub verification: Verification,
}

/// Per-kind descriptor consumed by [`run_probe`]
pub trait Probe: Send + Sync {
    type Resource: Resource<DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Serialize
        + Debug
        + Send
        + Sync
        + 'static;

    const KIND: ResourceKind;

    /// Name of the extra step run by [`Probe::exercise`], if the kind has one
    const EXERCISE: Option<&'static str> = None;

    fn api(&self, session: &Session) -> Api<Self::Resource>;

    fn build(&self, target: &Target) -> Self::Resource;

    /// Check the fields that matter on the freshly read object
    fn verify_created(&self, target: &Target, obj: &Self::Resource) -> Result<()>;

    fn readiness(&self) -> Option<Readiness<Self::Resource>> {
        None
    }

    fn update(&self) -> Option<Update<Self::Resource>> {
        None
    }

    fn delete_params(&self) -> DeleteParams {
        DeleteParams::default()
    }

    /// Create objects the target depends on. Their cleanup must be
    /// registered on `cleanup` before they are created.
    fn prepare(
        &self,
        _ctx: &ProbeContext<'_>,
        _cleanup: &mut CleanupStack,
    ) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }

    /// Additional checks against the ready object
    fn exercise(
        &self,
        _ctx: &ProbeContext<'_>,
        _obj: &Self::Resource,
        _cleanup: &mut CleanupStack,
    ) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}

impl ResourceKind {
    /// Run the probe for this kind
    pub fn run<'a>(&self, session: &'a Session, poller: Poller) -> LocalBoxFuture<'a, ProbeReport> {
        match self {
            ResourceKind::Secret => run_probe(session, poller, secret::SecretProbe).boxed_local(),
            ResourceKind::Deployment => {
                run_probe(session, poller, deployment::DeploymentProbe).boxed_local()
            }
            ResourceKind::ConfigMap => {
                run_probe(session, poller, configmap::ConfigMapProbe).boxed_local()
            }
            ResourceKind::Job => run_probe(session, poller, job::JobProbe).boxed_local(),
            ResourceKind::PersistentVolumeClaim => {
                run_probe(session, poller, pvc::PvcProbe).boxed_local()
            }
            ResourceKind::PriorityClass => {
                run_probe(session, poller, priority_class::PriorityClassProbe).boxed_local()
            }
            ResourceKind::HorizontalPodAutoscaler => {
                run_probe(session, poller, hpa::HpaProbe).boxed_local()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockService;

    #[tokio::test]
    async fn test_target_scope_follows_kind() {
        let session = Session::new(MockService::new().into_client(), "probe-ns");

        let cm = Target::generate(ResourceKind::ConfigMap, &session);
        let pc = Target::generate(ResourceKind::PriorityClass, &session);

        assert!(cm.name.starts_with("test-configmap-"));
        assert_eq!(cm.namespace.as_deref(), Some("probe-ns"));
        assert!(pc.name.starts_with("test-priorityclass-"));
        assert_eq!(pc.namespace, None);
    }

    #[test]
    fn test_metadata_is_labelled() {
        let target = Target {
            kind: ResourceKind::Job,
            name: "test-job-1".to_string(),
            namespace: Some("default".to_string()),
        };

        let meta = target.metadata_named("companion");

        assert_eq!(meta.name.as_deref(), Some("companion"));
        assert_eq!(meta.namespace.as_deref(), Some("default"));
        assert_eq!(
            meta.labels.unwrap().get("app.kubernetes.io/managed-by").map(String::as_str),
            Some("lifecycle-probe")
        );
    }
}
