// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::assert::expect_eq;
use super::{ConflictPolicy, Probe, Readiness, ResourceKind, Target, Update, Verification};
use crate::error::Result;
use crate::kubernetes::Session;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;
use kube::Api;
use std::collections::BTreeMap;

const INITIAL_REPLICAS: i32 = 1;
const SCALED_REPLICAS: i32 = 2;

pub struct DeploymentProbe;

/// Deployment selecting its pods by `app=<app>`
pub(crate) fn deployment(
    metadata: ObjectMeta,
    app: &str,
    replicas: i32,
    container: Container,
) -> Deployment {
    let selector = BTreeMap::from([("app".to_string(), app.to_string())]);

    Deployment {
        metadata,
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: LabelSelector {
                match_labels: Some(selector.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Container that does nothing for an hour
pub(crate) fn sleeping_container(name: &str) -> Container {
    Container {
        name: name.to_string(),
        image: Some("alpine".to_string()),
        command: Some(vec![
            "sh".to_string(),
            "-c".to_string(),
            "sleep 3600".to_string(),
        ]),
        ..Default::default()
    }
}

fn desired_replicas(d: &Deployment) -> Option<i32> {
    d.spec.as_ref().and_then(|s| s.replicas)
}

fn available_replicas(d: &Deployment) -> i32 {
    d.status
        .as_ref()
        .and_then(|s| s.available_replicas)
        .unwrap_or(0)
}

/// All desired replicas are available
pub(crate) fn is_available(d: &Deployment) -> bool {
    available_replicas(d) == desired_replicas(d).unwrap_or(1)
}

fn scale_up(d: &mut Deployment) {
    if let Some(spec) = d.spec.as_mut() {
        spec.replicas = Some(SCALED_REPLICAS);
    }
}

fn verify_scaled(d: &Deployment) -> Result<()> {
    expect_eq("spec.replicas", desired_replicas(d), Some(SCALED_REPLICAS))?;
    expect_eq(
        "status.availableReplicas",
        available_replicas(d),
        SCALED_REPLICAS,
    )
}

impl Probe for DeploymentProbe {
    type Resource = Deployment;
    const KIND: ResourceKind = ResourceKind::Deployment;

    fn api(&self, session: &Session) -> Api<Deployment> {
        session.namespaced()
    }

    fn build(&self, target: &Target) -> Deployment {
        deployment(
            target.metadata(),
            &target.name,
            INITIAL_REPLICAS,
            sleeping_container("alpine"),
        )
    }

    fn verify_created(&self, _target: &Target, d: &Deployment) -> Result<()> {
        expect_eq("spec.replicas", desired_replicas(d), Some(INITIAL_REPLICAS))?;
        expect_eq(
            "status.availableReplicas",
            available_replicas(d),
            INITIAL_REPLICAS,
        )
    }

    fn readiness(&self) -> Option<Readiness<Deployment>> {
        Some(Readiness {
            condition: "available",
            predicate: is_available,
        })
    }

    fn update(&self) -> Option<Update<Deployment>> {
        Some(Update {
            mutate: scale_up,
            verify: verify_scaled,
            conflicts: ConflictPolicy::Retry,
            verification: Verification::Eventually("scaled to 2 available replicas"),
        })
    }
}
