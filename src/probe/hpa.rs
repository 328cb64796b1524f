// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::assert::expect_eq;
use super::deployment::deployment;
use super::{
    CleanupStack, ConflictPolicy, Probe, ProbeContext, ResourceKind, Target, Update, Verification,
};
use crate::error::Result;
use crate::kubernetes::Session;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::autoscaling::v1::{
    CrossVersionObjectReference, HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec,
};
use k8s_openapi::api::core::v1::{Container, ContainerPort};
use kube::api::{DeleteParams, PostParams};
use kube::Api;
use std::future::Future;
use tracing::info;

const MIN_REPLICAS: i32 = 1;
const MAX_REPLICAS: i32 = 5;
const TARGET_CPU: i32 = 50;
const UPDATED_MAX_REPLICAS: i32 = 10;
const UPDATED_TARGET_CPU: i32 = 30;

/// Autoscales a companion nginx Deployment created just for it
pub struct HpaProbe;

/// Name of the Deployment the autoscaler targets
fn scale_target_name(hpa_name: &str) -> String {
    format!("{}-target", hpa_name)
}

fn scale_target(target: &Target) -> Deployment {
    let name = scale_target_name(&target.name);
    deployment(
        target.metadata_named(&name),
        &name,
        1,
        Container {
            name: "nginx".to_string(),
            image: Some("nginx".to_string()),
            ports: Some(vec![ContainerPort {
                container_port: 80,
                ..Default::default()
            }]),
            ..Default::default()
        },
    )
}

fn max_replicas(hpa: &HorizontalPodAutoscaler) -> Option<i32> {
    hpa.spec.as_ref().map(|s| s.max_replicas)
}

fn target_cpu(hpa: &HorizontalPodAutoscaler) -> Option<i32> {
    hpa.spec
        .as_ref()
        .and_then(|s| s.target_cpu_utilization_percentage)
}

fn raise_limits(hpa: &mut HorizontalPodAutoscaler) {
    if let Some(spec) = hpa.spec.as_mut() {
        spec.max_replicas = UPDATED_MAX_REPLICAS;
        spec.target_cpu_utilization_percentage = Some(UPDATED_TARGET_CPU);
    }
}

fn verify_raised_limits(hpa: &HorizontalPodAutoscaler) -> Result<()> {
    expect_eq("spec.maxReplicas", max_replicas(hpa), Some(UPDATED_MAX_REPLICAS))?;
    expect_eq(
        "spec.targetCPUUtilizationPercentage",
        target_cpu(hpa),
        Some(UPDATED_TARGET_CPU),
    )
}

impl Probe for HpaProbe {
    type Resource = HorizontalPodAutoscaler;
    const KIND: ResourceKind = ResourceKind::HorizontalPodAutoscaler;

    fn api(&self, session: &Session) -> Api<HorizontalPodAutoscaler> {
        session.namespaced()
    }

    fn build(&self, target: &Target) -> HorizontalPodAutoscaler {
        HorizontalPodAutoscaler {
            metadata: target.metadata(),
            spec: Some(HorizontalPodAutoscalerSpec {
                scale_target_ref: CrossVersionObjectReference {
                    api_version: Some("apps/v1".to_string()),
                    kind: "Deployment".to_string(),
                    name: scale_target_name(&target.name),
                },
                min_replicas: Some(MIN_REPLICAS),
                max_replicas: MAX_REPLICAS,
                target_cpu_utilization_percentage: Some(TARGET_CPU),
            }),
            ..Default::default()
        }
    }

    fn verify_created(&self, _target: &Target, hpa: &HorizontalPodAutoscaler) -> Result<()> {
        expect_eq("spec.maxReplicas", max_replicas(hpa), Some(MAX_REPLICAS))
    }

    fn update(&self) -> Option<Update<HorizontalPodAutoscaler>> {
        Some(Update {
            mutate: raise_limits,
            verify: verify_raised_limits,
            conflicts: ConflictPolicy::Fail,
            verification: Verification::Immediate,
        })
    }

    fn prepare(
        &self,
        ctx: &ProbeContext<'_>,
        cleanup: &mut CleanupStack,
    ) -> impl Future<Output = Result<()>> + Send {
        let deployments: Api<Deployment> = ctx.session.namespaced();
        let companion = scale_target(&ctx.target);
        let name = scale_target_name(&ctx.target.name);

        async move {
            cleanup
                .create(&deployments, &companion, DeleteParams::default())
                .await?;
            info!(deployment = %name, "Created scale target");
            Ok(())
        }
    }
}
