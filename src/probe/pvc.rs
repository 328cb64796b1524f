// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::assert::expect_eq;
use super::naming::unique_name;
use super::{CleanupStack, Probe, ProbeContext, Readiness, ResourceKind, Target};
use crate::error::Result;
use crate::kubernetes::Session;
use k8s_openapi::api::core::v1::{
    Container, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, Pod, PodSpec, Volume, VolumeMount,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::DeleteParams;
use kube::Api;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::info;

const ACCESS_MODE: &str = "ReadWriteOnce";
const STORAGE_REQUEST: &str = "10Mi";
const VOLUME_NAME: &str = "pvc-volume";
const MOUNT_PATH: &str = "/mnt/test";

/// Claims a small volume, waits for it to bind, then proves it can be
/// mounted by a running pod.
pub struct PvcProbe;

fn phase(pvc: &PersistentVolumeClaim) -> Option<&str> {
    pvc.status.as_ref().and_then(|s| s.phase.as_deref())
}

fn is_bound(pvc: &PersistentVolumeClaim) -> bool {
    phase(pvc) == Some("Bound")
}

fn is_running(pod: &Pod) -> bool {
    pod.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Running")
}

fn storage_request(pvc: &PersistentVolumeClaim) -> Option<&str> {
    pvc.spec
        .as_ref()
        .and_then(|s| s.resources.as_ref())
        .and_then(|r| r.requests.as_ref())
        .and_then(|r| r.get("storage"))
        .map(|q| q.0.as_str())
}

/// Pod keeping `claim` mounted at [`MOUNT_PATH`]
fn mounting_pod(target: &Target, name: &str, claim: &str) -> Pod {
    Pod {
        metadata: target.metadata_named(name),
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "alpine-container".to_string(),
                image: Some("alpine".to_string()),
                command: Some(vec![
                    "sh".to_string(),
                    "-c".to_string(),
                    "sleep 3600".to_string(),
                ]),
                volume_mounts: Some(vec![VolumeMount {
                    name: VOLUME_NAME.to_string(),
                    mount_path: MOUNT_PATH.to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }],
            volumes: Some(vec![Volume {
                name: VOLUME_NAME.to_string(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: claim.to_string(),
                    read_only: None,
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

impl Probe for PvcProbe {
    type Resource = PersistentVolumeClaim;
    const KIND: ResourceKind = ResourceKind::PersistentVolumeClaim;
    const EXERCISE: Option<&'static str> = Some("mount");

    fn api(&self, session: &Session) -> Api<PersistentVolumeClaim> {
        session.namespaced()
    }

    fn build(&self, target: &Target) -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            metadata: target.metadata(),
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec![ACCESS_MODE.to_string()]),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(BTreeMap::from([(
                        "storage".to_string(),
                        Quantity(STORAGE_REQUEST.to_string()),
                    )])),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn verify_created(&self, _target: &Target, pvc: &PersistentVolumeClaim) -> Result<()> {
        expect_eq(
            "spec.accessModes",
            pvc.spec.as_ref().and_then(|s| s.access_modes.clone()),
            Some(vec![ACCESS_MODE.to_string()]),
        )?;
        expect_eq(
            "spec.resources.requests.storage",
            storage_request(pvc),
            Some(STORAGE_REQUEST),
        )?;
        expect_eq("status.phase", phase(pvc), Some("Bound"))
    }

    fn readiness(&self) -> Option<Readiness<PersistentVolumeClaim>> {
        Some(Readiness {
            condition: "bound",
            predicate: is_bound,
        })
    }

    fn exercise(
        &self,
        ctx: &ProbeContext<'_>,
        _pvc: &PersistentVolumeClaim,
        cleanup: &mut CleanupStack,
    ) -> impl Future<Output = Result<()>> + Send {
        let pods: Api<Pod> = ctx.session.namespaced();
        let pod_name = unique_name("test-pod-pvc");
        let pod = mounting_pod(&ctx.target, &pod_name, &ctx.target.name);
        let poller = ctx.poller;

        async move {
            cleanup.create(&pods, &pod, DeleteParams::default()).await?;
            info!(pod = %pod_name, "Created pod mounting the claim");

            let pods = &pods;
            let name = pod_name.as_str();
            let description = format!("Pod {} to be running", name);
            poller
                .until(&description, move || async move {
                    Ok(is_running(&pods.get(name).await?))
                })
                .await
        }
    }
}
