// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::assert::expect_eq;
use super::{Probe, ResourceKind, Target};
use crate::error::Result;
use crate::kubernetes::Session;
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use kube::api::DeleteParams;
use kube::Api;

const RESTART_POLICY: &str = "Never";

/// Runs a one-shot pod. Job templates are immutable, so there is no update
/// step.
pub struct JobProbe;

fn restart_policy(job: &Job) -> Option<&str> {
    job.spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .and_then(|p| p.restart_policy.as_deref())
}

impl Probe for JobProbe {
    type Resource = Job;
    const KIND: ResourceKind = ResourceKind::Job;

    fn api(&self, session: &Session) -> Api<Job> {
        session.namespaced()
    }

    fn build(&self, target: &Target) -> Job {
        Job {
            metadata: target.metadata(),
            spec: Some(JobSpec {
                template: PodTemplateSpec {
                    metadata: None,
                    spec: Some(PodSpec {
                        containers: vec![Container {
                            name: "basic-task".to_string(),
                            image: Some("alpine".to_string()),
                            command: Some(vec![
                                "sh".to_string(),
                                "-c".to_string(),
                                "echo 'Calculating something basic'".to_string(),
                            ]),
                            ..Default::default()
                        }],
                        restart_policy: Some(RESTART_POLICY.to_string()),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn verify_created(&self, target: &Target, job: &Job) -> Result<()> {
        expect_eq(
            "metadata.name",
            job.metadata.name.as_deref(),
            Some(target.name.as_str()),
        )?;
        expect_eq(
            "spec.template.spec.restartPolicy",
            restart_policy(job),
            Some(RESTART_POLICY),
        )
    }

    /// Leave the job's pods to the garbage collector
    fn delete_params(&self) -> DeleteParams {
        DeleteParams::orphan()
    }
}
