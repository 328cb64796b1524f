// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::assert::expect_eq;
use super::{ConflictPolicy, Probe, ResourceKind, Target, Update, Verification};
use crate::error::Result;
use crate::kubernetes::Session;
use k8s_openapi::api::scheduling::v1::PriorityClass;
use kube::Api;

const VALUE: i32 = 1000;
const DESCRIPTION: &str = "Test Priority Class";
const UPDATED_DESCRIPTION: &str = "Updated Test Priority Class";

/// Cluster-scoped. `value` is immutable once created, so the update
/// rewrites the description instead.
pub struct PriorityClassProbe;

fn set_description(pc: &mut PriorityClass) {
    pc.description = Some(UPDATED_DESCRIPTION.to_string());
}

fn verify_description(pc: &PriorityClass) -> Result<()> {
    expect_eq(
        "description",
        pc.description.as_deref(),
        Some(UPDATED_DESCRIPTION),
    )?;
    expect_eq("value", pc.value, VALUE)
}

impl Probe for PriorityClassProbe {
    type Resource = PriorityClass;
    const KIND: ResourceKind = ResourceKind::PriorityClass;

    fn api(&self, session: &Session) -> Api<PriorityClass> {
        session.cluster()
    }

    fn build(&self, target: &Target) -> PriorityClass {
        PriorityClass {
            metadata: target.metadata(),
            value: VALUE,
            global_default: Some(false),
            description: Some(DESCRIPTION.to_string()),
            ..Default::default()
        }
    }

    fn verify_created(&self, _target: &Target, pc: &PriorityClass) -> Result<()> {
        expect_eq("value", pc.value, VALUE)?;
        expect_eq("globalDefault", pc.global_default, Some(false))
    }

    fn update(&self) -> Option<Update<PriorityClass>> {
        Some(Update {
            mutate: set_description,
            verify: verify_description,
            conflicts: ConflictPolicy::Fail,
            verification: Verification::Immediate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::run_probe;
    use crate::test_utils::MockService;
    use crate::wait::Poller;
    use std::time::Duration;

    const PC_PATH: &str = "/apis/scheduling.k8s.io/v1/priorityclasses";

    #[test]
    fn test_build_is_not_global_default() {
        let target = Target {
            kind: ResourceKind::PriorityClass,
            name: "test-priorityclass-1".to_string(),
            namespace: None,
        };

        let pc = PriorityClassProbe.build(&target);

        assert_eq!(pc.value, 1000);
        assert_eq!(pc.global_default, Some(false));
        assert_eq!(pc.metadata.namespace, None);
        assert!(verify_description(&pc).is_err());
    }

    #[tokio::test]
    async fn test_priority_class_lifecycle_is_cluster_scoped() {
        let mock = MockService::new();
        let session = Session::new(mock.clone().into_client(), "probe-ns");
        let poller = Poller::new(Duration::from_millis(10), Duration::from_millis(200));

        let report = run_probe(&session, poller, PriorityClassProbe).await;

        assert!(report.passed(), "{:?}", report);
        assert_eq!(report.namespace, None);

        let create = mock
            .requests()
            .into_iter()
            .find(|r| r.method == "POST")
            .unwrap();
        assert_eq!(create.path, PC_PATH);
        let put = mock
            .requests()
            .into_iter()
            .find(|r| r.method == "PUT")
            .unwrap();
        assert_eq!(put.body.unwrap()["description"], "Updated Test Priority Class");
        assert!(mock.paths_under(PC_PATH).is_empty());
    }
}
