// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-step record of a probe run

use super::{ResourceKind, Target};
use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Passed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub name: String,
    pub status: StepStatus,
    pub message: Option<String>,
    pub elapsed: Duration,
}

/// Everything that happened to one probed object
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: Option<String>,
    pub steps: Vec<StepOutcome>,
}

impl ProbeReport {
    pub fn new(target: &Target) -> Self {
        Self {
            kind: target.kind,
            name: target.name.clone(),
            namespace: target.namespace.clone(),
            steps: Vec::new(),
        }
    }

    /// A probe passes when it ran at least one step and none failed
    pub fn passed(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.status == StepStatus::Passed)
    }

    /// First failed step, if any
    pub fn failure(&self) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.status == StepStatus::Failed)
    }

    /// Run `fut` as the named step and record its outcome
    pub async fn step<T, Fut>(&mut self, name: &str, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let result = fut.await;
        self.record(name, started.elapsed(), &result, None);
        result
    }

    pub fn record<T>(
        &mut self,
        name: &str,
        elapsed: Duration,
        result: &Result<T>,
        note: Option<String>,
    ) {
        let (status, message) = match result {
            Ok(_) => {
                info!(kind = %self.kind, name = %self.name, step = name, ?elapsed, "Step passed");
                (StepStatus::Passed, note)
            }
            Err(e) => {
                warn!(kind = %self.kind, name = %self.name, step = name, error = %e, "Step failed");
                (StepStatus::Failed, Some(e.report_message()))
            }
        };

        self.steps.push(StepOutcome {
            name: name.to_string(),
            status,
            message,
            elapsed,
        });
    }
}
