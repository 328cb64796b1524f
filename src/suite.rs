// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::config::Config;
use crate::kubernetes::Session;
use crate::probe::{ProbeReport, ResourceKind};
use crate::wait::Poller;
use futures::{FutureExt, StreamExt};
use tracing::{info, instrument};

/// Runs the configured probes with bounded parallelism
pub struct Suite {
    session: Session,
    kinds: Vec<ResourceKind>,
    parallelism: usize,
    poller: Poller,
}

impl Suite {
    pub fn new(session: Session, config: &Config) -> Self {
        Self {
            session,
            kinds: config.kinds.clone(),
            parallelism: config.parallelism.max(1),
            poller: Poller::new(config.poll_interval, config.poll_timeout),
        }
    }

    /// Run every probe and return their reports in configured order
    #[instrument(skip(self), fields(namespace = %self.session.namespace()))]
    pub async fn run(&self) -> Vec<ProbeReport> {
        info!(
            kinds = self.kinds.len(),
            parallelism = self.parallelism,
            "Running lifecycle probes"
        );

        let session = &self.session;
        let poller = self.poller;
        let mut reports: Vec<(usize, ProbeReport)> =
            futures::stream::iter(self.kinds.iter().enumerate())
                .map(|(index, kind)| kind.run(session, poller).map(move |r| (index, r)))
                .buffer_unordered(self.parallelism)
                .collect()
                .await;

        reports.sort_by_key(|(index, _)| *index);
        let reports: Vec<ProbeReport> = reports.into_iter().map(|(_, r)| r).collect();

        let failed = reports.iter().filter(|r| !r.passed()).count();
        info!(
            passed = reports.len() - failed,
            failed, "Lifecycle probes finished"
        );
        reports
    }
}
