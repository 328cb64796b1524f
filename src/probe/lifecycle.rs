// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic create/verify/update/delete driver

use super::{
    CleanupStack, ConflictPolicy, Probe, ProbeContext, ProbeReport, ResourceKind, Target, Update,
    Verification,
};
use crate::error::{ProbeError, Result};
use crate::kubernetes::Session;
use crate::retry::{retry_on_conflict, Backoff};
use crate::wait::Poller;
use kube::api::PostParams;
use kube::{Api, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

/// Run one probe end to end.
///
/// Never fails: every outcome, including cleanup, ends up in the returned
/// report. Cleanup runs whether or not the sequence completed.
#[instrument(skip_all, fields(kind = %P::KIND))]
pub async fn run_probe<P: Probe>(session: &Session, poller: Poller, probe: P) -> ProbeReport {
    let ctx = ProbeContext {
        session,
        poller,
        target: Target::generate(P::KIND, session),
    };
    let api = probe.api(session);
    let mut report = ProbeReport::new(&ctx.target);
    let mut cleanup = CleanupStack::new(poller);

    info!(name = %ctx.target.name, "Starting {} probe", P::KIND);

    if let Err(e) = drive(&probe, &ctx, &api, &mut report, &mut cleanup).await {
        warn!(name = %ctx.target.name, error = %e, "Probe aborted, cleaning up");
    }

    cleanup.run(&mut report).await;

    if report.passed() {
        info!(name = %ctx.target.name, "{} probe passed", P::KIND);
    } else {
        warn!(name = %ctx.target.name, "{} probe failed", P::KIND);
    }
    report
}

async fn drive<P: Probe>(
    probe: &P,
    ctx: &ProbeContext<'_>,
    api: &Api<P::Resource>,
    report: &mut ProbeReport,
    cleanup: &mut CleanupStack,
) -> Result<()> {
    let target = &ctx.target;
    let name = target.name.as_str();

    let started = Instant::now();
    let prepared = probe.prepare(ctx, cleanup).await;
    if prepared.is_err() || !cleanup.is_empty() {
        report.record("prepare", started.elapsed(), &prepared, None);
    }
    prepared?;

    let obj = probe.build(target);
    report
        .step("create", cleanup.create(api, &obj, probe.delete_params()))
        .await?;

    if let Some(readiness) = probe.readiness() {
        let predicate = readiness.predicate;
        let description = format!("{} {} to be {}", P::KIND, name, readiness.condition);
        report
            .step(
                "ready",
                ctx.poller.until(&description, move || async move {
                    Ok(predicate(&api.get(name).await?))
                }),
            )
            .await?;
    }

    let current = report
        .step("read", async {
            let obj = api.get(name).await?;
            probe.verify_created(target, &obj)?;
            Ok(obj)
        })
        .await?;

    if let Some(step) = P::EXERCISE {
        report
            .step(step, probe.exercise(ctx, &current, cleanup))
            .await?;
    }

    if let Some(update) = probe.update() {
        report.step("update", apply_update(api, name, &update)).await?;
        report
            .step(
                "verify-update",
                verify_update(ctx.poller, api, P::KIND, name, &update),
            )
            .await?;
    }

    Ok(())
}

/// Fetch the latest version, mutate it and replace it
async fn apply_update<K>(api: &Api<K>, name: &str, update: &Update<K>) -> Result<K>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
{
    let mutate = update.mutate;
    let attempt = move || async move {
        let mut latest = api.get(name).await?;
        mutate(&mut latest);
        api.replace(name, &PostParams::default(), &latest).await
    };

    match update.conflicts {
        ConflictPolicy::Retry => retry_on_conflict(&Backoff::DEFAULT, attempt).await,
        ConflictPolicy::Fail => Ok(attempt().await?),
    }
}

async fn verify_update<K>(
    poller: Poller,
    api: &Api<K>,
    kind: ResourceKind,
    name: &str,
    update: &Update<K>,
) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug,
{
    let verify = update.verify;

    let condition = match update.verification {
        Verification::Immediate => return verify(&api.get(name).await?),
        Verification::Eventually(condition) => condition,
    };

    let last_mismatch: Mutex<Option<String>> = Mutex::new(None);
    let last = &last_mismatch;
    let description = format!("{} {} to be {}", kind, name, condition);

    let result = poller
        .until(&description, move || async move {
            let obj = api.get(name).await?;
            match verify(&obj) {
                Ok(()) => Ok(true),
                Err(ProbeError::AssertionFailed(msg)) => {
                    if let Ok(mut slot) = last.lock() {
                        *slot = Some(msg);
                    }
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })
        .await;

    match result {
        Err(ProbeError::Timeout {
            description,
            elapsed,
            attempts,
        }) => {
            let mismatch = last_mismatch.lock().ok().and_then(|slot| slot.clone());
            Err(ProbeError::Timeout {
                description: match mismatch {
                    Some(msg) => format!("{} (last check: {})", description, msg),
                    None => description,
                },
                elapsed,
                attempts,
            })
        }
        other => other,
    }
}
