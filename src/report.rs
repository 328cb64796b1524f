// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sonobuoy plugin results.
//!
//! Reports are written in the "manual" results format: a tree of items, each
//! with a `name`, a `passed`/`failed` status and free-form `details`. The
//! plugin worker picks the file up once the `done` sentinel names it.

use crate::constants::results::{DONE_FILE, LOG_FILE, PLUGIN_NAME, RESULTS_FILE};
use crate::error::Result;
use crate::probe::{ProbeReport, StepOutcome, StepStatus};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const PASSED: &str = "passed";
const FAILED: &str = "failed";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultItem {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ResultItem>,
}

fn status(passed: bool) -> String {
    let status = if passed { PASSED } else { FAILED };
    status.to_string()
}

fn step_item(step: &StepOutcome) -> ResultItem {
    let mut details = BTreeMap::from([(
        "elapsed".to_string(),
        format!("{}ms", step.elapsed.as_millis()),
    )]);
    if let Some(message) = &step.message {
        details.insert("message".to_string(), message.clone());
    }

    ResultItem {
        name: step.name.clone(),
        status: status(step.status == StepStatus::Passed),
        details,
        items: Vec::new(),
    }
}

fn probe_item(report: &ProbeReport) -> ResultItem {
    let mut details = BTreeMap::from([("name".to_string(), report.name.clone())]);
    if let Some(namespace) = &report.namespace {
        details.insert("namespace".to_string(), namespace.clone());
    }

    ResultItem {
        name: report.kind.to_string(),
        status: status(report.passed()),
        details,
        items: report.steps.iter().map(step_item).collect(),
    }
}

/// Top-level item covering the whole run
pub fn results(reports: &[ProbeReport]) -> ResultItem {
    ResultItem {
        name: PLUGIN_NAME.to_string(),
        status: status(reports.iter().all(ProbeReport::passed)),
        details: BTreeMap::new(),
        items: reports.iter().map(probe_item).collect(),
    }
}

/// Human readable summary, one line per probe and step
pub fn render_log(reports: &[ProbeReport]) -> String {
    let mut out = String::new();

    for report in reports {
        let scope = match &report.namespace {
            Some(ns) => format!("{}/{}", ns, report.name),
            None => report.name.clone(),
        };
        out.push_str(&format!(
            "[{}] {} {}\n",
            tag(report.passed()),
            report.kind,
            scope
        ));

        for step in &report.steps {
            out.push_str(&format!(
                "  [{}] {} ({}ms)",
                tag(step.status == StepStatus::Passed),
                step.name,
                step.elapsed.as_millis()
            ));
            if let Some(message) = &step.message {
                out.push_str(&format!(": {}", message));
            }
            out.push('\n');
        }
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    out.push_str(&format!(
        "{} probes, {} passed, {} failed\n",
        reports.len(),
        reports.len() - failed,
        failed
    ));
    out
}

fn tag(passed: bool) -> &'static str {
    if passed {
        "PASS"
    } else {
        "FAIL"
    }
}

/// Write the results file, the aggregate log and finally the `done`
/// sentinel into `dir`. Returns the path of the results file.
pub fn write_results(dir: &Path, reports: &[ProbeReport]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let results_path = dir.join(RESULTS_FILE);
    fs::write(&results_path, serde_yaml::to_string(&results(reports))?)?;
    fs::write(dir.join(LOG_FILE), render_log(reports))?;
    fs::write(dir.join(DONE_FILE), results_path.display().to_string())?;

    info!(path = %results_path.display(), "Wrote probe results");
    Ok(results_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ResourceKind;
    use std::time::Duration;

    fn step(name: &str, status: StepStatus, message: Option<&str>) -> StepOutcome {
        StepOutcome {
            name: name.to_string(),
            status,
            message: message.map(str::to_string),
            elapsed: Duration::from_millis(12),
        }
    }

    fn reports() -> Vec<ProbeReport> {
        vec![
            ProbeReport {
                kind: ResourceKind::ConfigMap,
                name: "test-configmap-1".to_string(),
                namespace: Some("default".to_string()),
                steps: vec![
                    step("create", StepStatus::Passed, None),
                    step("delete ConfigMap/test-configmap-1", StepStatus::Passed, None),
                ],
            },
            ProbeReport {
                kind: ResourceKind::PriorityClass,
                name: "test-priorityclass-1".to_string(),
                namespace: None,
                steps: vec![step(
                    "create",
                    StepStatus::Failed,
                    Some("forbidden (403 Forbidden)"),
                )],
            },
        ]
    }

    #[test]
    fn test_results_tree() {
        let tree = results(&reports());

        assert_eq!(tree.name, "lifecycle-probe");
        assert_eq!(tree.status, "failed");
        assert_eq!(tree.items.len(), 2);

        let cm = &tree.items[0];
        assert_eq!(cm.name, "ConfigMap");
        assert_eq!(cm.status, "passed");
        assert_eq!(cm.details.get("namespace").map(String::as_str), Some("default"));
        assert_eq!(cm.items[0].details.get("elapsed").map(String::as_str), Some("12ms"));

        let pc = &tree.items[1];
        assert_eq!(pc.status, "failed");
        assert!(!pc.details.contains_key("namespace"));
        assert_eq!(
            pc.items[0].details.get("message").map(String::as_str),
            Some("forbidden (403 Forbidden)")
        );
    }

    #[test]
    fn test_render_log() {
        let log = render_log(&reports());

        assert!(log.contains("[PASS] ConfigMap default/test-configmap-1\n"));
        assert!(log.contains("  [FAIL] create (12ms): forbidden (403 Forbidden)\n"));
        assert!(log.contains("[FAIL] PriorityClass test-priorityclass-1\n"));
        assert!(log.ends_with("2 probes, 1 passed, 1 failed\n"));
    }

    #[test]
    fn test_write_results_creates_sentinel_last() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("results");

        let path = write_results(&dir, &reports()).unwrap();

        assert_eq!(path, dir.join("lifecycle-probe.yaml"));
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(yaml["name"].as_str(), Some("lifecycle-probe"));
        assert_eq!(yaml["items"][1]["status"].as_str(), Some("failed"));

        assert_eq!(
            fs::read_to_string(dir.join("done")).unwrap(),
            path.display().to_string()
        );
        assert!(fs::read_to_string(dir.join("lifecycle-probe.log"))
            .unwrap()
            .contains("ConfigMap"));
    }

    #[test]
    fn test_empty_details_are_omitted() {
        let yaml = serde_yaml::to_string(&results(&[])).unwrap();

        assert_eq!(yaml, "name: lifecycle-probe\nstatus: passed\n");
    }
}
