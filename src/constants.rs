// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Environment variables read by the probe suite
pub mod env {
    /// Path to a kubeconfig file, used when not running in-cluster
    pub const KUBECONFIG: &str = "KUBECONFIG";
    /// Namespace that namespaced probes create their objects in
    pub const TEST_NAMESPACE: &str = "TEST_NAMESPACE";
    /// Directory the results file, log and `done` sentinel are written to
    pub const RESULTS_DIR: &str = "SONOBUOY_RESULTS_DIR";
    /// Comma separated list of kinds to probe (all when unset)
    pub const KINDS: &str = "PROBE_KINDS";
    pub const PARALLELISM: &str = "PROBE_PARALLELISM";
    pub const POLL_INTERVAL_SECS: &str = "PROBE_POLL_INTERVAL_SECS";
    pub const TIMEOUT_SECS: &str = "PROBE_TIMEOUT_SECS";
    /// When "true", the target namespace is created if it does not exist
    pub const CREATE_NAMESPACE: &str = "PROBE_CREATE_NAMESPACE";
}

/// Defaults applied when the matching environment variable is unset
pub mod defaults {
    pub const NAMESPACE: &str = "default";
    pub const RESULTS_DIR: &str = "/tmp/sonobuoy/results";
    pub const PARALLELISM: usize = 4;
    /// Kubeconfig location relative to the home directory
    pub const HOME_KUBECONFIG: &str = ".kube/config";
    /// Last resort when no home directory can be determined
    pub const FALLBACK_KUBECONFIG: &str = "/root/.kube/config";
}

/// Readiness polling configuration
pub mod poll {
    pub const INTERVAL_SECS: u64 = 2;
    pub const TIMEOUT_SECS: u64 = 120;
}

/// Files written to the results directory
pub mod results {
    /// Plugin name, also used as the top-level result item name
    pub const PLUGIN_NAME: &str = "lifecycle-probe";
    pub const RESULTS_FILE: &str = "lifecycle-probe.yaml";
    pub const LOG_FILE: &str = "lifecycle-probe.log";
    /// Sentinel the plugin worker waits for; contains the path of the results file
    pub const DONE_FILE: &str = "done";
}

/// Labels stamped on every object the suite creates
pub mod labels {
    /// Set to the plugin name so leftovers can be found with a selector
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
}
