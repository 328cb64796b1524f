// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load cluster credentials: {0}")]
    CredentialsError(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timed out after {elapsed:?} ({attempts} attempts) waiting for {description}")]
    Timeout {
        description: String,
        elapsed: Duration,
        attempts: u32,
    },

    #[error("Update still conflicting after {attempts} attempts: {source}")]
    ConflictRetriesExhausted {
        attempts: u32,
        #[source]
        source: kube::Error,
    },

    #[error("Namespace creation failed: {0}")]
    NamespaceError(String),

    #[error("Failed to write results: {0}")]
    ReportError(#[from] std::io::Error),

    #[error("Failed to serialize results: {0}")]
    SerializeError(#[from] serde_yaml::Error),
}

impl ProbeError {
    /// Human readable message for the step report.
    ///
    /// API failures carry the server's status message only, the rest of the
    /// error response is noise in a result file.
    pub fn report_message(&self) -> String {
        match self {
            ProbeError::KubeError(kube::Error::Api(resp)) => {
                format!("{} ({} {})", resp.message, resp.code, resp.reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
