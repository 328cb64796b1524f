// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Resource kinds the suite knows how to probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Secret,
    Deployment,
    ConfigMap,
    Job,
    PersistentVolumeClaim,
    PriorityClass,
    HorizontalPodAutoscaler,
}

#[derive(Debug, Error)]
#[error("unknown resource kind: {0:?}")]
pub struct ParseKindError(String);

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Secret,
        ResourceKind::Deployment,
        ResourceKind::ConfigMap,
        ResourceKind::Job,
        ResourceKind::PersistentVolumeClaim,
        ResourceKind::PriorityClass,
        ResourceKind::HorizontalPodAutoscaler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Secret => "Secret",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Job => "Job",
            ResourceKind::PersistentVolumeClaim => "PersistentVolumeClaim",
            ResourceKind::PriorityClass => "PriorityClass",
            ResourceKind::HorizontalPodAutoscaler => "HorizontalPodAutoscaler",
        }
    }

    /// Prefix of generated object names
    pub fn name_prefix(&self) -> &'static str {
        match self {
            ResourceKind::Secret => "test-secret",
            ResourceKind::Deployment => "test-deployment",
            ResourceKind::ConfigMap => "test-configmap",
            ResourceKind::Job => "test-job",
            ResourceKind::PersistentVolumeClaim => "test-pvc",
            ResourceKind::PriorityClass => "test-priorityclass",
            ResourceKind::HorizontalPodAutoscaler => "test-hpa",
        }
    }

    pub fn is_namespaced(&self) -> bool {
        !matches!(self, ResourceKind::PriorityClass)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ParseKindError;

    /// Accepts kind names case-insensitively, plus their kubectl short names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "secret" | "secrets" => Ok(ResourceKind::Secret),
            "deployment" | "deployments" | "deploy" => Ok(ResourceKind::Deployment),
            "configmap" | "configmaps" | "cm" => Ok(ResourceKind::ConfigMap),
            "job" | "jobs" => Ok(ResourceKind::Job),
            "persistentvolumeclaim" | "persistentvolumeclaims" | "pvc" => {
                Ok(ResourceKind::PersistentVolumeClaim)
            }
            "priorityclass" | "priorityclasses" | "pc" => Ok(ResourceKind::PriorityClass),
            "horizontalpodautoscaler" | "horizontalpodautoscalers" | "hpa" => {
                Ok(ResourceKind::HorizontalPodAutoscaler)
            }
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}
