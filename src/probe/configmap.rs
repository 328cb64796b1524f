// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::assert::expect_eq;
use super::{ConflictPolicy, Probe, ResourceKind, Target, Update, Verification};
use crate::error::Result;
use crate::kubernetes::Session;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::Api;
use std::collections::BTreeMap;

const KEY: &str = "config-key";
const VALUE: &str = "config-value";
const UPDATED_VALUE: &str = "updated-value";

pub struct ConfigMapProbe;

fn data_value<'a>(cm: &'a ConfigMap, key: &str) -> Option<&'a str> {
    cm.data.as_ref().and_then(|d| d.get(key)).map(String::as_str)
}

fn set_updated_value(cm: &mut ConfigMap) {
    cm.data
        .get_or_insert_with(BTreeMap::new)
        .insert(KEY.to_string(), UPDATED_VALUE.to_string());
}

fn verify_updated_value(cm: &ConfigMap) -> Result<()> {
    expect_eq("data.config-key", data_value(cm, KEY), Some(UPDATED_VALUE))
}

impl Probe for ConfigMapProbe {
    type Resource = ConfigMap;
    const KIND: ResourceKind = ResourceKind::ConfigMap;

    fn api(&self, session: &Session) -> Api<ConfigMap> {
        session.namespaced()
    }

    fn build(&self, target: &Target) -> ConfigMap {
        ConfigMap {
            metadata: target.metadata(),
            data: Some(BTreeMap::from([(KEY.to_string(), VALUE.to_string())])),
            ..Default::default()
        }
    }

    fn verify_created(&self, _target: &Target, cm: &ConfigMap) -> Result<()> {
        expect_eq("data.config-key", data_value(cm, KEY), Some(VALUE))
    }

    fn update(&self) -> Option<Update<ConfigMap>> {
        Some(Update {
            mutate: set_updated_value,
            verify: verify_updated_value,
            conflicts: ConflictPolicy::Fail,
            verification: Verification::Immediate,
        })
    }
}
