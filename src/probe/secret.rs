// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::assert::expect_eq;
use super::{ConflictPolicy, Probe, ResourceKind, Target, Update, Verification};
use crate::error::Result;
use crate::kubernetes::Session;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::Api;
use std::collections::BTreeMap;

const SECRET_TYPE: &str = "Opaque";

pub struct SecretProbe;

/// Decoded value of a data key, lossily as text for readable mismatches
fn data_value(secret: &Secret, key: &str) -> Option<String> {
    secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .map(|v| String::from_utf8_lossy(&v.0).into_owned())
}

fn set_new_password(secret: &mut Secret) {
    secret.data.get_or_insert_with(BTreeMap::new).insert(
        "password".to_string(),
        ByteString(b"newsecret".to_vec()),
    );
}

fn verify_new_password(secret: &Secret) -> Result<()> {
    expect_eq(
        "data.password",
        data_value(secret, "password").as_deref(),
        Some("newsecret"),
    )?;
    expect_eq(
        "data.username",
        data_value(secret, "username").as_deref(),
        Some("admin"),
    )
}

impl Probe for SecretProbe {
    type Resource = Secret;
    const KIND: ResourceKind = ResourceKind::Secret;

    fn api(&self, session: &Session) -> Api<Secret> {
        session.namespaced()
    }

    fn build(&self, target: &Target) -> Secret {
        Secret {
            metadata: target.metadata(),
            data: Some(BTreeMap::from([
                ("username".to_string(), ByteString(b"admin".to_vec())),
                ("password".to_string(), ByteString(b"secret".to_vec())),
            ])),
            type_: Some(SECRET_TYPE.to_string()),
            ..Default::default()
        }
    }

    fn verify_created(&self, _target: &Target, secret: &Secret) -> Result<()> {
        expect_eq(
            "data.username",
            data_value(secret, "username").as_deref(),
            Some("admin"),
        )?;
        expect_eq(
            "data.password",
            data_value(secret, "password").as_deref(),
            Some("secret"),
        )?;
        expect_eq("type", secret.type_.as_deref(), Some(SECRET_TYPE))
    }

    fn update(&self) -> Option<Update<Secret>> {
        Some(Update {
            mutate: set_new_password,
            verify: verify_new_password,
            conflicts: ConflictPolicy::Fail,
            verification: Verification::Immediate,
        })
    }
}
