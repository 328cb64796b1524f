// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{ProbeError, Result};
use std::fmt::Debug;

/// Fail with a field-qualified message unless `actual == expected`
pub fn expect_eq<T>(field: &str, actual: T, expected: T) -> Result<()>
where
    T: PartialEq + Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(ProbeError::AssertionFailed(format!(
            "{}: expected {:?}, got {:?}",
            field, expected, actual
        )))
    }
}
