// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Collision-resistant object names

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// `<prefix>-<unix nanos>`.
///
/// The suffix is strictly increasing within the process, so two probes
/// started in the same nanosecond still get distinct names.
pub fn unique_name(prefix: &str) -> String {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let previous = match LAST_STAMP.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(now.max(last + 1))
    }) {
        Ok(prev) | Err(prev) => prev,
    };
    format!("{}-{}", prefix, now.max(previous + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_name_has_prefix_and_numeric_suffix() {
        let name = unique_name("test-configmap");
        let suffix = name.strip_prefix("test-configmap-").unwrap();
        assert!(suffix.parse::<i64>().unwrap() > 0);
    }

    #[test]
    fn test_names_never_collide() {
        let names: HashSet<String> = (0..10_000).map(|_| unique_name("test-job")).collect();
        assert_eq!(names.len(), 10_000);
    }

    #[test]
    fn test_names_are_unique_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..500).map(|_| unique_name("p")).collect::<Vec<_>>()))
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for name in handle.join().unwrap() {
                assert!(all.insert(name));
            }
        }
        assert_eq!(all.len(), 4_000);
    }

    #[test]
    fn test_names_are_valid_dns_labels() {
        let name = unique_name("test-priorityclass");
        assert!(name.len() <= 63);
        assert!(name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }
}
