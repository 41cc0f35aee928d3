//! Retention selection: which versions a policy deletes.
//!
//! Versions are ordered newest first. The `keep_count` newest are always
//! kept; only the remainder is subject to deletion. With a zero `keep_period`
//! the whole remainder goes, otherwise only those strictly older than the
//! period. The two constraints compose in that order and are never evaluated
//! independently over the full set.

use chrono::{DateTime, Utc};
use common::ApplicationVersion;

use crate::policy::RetentionPolicy;

/// Labels of the versions `policy` deletes, newest first.
///
/// Pure: the snapshot is not modified and `now` is the only clock read.
/// Versions sharing a timestamp keep their relative input order.
pub fn select_versions_to_delete(
    versions: &[ApplicationVersion],
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<String> {
    let mut sorted: Vec<&ApplicationVersion> = versions.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let candidates = sorted.get(policy.keep_count..).unwrap_or_default();

    if policy.keep_period.is_zero() {
        return candidates.iter().map(|v| v.label.clone()).collect();
    }

    let keep_period = policy.keep_period_delta();
    candidates
        .iter()
        .filter(|v| v.age_at(now) > keep_period)
        .map(|v| v.label.clone())
        .collect()
}
