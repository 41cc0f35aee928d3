//! Retention policy resolution with per-application overrides.

use chrono::TimeDelta;
use common::config::{ApplicationRetentionConfig, RetentionConfig, RetentionConfigError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which versions of an application survive a prune.
///
/// A zero `keep_count` disables the count floor, a zero `keep_period`
/// disables the age filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub keep_count: usize,
    #[serde(with = "humantime_serde")]
    pub keep_period: Duration,
}

impl RetentionPolicy {
    pub fn new(keep_count: usize, keep_period: Duration) -> Self {
        Self {
            keep_count,
            keep_period,
        }
    }

    /// Policy with neither constraint set.
    pub fn unconstrained() -> Self {
        Self::default()
    }

    pub fn is_unconstrained(&self) -> bool {
        self.keep_count == 0 && self.keep_period.is_zero()
    }

    /// `keep_period` as a signed delta; saturates for periods chrono cannot
    /// represent, which then never expire anything.
    pub fn keep_period_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.keep_period).unwrap_or(TimeDelta::MAX)
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "keep_count={}, keep_period={}",
            self.keep_count,
            humantime::format_duration(self.keep_period)
        )
    }
}

/// Source of a retention policy decision for auditing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionPolicySource {
    /// Global default from configuration.
    Global,
    /// Application-level override.
    Application,
    /// Supplied by the caller for a single run.
    Explicit,
}

/// Policy in effect for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPolicy {
    pub application: String,
    pub policy: RetentionPolicy,
    pub source: RetentionPolicySource,
}

/// Resolves the policy for an application.
///
/// Resolution order, per field:
/// 1. Application override (if set)
/// 2. Global default
#[derive(Debug, Clone)]
pub struct RetentionPolicyResolver {
    config: RetentionConfig,
}

impl RetentionPolicyResolver {
    /// Create a new resolver from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration validation fails.
    pub fn new(config: RetentionConfig) -> Result<Self, RetentionPolicyError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn resolve(&self, application: &str) -> ResolvedPolicy {
        let global = RetentionPolicy::new(self.config.keep_count, self.config.keep_period);

        let (policy, source) = match self.config.applications.get(application) {
            Some(overrides) if overrides_anything(overrides) => (
                RetentionPolicy::new(
                    overrides.keep_count.unwrap_or(global.keep_count),
                    overrides.keep_period.unwrap_or(global.keep_period),
                ),
                RetentionPolicySource::Application,
            ),
            _ => (global, RetentionPolicySource::Global),
        };

        ResolvedPolicy {
            application: application.to_string(),
            policy,
            source,
        }
    }

    pub fn dry_run(&self) -> bool {
        self.config.dry_run
    }

    pub fn config(&self) -> &RetentionConfig {
        &self.config
    }
}

fn overrides_anything(overrides: &ApplicationRetentionConfig) -> bool {
    overrides.keep_count.is_some() || overrides.keep_period.is_some()
}

/// Errors that can occur during retention policy resolution.
#[derive(Error, Debug)]
pub enum RetentionPolicyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] RetentionConfigError),
}
