use thiserror::Error;

use crate::policy::RetentionPolicyError;
use crate::store::StoreError;

/// Errors surfaced by retention and lifecycle operations.
///
/// A delete answered with "not found or pending" is never one of these; the
/// pruner absorbs it.
#[derive(Error, Debug)]
pub enum RetentionError {
    #[error("Failed to list versions of application '{application}': {source}")]
    ListFailure {
        application: String,
        source: StoreError,
    },

    #[error("Failed to delete version '{label}' of application '{application}': {source}")]
    DeleteFailure {
        application: String,
        label: String,
        source: StoreError,
    },

    #[error("Failed to describe version '{label}' of application '{application}': {source}")]
    DescribeFailure {
        application: String,
        label: String,
        source: StoreError,
    },

    #[error("Failed to register version '{label}' of application '{application}': {source}")]
    RegisterFailure {
        application: String,
        label: String,
        source: StoreError,
    },

    #[error(
        "Failed to update description of version '{label}' of application '{application}': {source}"
    )]
    UpdateFailure {
        application: String,
        label: String,
        source: StoreError,
    },

    #[error("Found {count} versions labelled '{label}' in application '{application}', expected 1")]
    MultipleMatch {
        application: String,
        label: String,
        count: usize,
    },

    #[error(transparent)]
    Policy(#[from] RetentionPolicyError),
}

impl RetentionError {
    /// The underlying store error, if this failure came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            RetentionError::ListFailure { source, .. }
            | RetentionError::DeleteFailure { source, .. }
            | RetentionError::DescribeFailure { source, .. }
            | RetentionError::RegisterFailure { source, .. }
            | RetentionError::UpdateFailure { source, .. } => Some(source),
            RetentionError::MultipleMatch { .. } | RetentionError::Policy(_) => None,
        }
    }
}
