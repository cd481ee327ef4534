//! # Reconcile Errors
//!
//! Every failure a reconcile path can hit, tagged by kind so callers match on
//! the variant instead of inspecting messages.

use crate::provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A referenced resource exists but has not been provisioned yet
    #[error("{kind} \"{name}\" in namespace \"{namespace}\" is not ready")]
    NotReady {
        kind: &'static str,
        name: String,
        namespace: String,
    },

    /// A referenced resource does not exist
    #[error("{kind} \"{name}\" not found in namespace \"{namespace}\"")]
    NotFound {
        kind: &'static str,
        name: String,
        namespace: String,
    },

    /// The provider rejected a request or could not be reached
    #[error("{0}")]
    Provider(String),

    /// The object's spec cannot be turned into a provider request
    #[error("{0}")]
    InvalidSpec(String),

    /// Internal state contradicts itself, never retried
    #[error("{0}")]
    Invariant(String),

    /// The object store or secret store failed
    #[error("{0}")]
    Infrastructure(String),
}

impl ReconcileError {
    /// Only a dependency that is not ready yet is worth waiting for
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconcileError::NotReady { .. })
    }

    /// Short label for metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileError::NotReady { .. } => "not-ready",
            ReconcileError::NotFound { .. } => "not-found",
            ReconcileError::Provider(_) => "provider",
            ReconcileError::InvalidSpec(_) => "invalid-spec",
            ReconcileError::Invariant(_) => "invariant",
            ReconcileError::Infrastructure(_) => "infrastructure",
        }
    }
}

impl From<ProviderError> for ReconcileError {
    fn from(error: ProviderError) -> Self {
        ReconcileError::Provider(error.to_string())
    }
}

impl From<kube::Error> for ReconcileError {
    fn from(error: kube::Error) -> Self {
        ReconcileError::Infrastructure(format!("Kubernetes API request failed: {error}"))
    }
}
