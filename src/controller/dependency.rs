//! # Dependency Resolution
//!
//! Turns a [`ResourceRef`] into the provider id of the referenced zone,
//! waiting with bounded exponential backoff while it is still being
//! provisioned.
//!
//! - A missing dependency fails immediately, it will not appear by waiting.
//! - A dependency without a ready status is retried until the attempt budget
//!   is used up.
//! - Any other read failure aborts resolution.

use crate::controller::backoff::{BackoffSettings, ExponentialBackoff};
use crate::controller::error::ReconcileError;
use crate::controller::store::ObjectStore;
use crate::crd::{ProvisionedZone, ResourceRef};
use crate::observability::metrics;
use tracing::{debug, warn};

/// Resolve `reference` to the provider id of a ready zone of kind `K`.
///
/// The reference namespace falls back to `default_namespace`, the namespace
/// of the referencing object.
pub async fn resolve_provider_id<K: ProvisionedZone>(
    store: &dyn ObjectStore<K>,
    reference: &ResourceRef,
    default_namespace: &str,
    settings: BackoffSettings,
) -> Result<i64, ReconcileError> {
    let kind = K::KIND_LABEL;
    let namespace = reference.namespace_or(default_namespace);
    let mut backoff = ExponentialBackoff::new(settings);

    loop {
        let error = match try_resolve(store, &reference.name, namespace).await {
            Ok(id) => return Ok(id),
            Err(e) if e.is_retryable() => e,
            Err(e) => return Err(e),
        };

        let Some(delay) = backoff.next_delay() else {
            warn!(
                "{} {}/{} still not ready after {} attempts",
                kind,
                namespace,
                reference.name,
                backoff.attempts()
            );
            return Err(error);
        };

        debug!(
            "{} {}/{} not ready (attempt {}), retrying in {:?}",
            kind,
            namespace,
            reference.name,
            backoff.attempts(),
            delay
        );
        metrics::increment_dependency_retries(kind);
        tokio::time::sleep(delay).await;
    }
}

/// A single resolution attempt
async fn try_resolve<K: ProvisionedZone>(
    store: &dyn ObjectStore<K>,
    name: &str,
    namespace: &str,
) -> Result<i64, ReconcileError> {
    let kind = K::KIND_LABEL;
    let Some(dependency) = store.get(name, namespace).await? else {
        return Err(ReconcileError::NotFound {
            kind,
            name: name.to_string(),
            namespace: namespace.to_string(),
        });
    };

    dependency
        .ready_provider_id()
        .ok_or_else(|| ReconcileError::NotReady {
            kind,
            name: name.to_string(),
            namespace: namespace.to_string(),
        })
}
