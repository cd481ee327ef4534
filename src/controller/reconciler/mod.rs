//! # Reconciler
//!
//! Reconciliation of `PullZone`, `StorageZone` and `EdgeRule` resources
//! against Bunny CDN.
//!
//! Every kind shares the same shape:
//!
//! 1. Finalizer gate: deletions run the kind's cleanup. An object without the
//!    finalizer only gets it attached; provisioning runs on the next event
//! 2. Idempotency guard: a generation that already has a status is skipped
//! 3. Provisioning (`apply`): dependency resolution, find-or-create by name,
//!    full update, credential secret
//! 4. Status write-back, success or failure, always recording the generation
//!
//! Failures in step 3 become a `ready: false` status. Invariant violations
//! and store failures propagate to the dispatcher instead.

mod edge_rule;
mod pull_zone;
mod storage_zone;

use crate::controller::backoff::BackoffSettings;
use crate::controller::credentials::SecretStore;
use crate::controller::error::ReconcileError;
use crate::controller::store::{FinalizerOutcome, ObjectStore};
use crate::crd::{DeletionPolicy, EdgeRule, ManagedResource, PullZone, StorageZone};
use crate::observability::metrics;
use crate::provider::CdnProvider;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Shared context handed to every reconciliation
#[derive(Clone)]
pub struct Reconciler {
    pub provider: Arc<dyn CdnProvider>,
    pub secrets: Arc<dyn SecretStore>,
    pub pull_zones: Arc<dyn ObjectStore<PullZone>>,
    pub storage_zones: Arc<dyn ObjectStore<StorageZone>>,
    pub edge_rules: Arc<dyn ObjectStore<EdgeRule>>,
    pub dependency_backoff: BackoffSettings,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("dependency_backoff", &self.dependency_backoff)
            .finish_non_exhaustive()
    }
}

/// Kind-specific half of a reconciliation
#[async_trait]
pub trait Reconcile: ManagedResource {
    /// Store holding objects of this kind
    fn store(ctx: &Reconciler) -> &dyn ObjectStore<Self>;

    /// Provision the resource and return the success status
    async fn apply(&self, ctx: &Reconciler) -> Result<Self::Status, ReconcileError>;

    /// Status recorded when `apply` fails
    fn failure_status(&self, message: String) -> Self::Status;

    /// Provider-side cleanup, run once when the object is deleted
    async fn cleanup(&self, ctx: &Reconciler) -> Result<(), ReconcileError>;
}

/// Handle one added or modified object
pub async fn reconcile<K: Reconcile>(ctx: &Reconciler, obj: &K) -> Result<(), ReconcileError> {
    let store = K::store(ctx);

    match store
        .run_with_finalizer(obj, K::FINALIZER, obj.cleanup(ctx))
        .await?
    {
        FinalizerOutcome::Deleted | FinalizerOutcome::Attached => return Ok(()),
        FinalizerOutcome::Continue => {}
    }

    if obj.is_reconciled() {
        debug!(
            "{} {} generation {:?} already reconciled",
            K::KIND_LABEL,
            obj.identity(),
            obj.meta().generation
        );
        return Ok(());
    }

    let start = Instant::now();
    metrics::increment_reconciliations(K::KIND_LABEL);

    let status = match obj.apply(ctx).await {
        Ok(status) => {
            info!("{} {} reconciled", K::KIND_LABEL, obj.identity());
            status
        }
        Err(e @ ReconcileError::Invariant(_)) => return Err(e),
        Err(e) => {
            warn!(
                "{} {} failed to reconcile: {}",
                K::KIND_LABEL,
                obj.identity(),
                e
            );
            metrics::increment_reconciliation_errors(K::KIND_LABEL);
            obj.failure_status(e.to_string())
        }
    };

    store.patch_status(obj, &status).await?;
    metrics::observe_reconciliation_duration(K::KIND_LABEL, start.elapsed().as_secs_f64());
    Ok(())
}

/// Whether a deletion has to remove the provider resource.
///
/// Only resources that were provisioned successfully and ask for it are
/// deleted; everything else is left in place.
fn should_delete_remote<K: ManagedResource>(obj: &K) -> bool {
    if !obj.is_ready() {
        debug!(
            "{} {} was never ready, nothing to delete",
            K::KIND_LABEL,
            obj.identity()
        );
        return false;
    }
    if obj.deletion_policy() != DeletionPolicy::Delete {
        info!(
            "{} {} retained on Bunny CDN (deletionPolicy: retain)",
            K::KIND_LABEL,
            obj.identity()
        );
        return false;
    }
    true
}

/// Namespace of a namespaced object, required for reference defaults and secrets
fn namespace_of<K: ManagedResource>(obj: &K) -> Result<String, ReconcileError> {
    obj.meta().namespace.clone().ok_or_else(|| {
        ReconcileError::Invariant(format!("{} {} has no namespace", K::KIND_LABEL, obj.identity()))
    })
}

fn name_of<K: ManagedResource>(obj: &K) -> Result<String, ReconcileError> {
    obj.meta()
        .name
        .clone()
        .ok_or_else(|| ReconcileError::Invariant(format!("{} has no name", K::KIND_LABEL)))
}
