//! # Watch Dispatcher
//!
//! Drives reconciliation from the per-kind watch streams.
//!
//! - Each kind has its own stream; the kinds run concurrently.
//! - Within a kind, events are handled one at a time in delivery order.
//! - Only added and modified objects are reconciled. Deletion goes through
//!   the finalizer gate, delete events only confirm the object is gone.
//! - A failure while handling one event is logged with the object identity
//!   and the stream moves on to the next event.

use crate::controller::reconciler::{reconcile, Reconcile, Reconciler};
use crate::controller::store::WatchEvent;
use crate::crd::{EdgeRule, PullZone, StorageZone};
use crate::observability::metrics;
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Run all watchers until `shutdown` completes.
///
/// In-flight reconciliations are dropped with the streams when the stop
/// signal arrives.
pub async fn run_until<F>(ctx: Arc<Reconciler>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::select! {
        () = run(ctx) => warn!("All watch streams ended"),
        () = shutdown => info!("Stop signal received, stopping watchers"),
    }
}

/// Run the watchers of every kind concurrently
pub async fn run(ctx: Arc<Reconciler>) {
    tokio::join!(
        watch_kind::<StorageZone>(Arc::clone(&ctx)),
        watch_kind::<PullZone>(Arc::clone(&ctx)),
        watch_kind::<EdgeRule>(ctx),
    );
}

/// Consume the watch stream of one kind until it ends
pub async fn watch_kind<K: Reconcile>(ctx: Arc<Reconciler>) {
    let mut events = K::store(&ctx).watch();
    info!("Watching {} resources", K::KIND_LABEL);

    while let Some(event) = events.next().await {
        match event {
            Ok(WatchEvent::Added(obj) | WatchEvent::Modified(obj)) => {
                handle_event(&ctx, &obj).await;
            }
            Ok(WatchEvent::Deleted(obj)) => {
                debug!("{} {} removed", K::KIND_LABEL, obj.identity());
            }
            Err(e) => {
                warn!("{} watch error: {}", K::KIND_LABEL, e);
                metrics::increment_event_failures(K::KIND_LABEL);
            }
        }
    }

    warn!("{} watch stream ended", K::KIND_LABEL);
}

/// Reconcile one object, containing any failure
async fn handle_event<K: Reconcile>(ctx: &Reconciler, obj: &K) {
    let meta = obj.meta();
    let span = info_span!(
        "reconcile",
        resource.kind = K::KIND_LABEL,
        resource.name = meta.name.as_deref().unwrap_or("unknown"),
        resource.namespace = meta.namespace.as_deref().unwrap_or("default"),
    );

    if let Err(e) = reconcile(ctx, obj).instrument(span).await {
        error!(
            "Failed to handle {} {} ({}): {}",
            K::KIND_LABEL,
            obj.identity(),
            e.kind(),
            e
        );
        metrics::increment_event_failures(K::KIND_LABEL);
    }
}
