//! # Object Store
//!
//! The control-plane capability reconcilers are handed: a change stream per
//! resource kind, status reads and writes, and the finalizer gate.
//!
//! [`KubeStore`] backs it with the Kubernetes API.

use crate::constants::FIELD_MANAGER;
use crate::controller::error::ReconcileError;
use crate::crd::ManagedResource;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::{BoxStream, StreamExt};
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, ResourceExt};
use kube_runtime::{watcher, WatchStreamExt};
use std::marker::PhantomData;
use tracing::{debug, info};

/// A change to a watched object
#[derive(Debug, Clone)]
pub enum WatchEvent<K> {
    Added(K),
    Modified(K),
    Deleted(K),
}

/// What the finalizer gate decided for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizerOutcome {
    /// The object is being deleted, the modify path must not run
    Deleted,
    /// The finalizer was just attached. The patch triggers a new event which
    /// carries the finalizer, the modify path runs on that one.
    Attached,
    /// The finalizer is in place, continue with the modify path
    Continue,
}

/// Access to the desired-state objects of one resource kind
#[async_trait]
pub trait ObjectStore<K: ManagedResource>: Send + Sync {
    /// Change stream for the kind. Errors are per-item, the stream keeps going.
    fn watch(&self) -> BoxStream<'static, Result<WatchEvent<K>, ReconcileError>>;

    /// Read an object, `None` when it does not exist
    async fn get(&self, name: &str, namespace: &str) -> Result<Option<K>, ReconcileError>;

    /// Merge `status` into the object's status subresource
    async fn patch_status(&self, obj: &K, status: &K::Status) -> Result<(), ReconcileError>;

    /// Persist a new finalizer list on the object
    async fn replace_finalizers(&self, obj: &K, finalizers: Vec<String>)
        -> Result<(), ReconcileError>;

    /// Finalizer gate.
    ///
    /// - Deletion marker set and `token` present: await `on_delete`, then drop
    ///   the token so the object can go away. A failing `on_delete` keeps the
    ///   token, the object stays until a later attempt succeeds.
    /// - Deletion marker set and `token` absent: nothing left to clean up.
    /// - No deletion marker and `token` absent: attach it and stop. Modify
    ///   processing waits for the event produced by the finalizer patch.
    ///
    /// `on_delete` is only polled on the delete path.
    async fn run_with_finalizer<'a>(
        &'a self,
        obj: &'a K,
        token: &'a str,
        on_delete: BoxFuture<'a, Result<(), ReconcileError>>,
    ) -> Result<FinalizerOutcome, ReconcileError> {
        let finalizers = obj.finalizers();
        let has_token = finalizers.iter().any(|f| f == token);

        if obj.meta().deletion_timestamp.is_some() {
            if has_token {
                on_delete.await?;
                let remaining = finalizers
                    .iter()
                    .filter(|f| f.as_str() != token)
                    .cloned()
                    .collect();
                self.replace_finalizers(obj, remaining).await?;
                info!("Removed finalizer from {}", obj.identity());
            } else {
                debug!("{} is being deleted without our finalizer", obj.identity());
            }
            return Ok(FinalizerOutcome::Deleted);
        }

        if !has_token {
            let mut updated = finalizers.to_vec();
            updated.push(token.to_string());
            self.replace_finalizers(obj, updated).await?;
            debug!("Attached finalizer to {}", obj.identity());
            return Ok(FinalizerOutcome::Attached);
        }

        Ok(FinalizerOutcome::Continue)
    }
}

/// [`ObjectStore`] backed by the Kubernetes API
pub struct KubeStore<K> {
    client: Client,
    /// Watch scope, all namespaces when `None`
    watch_namespace: Option<String>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> std::fmt::Debug for KubeStore<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore")
            .field("watch_namespace", &self.watch_namespace)
            .finish_non_exhaustive()
    }
}

impl<K: ManagedResource> KubeStore<K> {
    #[must_use]
    pub fn new(client: Client, watch_namespace: Option<String>) -> Self {
        Self {
            client,
            watch_namespace,
            _kind: PhantomData,
        }
    }

    fn api_for(&self, obj: &K) -> Result<Api<K>, ReconcileError> {
        let namespace = obj.namespace().ok_or_else(|| {
            ReconcileError::Invariant(format!("{} has no namespace", obj.name_any()))
        })?;
        Ok(Api::namespaced(self.client.clone(), &namespace))
    }
}

#[async_trait]
impl<K: ManagedResource> ObjectStore<K> for KubeStore<K> {
    fn watch(&self) -> BoxStream<'static, Result<WatchEvent<K>, ReconcileError>> {
        let api: Api<K> = match &self.watch_namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };

        watcher(api, watcher::Config::default())
            .default_backoff()
            .filter_map(|event| async move {
                match event {
                    Ok(watcher::Event::InitApply(obj)) => Some(Ok(WatchEvent::Added(obj))),
                    Ok(watcher::Event::Apply(obj)) => Some(Ok(WatchEvent::Modified(obj))),
                    Ok(watcher::Event::Delete(obj)) => Some(Ok(WatchEvent::Deleted(obj))),
                    Ok(watcher::Event::Init | watcher::Event::InitDone) => None,
                    Err(e) => Some(Err(ReconcileError::Infrastructure(format!(
                        "Watch stream error: {e}"
                    )))),
                }
            })
            .boxed()
    }

    async fn get(&self, name: &str, namespace: &str) -> Result<Option<K>, ReconcileError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn patch_status(&self, obj: &K, status: &K::Status) -> Result<(), ReconcileError> {
        let patch = serde_json::json!({
            "status": status
        });

        self.api_for(obj)?
            .patch_status(
                &obj.name_any(),
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(patch),
            )
            .await?;

        Ok(())
    }

    async fn replace_finalizers(
        &self,
        obj: &K,
        finalizers: Vec<String>,
    ) -> Result<(), ReconcileError> {
        let patch = serde_json::json!({
            "metadata": { "finalizers": finalizers }
        });

        self.api_for(obj)?
            .patch(&obj.name_any(), &PatchParams::default(), &Patch::Merge(patch))
            .await?;

        Ok(())
    }
}
