//! # Custom Resource Definitions
//!
//! Custom resources managed by the operator:
//!
//! - [`PullZone`] - CDN distribution zone
//! - [`StorageZone`] - origin storage
//! - [`EdgeRule`] - request routing rule scoped to a pull zone
//!
//! [`ManagedResource`] is the seam the generic reconcile plumbing (finalizer
//! gate, idempotency guard, status write-back) works through.

mod common;
mod edge_rule;
mod pull_zone;
mod storage_zone;

pub use common::{DeletionPolicy, ResourceRef, ZoneStatus};
pub use edge_rule::{EdgeRule, EdgeRuleSpec, EdgeRuleStatus, Trigger};
pub use pull_zone::{PullZone, PullZoneSpec, ZoneType};
pub use storage_zone::{Region, StorageZone, StorageZoneSpec};

use crate::constants::{EDGE_RULE_FINALIZER, PULL_ZONE_FINALIZER, STORAGE_ZONE_FINALIZER};
use kube::core::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// A custom resource reconciled against a Bunny CDN resource
pub trait ManagedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
    /// Status block written back after every reconciliation
    type Status: Clone + Debug + Serialize + Send + Sync;

    /// Finalizer token guarding provider-side cleanup
    const FINALIZER: &'static str;

    /// Kind name used in logs, metrics and error messages
    const KIND_LABEL: &'static str;

    fn has_status(&self) -> bool;

    fn observed_generation(&self) -> Option<i64>;

    /// Whether the last reconciliation succeeded
    fn is_ready(&self) -> bool;

    fn deletion_policy(&self) -> DeletionPolicy;

    /// True when the current generation has already been reconciled,
    /// successfully or not.
    fn is_reconciled(&self) -> bool {
        self.has_status() && self.observed_generation() == self.meta().generation
    }

    /// `namespace/name` identity used in logs
    fn identity(&self) -> String {
        format!(
            "{}/{}",
            self.namespace().unwrap_or_default(),
            self.name_any()
        )
    }
}

/// A managed resource other resources can depend on through a [`ResourceRef`]
pub trait ProvisionedZone: ManagedResource {
    /// Provider id, available only once the resource is ready
    fn ready_provider_id(&self) -> Option<i64>;
}

impl ManagedResource for PullZone {
    type Status = ZoneStatus;
    const FINALIZER: &'static str = PULL_ZONE_FINALIZER;
    const KIND_LABEL: &'static str = "PullZone";

    fn has_status(&self) -> bool {
        self.status.is_some()
    }

    fn observed_generation(&self) -> Option<i64> {
        self.status.as_ref().and_then(|s| s.observed_generation)
    }

    fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ready)
    }

    fn deletion_policy(&self) -> DeletionPolicy {
        self.spec.deletion_policy
    }
}

impl ProvisionedZone for PullZone {
    fn ready_provider_id(&self) -> Option<i64> {
        self.status
            .as_ref()
            .filter(|s| s.ready)
            .and_then(|s| s.provider_id)
    }
}

impl ManagedResource for StorageZone {
    type Status = ZoneStatus;
    const FINALIZER: &'static str = STORAGE_ZONE_FINALIZER;
    const KIND_LABEL: &'static str = "StorageZone";

    fn has_status(&self) -> bool {
        self.status.is_some()
    }

    fn observed_generation(&self) -> Option<i64> {
        self.status.as_ref().and_then(|s| s.observed_generation)
    }

    fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ready)
    }

    fn deletion_policy(&self) -> DeletionPolicy {
        self.spec.deletion_policy
    }
}

impl ProvisionedZone for StorageZone {
    fn ready_provider_id(&self) -> Option<i64> {
        self.status
            .as_ref()
            .filter(|s| s.ready)
            .and_then(|s| s.provider_id)
    }
}

impl ManagedResource for EdgeRule {
    type Status = EdgeRuleStatus;
    const FINALIZER: &'static str = EDGE_RULE_FINALIZER;
    const KIND_LABEL: &'static str = "EdgeRule";

    fn has_status(&self) -> bool {
        self.status.is_some()
    }

    fn observed_generation(&self) -> Option<i64> {
        self.status.as_ref().and_then(|s| s.observed_generation)
    }

    fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ready)
    }

    fn deletion_policy(&self) -> DeletionPolicy {
        self.spec.deletion_policy
    }
}
