//! # Pull Zone Reconciliation

use super::{name_of, namespace_of, should_delete_remote, Reconcile, Reconciler};
use crate::constants::{ZONE_HOST_KEY, ZONE_ID_KEY, ZONE_SECURITY_KEY_KEY};
use crate::controller::credentials::materialize_secret;
use crate::controller::dependency::resolve_provider_id;
use crate::controller::error::ReconcileError;
use crate::controller::store::ObjectStore;
use crate::crd::{ManagedResource, PullZone, StorageZone, ZoneStatus};
use crate::provider::{CreatePullZoneRequest, Origin, PullZoneResource, UpdatePullZoneRequest};
use async_trait::async_trait;
use kube::Resource;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[async_trait]
impl Reconcile for PullZone {
    fn store(ctx: &Reconciler) -> &dyn ObjectStore<Self> {
        ctx.pull_zones.as_ref()
    }

    async fn apply(&self, ctx: &Reconciler) -> Result<ZoneStatus, ReconcileError> {
        let name = name_of(self)?;
        let namespace = namespace_of(self)?;

        let origin = resolve_origin(self, ctx, &name, &namespace).await?;
        let zone_type = self.spec.zone_type.api_value();

        let existing = ctx
            .provider
            .list_pull_zones()
            .await?
            .into_iter()
            .find(|zone| zone.name == name);

        let id = match existing {
            Some(zone) => {
                debug!("Pull zone {} already exists ({})", name, zone.id);
                zone.id
            }
            None => {
                info!("Creating pull zone {}", name);
                ctx.provider
                    .create_pull_zone(&CreatePullZoneRequest::new(&name, zone_type, &origin))
                    .await?
                    .id
            }
        };

        let update = update_request(self, zone_type, &origin);
        let zone = ctx.provider.update_pull_zone(id, &update).await?;

        materialize_secret(
            ctx.secrets.as_ref(),
            &format!("{name}.pullzone.credentials"),
            &namespace,
            &credentials(&zone),
            Some(self),
        )
        .await?;

        Ok(ZoneStatus::succeeded(id, self.meta().generation))
    }

    fn failure_status(&self, message: String) -> ZoneStatus {
        ZoneStatus::failed(message, self.meta().generation)
    }

    async fn cleanup(&self, ctx: &Reconciler) -> Result<(), ReconcileError> {
        if !should_delete_remote(self) {
            return Ok(());
        }

        let id = self
            .status
            .as_ref()
            .and_then(|status| status.provider_id)
            .ok_or_else(|| {
                ReconcileError::Invariant(format!(
                    "PullZone {} is ready but has no provider id",
                    self.identity()
                ))
            })?;

        info!("Deleting pull zone {} ({})", self.identity(), id);
        ctx.provider.delete_pull_zone(id).await?;
        Ok(())
    }
}

/// Pick the zone origin: storage zone reference, then storage zone id, then URL
async fn resolve_origin(
    zone: &PullZone,
    ctx: &Reconciler,
    name: &str,
    namespace: &str,
) -> Result<Origin, ReconcileError> {
    let spec = &zone.spec;

    if let Some(reference) = &spec.storage_zone_ref {
        let id = resolve_provider_id::<StorageZone>(
            ctx.storage_zones.as_ref(),
            reference,
            namespace,
            ctx.dependency_backoff,
        )
        .await?;
        return Ok(Origin::StorageZone(id));
    }

    if let Some(id) = spec.storage_zone_id {
        return Ok(Origin::StorageZone(id));
    }

    if let Some(url) = &spec.origin_url {
        return Ok(Origin::Url(url.clone()));
    }

    Err(ReconcileError::InvalidSpec(format!(
        "Required property missing on {name}: at least one of \"originUrl\", \"storageZoneId\" or \"storageZoneRef\" is required"
    )))
}

fn update_request(zone: &PullZone, zone_type: u8, origin: &Origin) -> UpdatePullZoneRequest {
    let (origin_url, storage_zone_id) = match origin {
        Origin::StorageZone(id) => (None, Some(*id)),
        Origin::Url(url) => (Some(url.clone()), None),
    };

    UpdatePullZoneRequest {
        r#type: zone_type,
        origin_url,
        storage_zone_id,
        enable_cache_slice: zone.spec.cache_slice_enabled,
        error_page_whitelabel: zone.spec.error_page_white_label,
        monthly_bandwidth_limit: zone.spec.monthly_bandwidth_limit,
        zone_security_enabled: zone.spec.zone_security_enabled,
    }
}

/// Plain-text credential values for the zone secret
fn credentials(zone: &PullZoneResource) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    values.insert(ZONE_ID_KEY.to_string(), zone.id.to_string());
    if let Some(key) = &zone.zone_security_key {
        values.insert(ZONE_SECURITY_KEY_KEY.to_string(), key.clone());
    }
    if let Some(host) = zone.primary_hostname() {
        values.insert(ZONE_HOST_KEY.to_string(), host.to_string());
    }
    values
}
