//! # Storage Zone Reconciliation

use super::{name_of, namespace_of, should_delete_remote, Reconcile, Reconciler};
use crate::constants::{
    STORAGE_ZONE_HOSTNAME_KEY, STORAGE_ZONE_ID_KEY, STORAGE_ZONE_NAME_KEY,
    STORAGE_ZONE_PASSWORD_KEY, STORAGE_ZONE_READ_ONLY_PASSWORD_KEY,
};
use crate::controller::credentials::materialize_secret;
use crate::controller::error::ReconcileError;
use crate::controller::store::ObjectStore;
use crate::crd::{ManagedResource, StorageZone, ZoneStatus};
use crate::provider::{CreateStorageZoneRequest, StorageZoneResource, UpdateStorageZoneRequest};
use async_trait::async_trait;
use kube::Resource;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[async_trait]
impl Reconcile for StorageZone {
    fn store(ctx: &Reconciler) -> &dyn ObjectStore<Self> {
        ctx.storage_zones.as_ref()
    }

    async fn apply(&self, ctx: &Reconciler) -> Result<ZoneStatus, ReconcileError> {
        let name = name_of(self)?;
        let namespace = namespace_of(self)?;

        // Deleted zones linger in the listing and must not be reused
        let existing = ctx
            .provider
            .list_storage_zones()
            .await?
            .into_iter()
            .find(|zone| zone.name == name && !zone.deleted);

        let zone = match existing {
            Some(zone) => {
                debug!("Storage zone {} already exists ({})", name, zone.id);
                zone
            }
            None => {
                info!("Creating storage zone {}", name);
                let request = CreateStorageZoneRequest {
                    name: name.clone(),
                    region: self.spec.region,
                    replication_regions: self.spec.replication_regions.clone(),
                };
                ctx.provider.create_storage_zone(&request).await?
            }
        };

        let update = UpdateStorageZoneRequest {
            replication_zones: self.spec.replication_regions.clone().unwrap_or_default(),
        };
        ctx.provider.update_storage_zone(zone.id, &update).await?;

        materialize_secret(
            ctx.secrets.as_ref(),
            &format!("{name}.storagezone.credentials"),
            &namespace,
            &credentials(&zone),
            Some(self),
        )
        .await?;

        Ok(ZoneStatus::succeeded(zone.id, self.meta().generation))
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
                    "StorageZone {} is ready but has no provider id",
                    self.identity()
                ))
            })?;

        info!("Deleting storage zone {} ({})", self.identity(), id);
        ctx.provider.delete_storage_zone(id).await?;
        Ok(())
    }
}

fn credentials(zone: &StorageZoneResource) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    values.insert(STORAGE_ZONE_ID_KEY.to_string(), zone.id.to_string());
    values.insert(STORAGE_ZONE_NAME_KEY.to_string(), zone.name.clone());

    let optional = [
        (STORAGE_ZONE_PASSWORD_KEY, &zone.password),
        (STORAGE_ZONE_READ_ONLY_PASSWORD_KEY, &zone.read_only_password),
        (STORAGE_ZONE_HOSTNAME_KEY, &zone.storage_hostname),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            values.insert(key.to_string(), value.clone());
        }
    }
    values
}
