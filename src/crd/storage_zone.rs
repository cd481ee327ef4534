//! # StorageZone
//!
//! A Bunny CDN storage zone used as origin storage for pull zones.

use crate::crd::{DeletionPolicy, ZoneStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "bunny-cdn-operator.com",
    version = "v1alpha1",
    kind = "StorageZone",
    plural = "storagezones",
    namespaced,
    status = "ZoneStatus",
    shortname = "sz",
    printcolumn = r#"{"name":"Ready", "type":"boolean", "jsonPath":".status.ready"}, {"name":"Id", "type":"integer", "jsonPath":".status.providerId"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct StorageZoneSpec {
    /// Main storage region, the provider defaults to `DE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    /// Regions the zone is replicated to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_regions: Option<Vec<Region>>,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// Storage regions supported by Bunny CDN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum Region {
    #[serde(rename = "DE")]
    Falkenstein,
    #[serde(rename = "NY")]
    NewYork,
    #[serde(rename = "LA")]
    LosAngeles,
    #[serde(rename = "SG")]
    Singapore,
    #[serde(rename = "SYD")]
    Sydney,
}
