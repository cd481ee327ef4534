//! # PullZone
//!
//! A Bunny CDN pull zone: the distribution endpoint that serves content from
//! an origin URL or a storage zone.

use crate::crd::{DeletionPolicy, ResourceRef, ZoneStatus};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pull zone custom resource
///
/// # Example
///
/// ```yaml
/// apiVersion: bunny-cdn-operator.com/v1alpha1
/// kind: PullZone
/// metadata:
///   name: images
///   namespace: web
/// spec:
///   storageZoneRef:
///     name: assets
///   zoneType: volume
///   deletionPolicy: delete
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "bunny-cdn-operator.com",
    version = "v1alpha1",
    kind = "PullZone",
    plural = "pullzones",
    namespaced,
    status = "ZoneStatus",
    shortname = "pz",
    printcolumn = r#"{"name":"Ready", "type":"boolean", "jsonPath":".status.ready"}, {"name":"Id", "type":"integer", "jsonPath":".status.providerId"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PullZoneSpec {
    /// Origin URL the zone pulls from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    /// Id of an existing Bunny storage zone used as origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_zone_id: Option<i64>,
    /// Reference to a `StorageZone` resource used as origin.
    /// Takes precedence over `storageZoneId` and `originUrl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_zone_ref: Option<ResourceRef>,
    #[serde(default)]
    pub zone_type: ZoneType,
    #[serde(default = "default_true")]
    pub zone_security_enabled: bool,
    #[serde(default = "default_true")]
    pub error_page_white_label: bool,
    /// Optimize for video
    #[serde(default = "default_true")]
    pub cache_slice_enabled: bool,
    /// Monthly bandwidth limit in bytes, 0 means unlimited
    #[serde(default)]
    pub monthly_bandwidth_limit: i64,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

fn default_true() -> bool {
    true
}

/// Pull zone pricing tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Premium,
    #[default]
    Volume,
}

impl ZoneType {
    /// Numeric value expected by the Bunny API (Premium = 0, Volume = 1)
    #[must_use]
    pub fn api_value(self) -> u8 {
        match self {
            ZoneType::Premium => 0,
            ZoneType::Volume => 1,
        }
    }
}
