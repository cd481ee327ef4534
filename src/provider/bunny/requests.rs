//! # Request Types
//!
//! Bodies sent to the Bunny CDN API. Field names follow the API's PascalCase.

use crate::crd::Region;
use serde::Serialize;

/// Where a pull zone pulls its content from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    StorageZone(i64),
    Url(String),
}

impl Origin {
    fn storage_zone_id(&self) -> Option<i64> {
        match self {
            Origin::StorageZone(id) => Some(*id),
            Origin::Url(_) => None,
        }
    }

    fn url(&self) -> Option<String> {
        match self {
            Origin::Url(url) => Some(url.clone()),
            Origin::StorageZone(_) => None,
        }
    }
}

/// `POST /pullzone`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreatePullZoneRequest {
    pub name: String,
    /// Premium = 0, Volume = 1
    pub r#type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_zone_id: Option<i64>,
}

impl CreatePullZoneRequest {
    #[must_use]
    pub fn new(name: impl Into<String>, zone_type: u8, origin: &Origin) -> Self {
        Self {
            name: name.into(),
            r#type: zone_type,
            origin_url: origin.url(),
            storage_zone_id: origin.storage_zone_id(),
        }
    }
}

/// `POST /pullzone/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdatePullZoneRequest {
    pub r#type: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_zone_id: Option<i64>,
    pub enable_cache_slice: bool,
    pub error_page_whitelabel: bool,
    pub monthly_bandwidth_limit: i64,
    pub zone_security_enabled: bool,
}

/// `POST /storagezone`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateStorageZoneRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_regions: Option<Vec<Region>>,
}

/// `POST /storagezone/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStorageZoneRequest {
    pub replication_zones: Vec<Region>,
}

/// `POST /pullzone/{id}/edgerules/addOrUpdate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EdgeRuleRequest {
    /// Present when updating an existing rule
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub action_type: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_parameter1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_parameter2: Option<String>,
    pub triggers: Vec<EdgeRuleTrigger>,
    pub trigger_matching_type: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EdgeRuleTrigger {
    pub r#type: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_matches: Option<Vec<String>>,
    pub pattern_matching_type: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter1: Option<String>,
}
