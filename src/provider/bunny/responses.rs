//! # Response Types
//!
//! Payloads returned by the Bunny CDN API. Only the fields the operator reads
//! are modelled; everything else is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Paged listing envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResponse<T> {
    pub items: Option<Vec<T>>,
}

/// Error payload returned on failed requests
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorPayload {
    pub error_key: String,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Hostname {
    #[serde(default)]
    pub id: i64,
    pub value: String,
    #[serde(default)]
    pub is_system_hostname: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PullZoneResource {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub origin_url: Option<String>,
    #[serde(default)]
    pub storage_zone_id: Option<i64>,
    #[serde(default)]
    pub hostnames: Vec<Hostname>,
    #[serde(default)]
    pub zone_security_key: Option<String>,
}

impl PullZoneResource {
    /// Hostname clients should use, preferring the system hostname
    #[must_use]
    pub fn primary_hostname(&self) -> Option<&str> {
        self.hostnames
            .iter()
            .find(|h| h.is_system_hostname)
            .or_else(|| self.hostnames.first())
            .map(|h| h.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageZoneResource {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub read_only_password: Option<String>,
    #[serde(default)]
    pub storage_hostname: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EdgeRuleResource {
    pub guid: String,
}
