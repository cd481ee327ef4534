//! # Provider
//!
//! The CDN provider the operator reconciles against.
//!
//! [`CdnProvider`] is the seam reconcilers call through; [`BunnyClient`] is the
//! REST implementation for Bunny CDN.

use async_trait::async_trait;
use thiserror::Error;

pub mod bunny;

pub use bunny::requests::{
    CreatePullZoneRequest, CreateStorageZoneRequest, EdgeRuleRequest, EdgeRuleTrigger, Origin,
    UpdatePullZoneRequest, UpdateStorageZoneRequest,
};
pub use bunny::responses::{
    EdgeRuleResource, Hostname, PullZoneResource, StorageZoneResource,
};
pub use bunny::BunnyClient;

/// Errors returned by the CDN provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Structured error payload returned by the API
    #[error("{message}")]
    Api {
        status: u16,
        error_key: String,
        field: String,
        message: String,
    },

    /// Non-success response without a recognizable error payload
    #[error("Bunny CDN API request failed with status {status}")]
    Status { status: u16 },

    /// The request never produced a response
    #[error("Bunny CDN API request failed: {0}")]
    Transport(String),

    /// A listing response had no `Items`
    #[error("Failed to fetch {0}")]
    MissingItems(&'static str),

    /// A listing filled a whole page, pagination is not implemented
    #[error("Too many {0}, not implemented !")]
    TooManyItems(&'static str),

    /// The response body could not be decoded
    #[error("Unexpected response from Bunny CDN API: {0}")]
    Decode(String),
}

impl ProviderError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } | ProviderError::Status { status } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Operations the reconcilers need from the CDN provider
#[async_trait]
pub trait CdnProvider: Send + Sync {
    /// List pull zones (single page)
    async fn list_pull_zones(&self) -> Result<Vec<PullZoneResource>, ProviderError>;

    async fn create_pull_zone(
        &self,
        request: &CreatePullZoneRequest,
    ) -> Result<PullZoneResource, ProviderError>;

    /// Overwrite every mutable field of a pull zone
    async fn update_pull_zone(
        &self,
        id: i64,
        request: &UpdatePullZoneRequest,
    ) -> Result<PullZoneResource, ProviderError>;

    async fn delete_pull_zone(&self, id: i64) -> Result<(), ProviderError>;

    /// List storage zones (single page)
    async fn list_storage_zones(&self) -> Result<Vec<StorageZoneResource>, ProviderError>;

    async fn create_storage_zone(
        &self,
        request: &CreateStorageZoneRequest,
    ) -> Result<StorageZoneResource, ProviderError>;

    async fn update_storage_zone(
        &self,
        id: i64,
        request: &UpdateStorageZoneRequest,
    ) -> Result<(), ProviderError>;

    async fn delete_storage_zone(&self, id: i64) -> Result<(), ProviderError>;

    /// Create an edge rule, or update it when the request carries a GUID
    async fn upsert_edge_rule(
        &self,
        zone_id: i64,
        rule: &EdgeRuleRequest,
    ) -> Result<EdgeRuleResource, ProviderError>;

    async fn delete_edge_rule(&self, zone_id: i64, guid: &str) -> Result<(), ProviderError>;
}
