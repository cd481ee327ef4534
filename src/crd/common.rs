//! # Shared CRD Types
//!
//! Types shared by every custom resource: deletion policy, cross-resource
//! references and the status block.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What happens to the provider-side resource when the custom resource is deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeletionPolicy {
    /// Delete the provider resource together with the custom resource
    Delete,
    /// Leave the provider resource in place
    #[default]
    Retain,
}

/// Reference to another custom resource managed by this operator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    /// Name of the referenced resource
    pub name: String,
    /// Namespace of the referenced resource.
    /// Defaults to the namespace of the referencing resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ResourceRef {
    /// Namespace of the reference, falling back to `default_namespace`
    #[must_use]
    pub fn namespace_or<'a>(&'a self, default_namespace: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default_namespace)
    }
}

/// Status shared by `PullZone` and `StorageZone`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStatus {
    /// Id assigned by Bunny CDN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<i64>,
    /// Whether the last reconciliation succeeded
    #[serde(default)]
    pub ready: bool,
    /// Diagnostic for the last failed reconciliation, empty on success
    #[serde(default)]
    pub message: String,
    /// Generation of the spec the last reconciliation ran against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl ZoneStatus {
    #[must_use]
    pub fn succeeded(provider_id: i64, generation: Option<i64>) -> Self {
        Self {
            provider_id: Some(provider_id),
            ready: true,
            message: String::new(),
            observed_generation: generation,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>, generation: Option<i64>) -> Self {
        Self {
            provider_id: None,
            ready: false,
            message: message.into(),
            observed_generation: generation,
        }
    }
}
