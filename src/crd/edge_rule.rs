//! # EdgeRule
//!
//! A request routing rule attached to a pull zone.
//!
//! Action, trigger and matching types are the numeric enums of the Bunny API
//! and are passed through unchanged.

use crate::crd::{DeletionPolicy, ResourceRef};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "bunny-cdn-operator.com",
    version = "v1alpha1",
    kind = "EdgeRule",
    plural = "edgerules",
    namespaced,
    status = "EdgeRuleStatus",
    shortname = "er",
    printcolumn = r#"{"name":"Ready", "type":"boolean", "jsonPath":".status.ready"}, {"name":"Zone", "type":"integer", "jsonPath":".status.parentZoneId"}, {"name":"Message", "type":"string", "jsonPath":".status.message"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRuleSpec {
    /// The `PullZone` the rule belongs to
    pub zone_ref: ResourceRef,
    pub action_type: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_parameter1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_parameter2: Option<String>,
    pub triggers: Vec<Trigger>,
    pub trigger_matching_type: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub r#type: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_matches: Option<Vec<String>>,
    pub pattern_matching_type: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter1: Option<String>,
}

/// Status of an `EdgeRule`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRuleStatus {
    /// GUID assigned by Bunny CDN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    /// Id of the pull zone the rule was written to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_zone_id: Option<i64>,
    #[serde(default)]
    pub ready: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl EdgeRuleStatus {
    #[must_use]
    pub fn succeeded(guid: String, parent_zone_id: i64, generation: Option<i64>) -> Self {
        Self {
            provider_id: Some(guid),
            parent_zone_id: Some(parent_zone_id),
            ready: true,
            message: String::new(),
            observed_generation: generation,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>, generation: Option<i64>) -> Self {
        Self {
            provider_id: None,
            parent_zone_id: None,
            ready: false,
            message: message.into(),
            observed_generation: generation,
        }
    }
}
