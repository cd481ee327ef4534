//! # Edge Rule Reconciliation
//!
//! Edge rules have no name on the provider side. The GUID recorded in status
//! identifies the rule, and is only reused while the rule still lives in the
//! same pull zone.

use super::{namespace_of, should_delete_remote, Reconcile, Reconciler};
use crate::controller::dependency::resolve_provider_id;
use crate::controller::error::ReconcileError;
use crate::controller::store::ObjectStore;
use crate::crd::{EdgeRule, EdgeRuleStatus, ManagedResource, PullZone};
use crate::provider::{EdgeRuleRequest, EdgeRuleTrigger};
use async_trait::async_trait;
use kube::Resource;
use tracing::{debug, info};

#[async_trait]
impl Reconcile for EdgeRule {
    fn store(ctx: &Reconciler) -> &dyn ObjectStore<Self> {
        ctx.edge_rules.as_ref()
    }

    async fn apply(&self, ctx: &Reconciler) -> Result<EdgeRuleStatus, ReconcileError> {
        let namespace = namespace_of(self)?;

        let zone_id = resolve_provider_id::<PullZone>(
            ctx.pull_zones.as_ref(),
            &self.spec.zone_ref,
            &namespace,
            ctx.dependency_backoff,
        )
        .await?;

        let guid = existing_guid(self, zone_id);
        match &guid {
            Some(guid) => debug!("Updating edge rule {} in pull zone {}", guid, zone_id),
            None => info!("Creating edge rule {} in pull zone {}", self.identity(), zone_id),
        }

        let rule = ctx
            .provider
            .upsert_edge_rule(zone_id, &rule_request(self, guid))
            .await?;

        Ok(EdgeRuleStatus::succeeded(
            rule.guid,
            zone_id,
            self.meta().generation,
        ))
    }

    fn failure_status(&self, message: String) -> EdgeRuleStatus {
        EdgeRuleStatus::failed(message, self.meta().generation)
    }

    async fn cleanup(&self, ctx: &Reconciler) -> Result<(), ReconcileError> {
        if !should_delete_remote(self) {
            return Ok(());
        }

        let status = self.status.as_ref();
        let (Some(guid), Some(zone_id)) = (
            status.and_then(|s| s.provider_id.as_deref()),
            status.and_then(|s| s.parent_zone_id),
        ) else {
            return Err(ReconcileError::Invariant(format!(
                "EdgeRule {} is ready but has no rule id or pull zone id",
                self.identity()
            )));
        };

        info!(
            "Deleting edge rule {} ({}) from pull zone {}",
            self.identity(),
            guid,
            zone_id
        );
        ctx.provider.delete_edge_rule(zone_id, guid).await?;
        Ok(())
    }
}

/// GUID of the rule recorded in status, if it belongs to `zone_id`
fn existing_guid(rule: &EdgeRule, zone_id: i64) -> Option<String> {
    rule.status
        .as_ref()
        .filter(|status| status.parent_zone_id == Some(zone_id))
        .and_then(|status| status.provider_id.clone())
}

fn rule_request(rule: &EdgeRule, guid: Option<String>) -> EdgeRuleRequest {
    let spec = &rule.spec;
    EdgeRuleRequest {
        guid,
        action_type: spec.action_type,
        action_parameter1: spec.action_parameter1.clone(),
        action_parameter2: spec.action_parameter2.clone(),
        triggers: spec
            .triggers
            .iter()
            .map(|trigger| EdgeRuleTrigger {
                r#type: trigger.r#type,
                pattern_matches: trigger.pattern_matches.clone(),
                pattern_matching_type: trigger.pattern_matching_type,
                parameter1: trigger.parameter1.clone(),
            })
            .collect(),
        trigger_matching_type: spec.trigger_matching_type,
        description: spec.description.clone(),
        enabled: spec.enabled.unwrap_or(true),
    }
}
