// Trait abstractions for the planner's external collaborators.
//
// FrontierStore: the crawl queue; owns dedupe/merge of item ids.
// PlanStore: plan persistence keyed by run id.
//
// Both are implemented in-memory by `testing` for deterministic tests.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::plan::DiscoveryPlan;

/// One unit of crawl work. Higher `priority` is fetched sooner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontierItem {
    pub id: String,
    pub provider: String,
    /// URL for direct seeds, search string for query items.
    pub cursor: String,
    pub priority: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<String>,
    pub meta: serde_json::Value,
}

#[async_trait]
pub trait FrontierStore: Send + Sync {
    /// Add an item to the frontier of `patch_id`. Duplicate ids are the
    /// store's concern.
    async fn add_to_frontier(&self, patch_id: &str, item: FrontierItem) -> Result<()>;
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn store_discovery_plan(&self, run_id: &str, plan: &DiscoveryPlan) -> Result<()>;
}
