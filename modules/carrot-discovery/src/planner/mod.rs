//! Discovery planner: topic → model plan (or fallback) → normalized plan →
//! plan store + frontier seeds.

pub mod priority;
mod prompt;
pub mod seeding;

pub use priority::compute_seed_priority;
pub use seeding::{
    build_query_items, build_seed_items, seed_frontier_from_plan, select_seeds, SeedingReport,
};

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use ai_client::{collect_stream, CompletionRequest, CompletionService, Message};
use carrot_common::AppConfig;

use crate::plan::{build_fallback_plan, ensure_plan_defaults, DiscoveryPlan, RawPlan};
use crate::traits::{FrontierStore, PlanStore};
use crate::validator::validate_planner_plan;

use prompt::{planner_user_prompt, PLANNER_SYSTEM_PROMPT};

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// Overrides the completion service's default model.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.4,
            max_tokens: 4096,
        }
    }
}

impl PlannerOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: Some(config.planner_model.clone()),
            temperature: config.planner_temperature,
            max_tokens: config.planner_max_tokens,
        }
    }
}

/// Stateless apart from its collaborators; safe to share across tasks.
#[derive(Clone, TypedBuilder)]
pub struct Planner {
    completion: Arc<dyn CompletionService>,
    frontier: Arc<dyn FrontierStore>,
    plans: Arc<dyn PlanStore>,
    #[builder(default)]
    options: PlannerOptions,
}

impl Planner {
    /// Plan `topic`, persist the plan under `run_id` and seed the frontier of
    /// `patch_id`. Model failures fall back to the deterministic plan; only
    /// plan-store failures are returned as errors.
    pub async fn generate_discovery_plan(
        &self,
        topic: &str,
        aliases: &[String],
        patch_id: &str,
        run_id: &str,
    ) -> Result<DiscoveryPlan> {
        let plan = self.plan_topic(topic, aliases).await;

        let validation = validate_planner_plan(&plan);
        match validation.reason {
            None => debug!(topic, run_id, "Discovery plan passed validation"),
            Some(reason) => warn!(
                topic,
                run_id,
                reason = reason.as_str(),
                "Discovery plan failed validation, seeding anyway"
            ),
        }

        self.plans
            .store_discovery_plan(run_id, &plan)
            .await
            .with_context(|| format!("storing discovery plan for run {run_id}"))?;

        let timestamp = Utc::now().timestamp_millis();
        seed_frontier_from_plan(self.frontier.as_ref(), patch_id, run_id, &plan, timestamp).await;

        Ok(plan)
    }

    /// Model plan normalized against the fallback. Never fails.
    pub async fn plan_topic(&self, topic: &str, aliases: &[String]) -> DiscoveryPlan {
        let fallback = build_fallback_plan(topic, aliases);

        match self.request_plan(topic, aliases).await {
            Ok(raw) => {
                let plan = ensure_plan_defaults(raw, &fallback);
                info!(
                    topic,
                    seeds = plan.seed_candidates.len(),
                    contested_claims = plan.contested_plan.len(),
                    "Generated discovery plan"
                );
                plan
            }
            Err(e) => {
                warn!(topic, error = %e, "Planner model call failed, using fallback plan");
                fallback
            }
        }
    }

    async fn request_plan(&self, topic: &str, aliases: &[String]) -> Result<RawPlan> {
        let mut request = CompletionRequest::new()
            .message(Message::system(PLANNER_SYSTEM_PROMPT))
            .message(Message::user(planner_user_prompt(topic, aliases)))
            .temperature(self.options.temperature)
            .max_tokens(self.options.max_tokens);
        if let Some(model) = &self.options.model {
            request = request.model(model.clone());
        }

        debug!(topic, "Requesting discovery plan");
        let stream = self.completion.stream(request).await?;
        let text = collect_stream(stream).await?;
        let raw = RawPlan::parse(&text).context("planner response is not a JSON object")?;
        Ok(raw)
    }
}
