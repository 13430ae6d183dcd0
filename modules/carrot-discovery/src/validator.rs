//! Structural checks on a normalized plan. Pure and synchronous.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use carrot_common::{host_of, is_wikipedia_host, path_segment_count};

use crate::plan::{DiscoveryPlan, QueryCategory};

/// Distinct non-wikipedia hosts a plan must reach.
pub const MIN_DISTINCT_DOMAINS: usize = 6;
/// Seeds shallower than this many path segments are placeholders.
pub const MIN_SEED_PATH_SEGMENTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanRejection {
    ExcessWikiSeeds,
    ShallowSeedDetected,
    InsufficientDomainDiversity,
    EmptyQueryBlocks,
}

impl PlanRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanRejection::ExcessWikiSeeds => "excess_wiki_seeds",
            PlanRejection::ShallowSeedDetected => "shallow_seed_detected",
            PlanRejection::InsufficientDomainDiversity => "insufficient_domain_diversity",
            PlanRejection::EmptyQueryBlocks => "empty_query_blocks",
        }
    }
}

impl fmt::Display for PlanRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<PlanRejection>,
}

impl PlanValidation {
    fn pass() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    fn fail(reason: PlanRejection) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }

    pub fn reason_str(&self) -> Option<&'static str> {
        self.reason.map(|r| r.as_str())
    }
}

/// Checks, first failure wins:
/// 1. wikipedia seeds ≤ `fetchRules.maxWikiSeeds`
/// 2. every non-wikipedia seed is a deep article URL
/// 3. ≥ `MIN_DISTINCT_DOMAINS` distinct non-wikipedia hosts
/// 4. some query block or content-query bucket is populated
pub fn validate_planner_plan(plan: &DiscoveryPlan) -> PlanValidation {
    let hosts: Vec<(Option<String>, &str)> = plan
        .seed_candidates
        .iter()
        .map(|s| (host_of(&s.url), s.url.as_str()))
        .collect();

    let wiki_seeds = hosts
        .iter()
        .filter(|(host, _)| host.as_deref().is_some_and(is_wikipedia_host))
        .count();
    if wiki_seeds > plan.fetch_rules.max_wiki_seeds as usize {
        return PlanValidation::fail(PlanRejection::ExcessWikiSeeds);
    }

    let mut distinct = HashSet::new();
    for (host, url) in &hosts {
        if host.as_deref().is_some_and(is_wikipedia_host) {
            continue;
        }
        let deep_enough = path_segment_count(url).is_some_and(|n| n >= MIN_SEED_PATH_SEGMENTS);
        if !deep_enough {
            return PlanValidation::fail(PlanRejection::ShallowSeedDetected);
        }
        if let Some(host) = host {
            distinct.insert(host.as_str());
        }
    }

    if distinct.len() < MIN_DISTINCT_DOMAINS {
        return PlanValidation::fail(PlanRejection::InsufficientDomainDiversity);
    }

    let queries_populated = QueryCategory::ALL
        .iter()
        .any(|c| plan.queries.block(*c).is_populated())
        || !plan.content_queries.is_empty();
    if !queries_populated {
        return PlanValidation::fail(PlanRejection::EmptyQueryBlocks);
    }

    PlanValidation::pass()
}
