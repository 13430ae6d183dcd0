//! Turning a plan into frontier work: greedy cap-respecting seed selection,
//! priority scoring and query fan-out.

use std::collections::HashMap;

use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use carrot_common::host_of;

use super::priority::compute_seed_priority;
use crate::plan::{DiscoveryPlan, PlannerSeedCandidate, QueryCategory, Stance};
use crate::traits::{FrontierItem, FrontierStore};

pub const MAX_DIRECT_SEEDS: usize = 10;
pub const MAX_CONTESTED_SEEDS: usize = 5;
pub const MAX_ESTABLISHMENT_SEEDS: usize = 5;
/// Priority used for seeds the model left unranked.
const UNRANKED_PRIORITY: u16 = 999;
const QUERY_INDEX_STEP: i64 = 5;

pub const DIRECT_SEED_PROVIDER: &str = "direct_seed";

/// Walk candidates in ascending `priority` (stable) and keep each one whose
/// domain and stance counters are still under their caps.
pub fn select_seeds(
    candidates: &[PlannerSeedCandidate],
    max_per_domain: u32,
) -> Vec<&PlannerSeedCandidate> {
    let mut sorted: Vec<&PlannerSeedCandidate> = candidates.iter().collect();
    sorted.sort_by_key(|s| s.priority.map(u16::from).unwrap_or(UNRANKED_PRIORITY));

    let mut per_domain: HashMap<String, u32> = HashMap::new();
    let mut contested = 0usize;
    let mut establishment = 0usize;
    let mut selected = Vec::new();

    for seed in sorted {
        if selected.len() >= MAX_DIRECT_SEEDS {
            break;
        }

        let stance_count = match seed.stance {
            Stance::Contested => &mut contested,
            Stance::Establishment => &mut establishment,
        };
        let stance_cap = match seed.stance {
            Stance::Contested => MAX_CONTESTED_SEEDS,
            Stance::Establishment => MAX_ESTABLISHMENT_SEEDS,
        };
        if *stance_count >= stance_cap {
            continue;
        }

        let domain = host_of(&seed.url).unwrap_or_default();
        let domain_count = per_domain.entry(domain).or_insert(0);
        if *domain_count >= max_per_domain {
            continue;
        }

        *domain_count += 1;
        *stance_count += 1;
        selected.push(seed);
    }

    selected
}

/// Direct-seed items for the selected seeds, ids
/// `direct_seed:<timestamp>:<index>:<url>`.
pub fn build_seed_items(
    plan: &DiscoveryPlan,
    run_id: &str,
    timestamp_ms: i64,
) -> Vec<FrontierItem> {
    select_seeds(&plan.seed_candidates, plan.coverage_targets.max_per_domain)
        .into_iter()
        .enumerate()
        .map(|(index, seed)| FrontierItem {
            id: format!("{DIRECT_SEED_PROVIDER}:{timestamp_ms}:{index}:{}", seed.url),
            provider: DIRECT_SEED_PROVIDER.to_string(),
            cursor: seed.url.clone(),
            priority: compute_seed_priority(seed, index, &plan.domain_whitelists),
            angle: Some(seed.stance.as_str().to_string()),
            meta: json!({
                "runId": run_id,
                "topic": plan.topic,
                "url": seed.url,
                "titleGuess": seed.title_guess,
                "category": seed.category,
                "stance": seed.stance,
                "credibilityTier": seed.credibility_tier,
                "plannerPriority": seed.priority,
                "quotePullHints": seed.quote_pull_hints,
                "verification": seed.verification,
                "whyItMatters": seed.why_it_matters,
                "isHistory": seed.is_history,
                "isControversy": seed.is_controversy,
            }),
        })
        .collect()
}

/// One item per content query, provider `query:<type>`, priority
/// `base - index * 5`.
pub fn build_query_items(
    plan: &DiscoveryPlan,
    run_id: &str,
    timestamp_ms: i64,
) -> Vec<FrontierItem> {
    let mut items = Vec::new();
    for category in QueryCategory::ALL {
        let block = plan.queries.block(category);
        for (index, query) in plan.content_queries.bucket(category).iter().enumerate() {
            let provider = format!("query:{}", category.as_str());
            items.push(FrontierItem {
                id: format!("{provider}:{timestamp_ms}:{index}:{query}"),
                provider,
                cursor: query.clone(),
                priority: category.base_priority() - (index as i64) * QUERY_INDEX_STEP,
                angle: Some(category.as_str().to_string()),
                meta: json!({
                    "runId": run_id,
                    "topic": plan.topic,
                    "query": query,
                    "type": category,
                    "siteFilters": block.site_filters,
                    "keywords": block.keywords,
                }),
            });
        }
    }
    items
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedingReport {
    pub direct_seeds: usize,
    pub queries: usize,
    pub failed: usize,
}

/// Push seed and query items concurrently. A failed write is logged and
/// counted; the others proceed.
pub async fn seed_frontier_from_plan(
    frontier: &dyn FrontierStore,
    patch_id: &str,
    run_id: &str,
    plan: &DiscoveryPlan,
    timestamp_ms: i64,
) -> SeedingReport {
    let seed_items = build_seed_items(plan, run_id, timestamp_ms);
    let query_items = build_query_items(plan, run_id, timestamp_ms);
    let mut report = SeedingReport {
        direct_seeds: seed_items.len(),
        queries: query_items.len(),
        failed: 0,
    };

    let writes = seed_items.into_iter().chain(query_items).map(|item| async move {
        let id = item.id.clone();
        frontier
            .add_to_frontier(patch_id, item)
            .await
            .map_err(|e| (id, e))
    });

    for result in join_all(writes).await {
        if let Err((id, e)) = result {
            warn!(patch_id, item_id = %id, error = %e, "Failed to add frontier item");
            report.failed += 1;
        }
    }

    info!(
        patch_id,
        run_id,
        direct_seeds = report.direct_seeds,
        queries = report.queries,
        failed = report.failed,
        "Seeded frontier from discovery plan"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{build_fallback_plan, SourceCategory};
    use std::collections::HashSet;

    fn seed(url: &str, stance: Stance, priority: Option<u8>) -> PlannerSeedCandidate {
        PlannerSeedCandidate {
            url: url.to_string(),
            title_guess: None,
            category: SourceCategory::Media,
            stance,
            credibility_tier: Some(2),
            priority,
            quote_pull_hints: Vec::new(),
            verification: Vec::new(),
            novelty_signals: Vec::new(),
            why_it_matters: String::new(),
            is_history: false,
            is_controversy: stance == Stance::Contested,
        }
    }

    #[test]
    fn seven_contested_three_establishment_caps_contested_at_five() {
        let mut candidates: Vec<PlannerSeedCandidate> = (0..7)
            .map(|i| seed(&format!("https://contested{i}.org/a/b"), Stance::Contested, Some(1)))
            .collect();
        candidates.extend(
            (0..3).map(|i| {
                seed(&format!("https://est{i}.org/a/b"), Stance::Establishment, Some(2))
            }),
        );

        let selected = select_seeds(&candidates, 2);
        let contested = selected.iter().filter(|s| s.stance == Stance::Contested).count();
        let establishment = selected.len() - contested;
        assert_eq!(contested, 5);
        assert_eq!(establishment, 3);
        assert!(selected.len() <= MAX_DIRECT_SEEDS);
    }

    #[test]
    fn per_domain_cap_is_enforced() {
        let candidates: Vec<PlannerSeedCandidate> = (0..5)
            .map(|i| seed(&format!("https://www.same.com/story/{i}"), Stance::Establishment, None))
            .chain(std::iter::once(seed("https://same.com/other/x", Stance::Contested, None)))
            .chain(std::iter::once(seed("https://other.com/a/b", Stance::Contested, None)))
            .collect();

        let selected = select_seeds(&candidates, 2);
        let same = selected.iter().filter(|s| s.url.contains("same.com")).count();
        assert_eq!(same, 2);
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn sort_is_by_priority_with_unranked_last() {
        let candidates = vec![
            seed("https://a.org/x/1", Stance::Establishment, None),
            seed("https://b.org/x/1", Stance::Establishment, Some(3)),
            seed("https://c.org/x/1", Stance::Establishment, Some(1)),
            seed("https://d.org/x/1", Stance::Establishment, Some(1)),
        ];
        let order: Vec<&str> = select_seeds(&candidates, 2)
            .iter()
            .map(|s| s.url.as_str())
            .collect();
        assert_eq!(
            order,
            vec!["https://c.org/x/1", "https://d.org/x/1", "https://b.org/x/1", "https://a.org/x/1"]
        );
    }

    #[test]
    fn never_more_than_ten() {
        let candidates: Vec<PlannerSeedCandidate> = (0..30)
            .map(|i| {
                let stance = if i % 2 == 0 { Stance::Contested } else { Stance::Establishment };
                seed(&format!("https://d{i}.net/a/b"), stance, Some(2))
            })
            .collect();
        let selected = select_seeds(&candidates, 2);
        assert_eq!(selected.len(), 10);
    }

    #[test]
    fn seed_items_carry_ids_and_descending_scores() {
        let mut plan = build_fallback_plan("Topic", &[]);
        plan.seed_candidates = vec![
            seed("https://a.org/x/1", Stance::Establishment, Some(1)),
            seed("https://b.org/x/1", Stance::Contested, Some(1)),
        ];
        let items = build_seed_items(&plan, "run-1", 1700000000000);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "direct_seed:1700000000000:0:https://a.org/x/1");
        assert_eq!(items[0].provider, "direct_seed");
        assert_eq!(items[0].cursor, "https://a.org/x/1");
        assert_eq!(items[0].meta["runId"], "run-1");
        assert_eq!(items[1].angle.as_deref(), Some("contested"));
        // index 1 loses 2 points but gains the contested bonus.
        assert_eq!(items[1].priority - items[0].priority, 16);
    }

    #[test]
    fn query_items_follow_type_bases() {
        let mut plan = build_fallback_plan("Topic", &[]);
        plan.content_queries.official = vec!["q1".into(), "q2".into(), "q3".into()];
        plan.content_queries.longform.clear();
        let items = build_query_items(&plan, "run-1", 1);

        let official: Vec<i64> = items
            .iter()
            .filter(|i| i.provider == "query:official")
            .map(|i| i.priority)
            .collect();
        assert_eq!(official, vec![260, 255, 250]);
        assert!(items.iter().all(|i| i.provider != "query:longform"));
        let wiki = items.iter().find(|i| i.provider == "query:wikipedia").unwrap();
        assert_eq!(wiki.priority, 240);
        assert_eq!(wiki.cursor, "Topic");

        let ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), items.len());
    }
}
