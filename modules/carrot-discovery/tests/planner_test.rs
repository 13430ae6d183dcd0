//! Planner end to end: scripted model output → normalized plan → plan store
//! + frontier items.

use std::sync::Arc;

use ai_client::{AiError, MessageRole, StreamChunk};
use carrot_discovery::plan::Stance;
use carrot_discovery::store::{MemoryFrontier, MemoryPlanStore};
use carrot_discovery::testing::{model_plan_json, FailingFrontier, FailingPlanStore, MockCompletion};
use carrot_discovery::{validate_planner_plan, Planner};

const PATCH: &str = "patch-bulls";
const RUN: &str = "run-1";

struct Harness {
    completion: Arc<MockCompletion>,
    frontier: Arc<MemoryFrontier>,
    plans: Arc<MemoryPlanStore>,
    planner: Planner,
}

fn harness(completion: MockCompletion) -> Harness {
    let completion = Arc::new(completion);
    let frontier = Arc::new(MemoryFrontier::new());
    let plans = Arc::new(MemoryPlanStore::new());
    let planner = Planner::builder()
        .completion(completion.clone())
        .frontier(frontier.clone())
        .plans(plans.clone())
        .build();
    Harness {
        completion,
        frontier,
        plans,
        planner,
    }
}

#[tokio::test]
async fn model_plan_is_stored_and_seeded() {
    let body = format!("```json\n{}\n```", model_plan_json("Chicago Bulls"));
    let h = harness(MockCompletion::new().on_stream_text(&body));

    let plan = h
        .planner
        .generate_discovery_plan("Chicago Bulls", &[], PATCH, RUN)
        .await
        .unwrap();

    assert_eq!(plan.seed_candidates.len(), 10);
    assert_eq!(plan.contested_plan.len(), 1);
    assert_eq!(plan.fetch_rules.timeout_ms, 20_000);
    assert!(validate_planner_plan(&plan).valid);
    assert_eq!(h.plans.get(RUN), Some(plan.clone()));

    let items = h.frontier.items(PATCH);
    let seeds: Vec<_> = items.iter().filter(|i| i.provider == "direct_seed").collect();
    assert_eq!(seeds.len(), 10);
    assert!(seeds.iter().all(|i| i.id.starts_with("direct_seed:")));
    let contested = seeds
        .iter()
        .filter(|i| i.angle.as_deref() == Some("contested"))
        .count();
    assert_eq!(contested, 5);

    let official: Vec<i64> = items
        .iter()
        .filter(|i| i.provider == "query:official")
        .map(|i| i.priority)
        .collect();
    assert_eq!(official, vec![260, 255]);
    // Buckets the model left out come from the fallback plan.
    assert!(items.iter().any(|i| i.provider == "query:longform"));
}

#[tokio::test]
async fn one_streaming_request_with_topic_and_aliases() {
    let body = model_plan_json("Chicago Bulls").to_string();
    let h = harness(MockCompletion::new().on_stream_text(&body));
    h.planner
        .generate_discovery_plan("Chicago Bulls", &["CHI".to_string()], PATCH, RUN)
        .await
        .unwrap();

    let requests = h.completion.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages[0].role, MessageRole::System);
    assert!(requests[0].messages[1].content.contains("Chicago Bulls"));
    assert!(requests[0].messages[1].content.contains("CHI"));
}

#[tokio::test]
async fn stream_error_falls_back_to_wikipedia_seed() {
    let h = harness(MockCompletion::new().on_stream(vec![
        StreamChunk::Token("{\"topic\":".into()),
        StreamChunk::Error("connection reset".into()),
    ]));

    let plan = h
        .planner
        .generate_discovery_plan("Chicago Bulls", &[], PATCH, RUN)
        .await
        .unwrap();

    assert_eq!(plan.seed_candidates.len(), 1);
    assert_eq!(
        plan.seed_candidates[0].url,
        "https://en.wikipedia.org/wiki/Chicago_Bulls"
    );
    assert_eq!(plan.coverage_targets.controversy_ratio, 0.5);

    let seeds: Vec<_> = h
        .frontier
        .items(PATCH)
        .into_iter()
        .filter(|i| i.provider == "direct_seed")
        .collect();
    assert_eq!(seeds.len(), 1);
}

#[tokio::test]
async fn request_failure_and_garbage_both_fall_back() {
    let h = harness(
        MockCompletion::new()
            .on_stream_error(AiError::Http { status: 500, body: "boom".into() })
            .on_stream_text("I cannot help with that."),
    );

    for run in ["run-a", "run-b"] {
        let plan = h
            .planner
            .generate_discovery_plan("Chicago Bulls", &[], PATCH, run)
            .await
            .unwrap();
        assert_eq!(plan.seed_candidates.len(), 1);
        assert!(h.plans.get(run).is_some());
    }
}

#[tokio::test]
async fn partial_plan_keeps_model_fields_and_defaults_the_rest() {
    let body = serde_json::json!({
        "mustTerms": ["Bulls", "NBA"],
        "coverageTargets": {"controversyRatio": "abc"},
        "seedCandidates": [
            {"url": "https://www.nba.com/bulls/news/story", "stance": "contested", "priority": 2},
            {"titleGuess": "missing url"},
        ],
    });
    let h = harness(MockCompletion::new().on_stream_text(&body.to_string()));
    let plan = h
        .planner
        .generate_discovery_plan("Chicago Bulls", &[], PATCH, RUN)
        .await
        .unwrap();

    assert_eq!(plan.topic, "Chicago Bulls");
    assert_eq!(plan.must_terms, vec!["Bulls", "NBA"]);
    assert_eq!(plan.coverage_targets.controversy_ratio, 0.5);
    assert_eq!(plan.seed_candidates.len(), 1);
    assert_eq!(plan.seed_candidates[0].stance, Stance::Contested);
    assert_eq!(plan.content_queries.wikipedia, vec!["Chicago Bulls"]);
}

#[tokio::test]
async fn failed_frontier_writes_do_not_block_the_rest() {
    let completion = Arc::new(
        MockCompletion::new().on_stream_text(&model_plan_json("Chicago Bulls").to_string()),
    );
    let frontier = Arc::new(FailingFrontier::rejecting(&["reuters.com", "query:news"]));
    let planner = Planner::builder()
        .completion(completion)
        .frontier(frontier.clone())
        .plans(Arc::new(MemoryPlanStore::new()))
        .build();

    planner
        .generate_discovery_plan("Chicago Bulls", &[], PATCH, RUN)
        .await
        .unwrap();

    let items = frontier.inner.items(PATCH);
    assert_eq!(items.iter().filter(|i| i.provider == "direct_seed").count(), 9);
    assert!(items.iter().all(|i| i.provider != "query:news"));
    assert!(items.iter().any(|i| i.provider == "query:official"));
}

#[tokio::test]
async fn plan_store_failure_is_an_error() {
    let completion = Arc::new(MockCompletion::new().on_stream_text("{}"));
    let frontier = Arc::new(MemoryFrontier::new());
    let planner = Planner::builder()
        .completion(completion)
        .frontier(frontier.clone())
        .plans(Arc::new(FailingPlanStore))
        .build();

    let err = planner
        .generate_discovery_plan("Chicago Bulls", &[], PATCH, RUN)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains(RUN));
    assert!(frontier.is_empty());
}
