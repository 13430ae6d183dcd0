// Test mocks for the discovery pipeline.
//
// - MockCompletion (CompletionService): scripted stream/complete replies,
//   records every request it receives
// - FailingFrontier (FrontierStore): wraps MemoryFrontier, rejects chosen ids
// - FailingPlanStore (PlanStore): always errors
//
// Plus helpers for building seed candidates and model plan JSON.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use ai_client::{
    AiError, ChunkStream, CompletionRequest, CompletionResponse, CompletionService, StreamChunk,
};

use crate::plan::{DiscoveryPlan, PlannerSeedCandidate, SourceCategory, Stance};
use crate::store::MemoryFrontier;
use crate::traits::{FrontierItem, FrontierStore, PlanStore};

// ---------------------------------------------------------------------------
// MockCompletion
// ---------------------------------------------------------------------------

/// Replies are consumed in order; an unscripted call is a network error.
/// Builder pattern: `.on_stream()`, `.on_stream_text()`, `.on_complete()`.
#[derive(Default)]
pub struct MockCompletion {
    streams: Mutex<VecDeque<Result<Vec<StreamChunk>, AiError>>>,
    completions: Mutex<VecDeque<Result<CompletionResponse, AiError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_stream(self, chunks: Vec<StreamChunk>) -> Self {
        self.streams.lock().unwrap().push_back(Ok(chunks));
        self
    }

    /// Stream `text` in small token chunks followed by `Done`.
    pub fn on_stream_text(self, text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks: Vec<StreamChunk> = chars
            .chunks(16)
            .map(|c| StreamChunk::Token(c.iter().collect()))
            .collect();
        chunks.push(StreamChunk::Done);
        self.on_stream(chunks)
    }

    pub fn on_stream_error(self, error: AiError) -> Self {
        self.streams.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn on_complete(self, content: Option<&str>) -> Self {
        self.completions.lock().unwrap().push_back(Ok(CompletionResponse {
            content: content.map(str::to_string),
            finish_reason: Some("stop".to_string()),
        }));
        self
    }

    pub fn on_complete_json(self, value: Value) -> Self {
        self.on_complete(Some(value.to_string().as_str()))
    }

    pub fn on_complete_error(self, error: AiError) -> Self {
        self.completions.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AiError> {
        self.requests.lock().unwrap().push(request);
        self.completions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(AiError::Network("MockCompletion: no scripted completion".into()))
            })
    }

    async fn stream(&self, request: CompletionRequest) -> Result<ChunkStream, AiError> {
        self.requests.lock().unwrap().push(request);
        let chunks = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Network("MockCompletion: no scripted stream".into())))?;
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

// ---------------------------------------------------------------------------
// Failing stores
// ---------------------------------------------------------------------------

/// Rejects items whose id contains any of the given fragments; everything
/// else lands in the inner [`MemoryFrontier`].
pub struct FailingFrontier {
    pub inner: MemoryFrontier,
    reject: Vec<String>,
}

impl FailingFrontier {
    pub fn rejecting(fragments: &[&str]) -> Self {
        Self {
            inner: MemoryFrontier::new(),
            reject: fragments.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl FrontierStore for FailingFrontier {
    async fn add_to_frontier(&self, patch_id: &str, item: FrontierItem) -> Result<()> {
        if self.reject.iter().any(|r| item.id.contains(r.as_str())) {
            bail!("FailingFrontier: rejected {}", item.id);
        }
        self.inner.add_to_frontier(patch_id, item).await
    }
}

pub struct FailingPlanStore;

#[async_trait]
impl PlanStore for FailingPlanStore {
    async fn store_discovery_plan(&self, run_id: &str, _plan: &DiscoveryPlan) -> Result<()> {
        bail!("FailingPlanStore: cannot store plan for {run_id}")
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn seed_candidate(url: &str, stance: Stance, priority: Option<u8>) -> PlannerSeedCandidate {
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

/// A well-formed model plan: ten deep seeds on ten domains, 5/5 stance split,
/// three urgent, one Wikipedia seed.
pub fn model_plan_json(topic: &str) -> Value {
    let seeds: Vec<Value> = [
        ("https://en.wikipedia.org/wiki/Chicago_Bulls", "wikipedia", "establishment", 1),
        ("https://www.nba.com/bulls/news/2024-season-recap", "official", "establishment", 1),
        ("https://www.reuters.com/sports/basketball/bulls-sale-2024", "media", "establishment", 2),
        ("https://www.chicago.gov/city/en/depts/dcd/arena-2023", "official", "establishment", 2),
        ("https://www.census.gov/data/tables/chicago-2024", "data", "establishment", 3),
        ("https://www.propublica.org/article/united-center-tax-breaks", "watchdog", "contested", 1),
        ("https://www.courtlistener.com/opinion/12345/bulls-v-city/", "court", "contested", 2),
        ("https://www.chicagoreader.com/news/arena-subsidy-fight", "media", "contested", 2),
        ("https://papers.ssrn.com/sol3/papers-cfm-abstract-4012345", "academic", "contested", 3),
        (
            "https://www.theatlantic.com/ideas/archive/2024/03/stadium-deals/",
            "longform",
            "contested",
            3,
        ),
    ]
    .iter()
    .map(|(url, category, stance, priority)| {
        json!({
            "url": url,
            "titleGuess": format!("{topic} source"),
            "category": category,
            "stance": stance,
            "credibilityTier": 2,
            "priority": priority,
            "quotePullHints": [topic],
            "verification": ["1966"],
            "noveltySignals": ["2024 season"],
            "whyItMatters": format!("Covers {topic}"),
        })
    })
    .collect();

    json!({
        "topic": topic,
        "aliases": ["Bulls"],
        "mustTerms": [topic],
        "shouldTerms": ["United Center"],
        "disallowTerms": ["fantasy"],
        "coverageTargets": {"controversyRatio": 0.5, "maxPerDomain": 2},
        "queries": {
            "news": {"keywords": [format!("{topic} news")], "siteFilters": ["reuters.com"]},
            "official": {"keywords": [format!("{topic} filing")], "siteFilters": [".gov"]},
        },
        "contentQueries": {
            "official": [format!("{topic} arena lease"), format!("{topic} city council")],
            "news": [format!("{topic} ownership")],
        },
        "seedCandidates": seeds,
        "contestedPlan": [{
            "claim": "The arena lease shortchanged taxpayers",
            "supportingSources": ["https://www.propublica.org/article/united-center-tax-breaks"],
            "counterSources": ["https://www.chicago.gov/city/en/depts/dcd/arena-2023"],
            "verificationFocus": ["lease terms"],
        }],
        "fetchRules": {"maxWikiSeeds": 1, "timeoutMs": 20000},
    })
}
