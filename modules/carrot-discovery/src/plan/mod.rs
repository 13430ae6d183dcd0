//! Discovery plan data model.
//!
//! `raw` holds the loosely-typed shapes the model returns; `normalize` is the
//! only bridge from those into the validated types below.

pub mod fallback;
pub mod normalize;
pub mod raw;

pub use fallback::build_fallback_plan;
pub use normalize::{ensure_plan_defaults, normalize_seed_candidate, SeedRejection};
pub use raw::{RawPlan, RawSeedCandidate};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    Official,
    Intergovernmental,
    Watchdog,
    Academic,
    Media,
    Data,
    Wikipedia,
    Longform,
    Court,
    #[serde(rename = "UN")]
    Un,
}

impl SourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceCategory::Official => "official",
            SourceCategory::Intergovernmental => "intergovernmental",
            SourceCategory::Watchdog => "watchdog",
            SourceCategory::Academic => "academic",
            SourceCategory::Media => "media",
            SourceCategory::Data => "data",
            SourceCategory::Wikipedia => "wikipedia",
            SourceCategory::Longform => "longform",
            SourceCategory::Court => "court",
            SourceCategory::Un => "UN",
        }
    }

    /// Map a category name or a free-form `sourceType` label.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase().replace(['-', ' '], "_");
        let category = match label.as_str() {
            "official" | "government" | "gov" | "agency" | "regulator" | "ministry"
            | "primary" | "primary_source" => SourceCategory::Official,
            "intergovernmental" | "igo" | "multilateral" | "international_organization" => {
                SourceCategory::Intergovernmental
            }
            "un" | "united_nations" => SourceCategory::Un,
            "watchdog" | "ngo" | "nonprofit" | "advocacy" | "think_tank" | "thinktank" => {
                SourceCategory::Watchdog
            }
            "academic" | "university" | "journal" | "research" | "paper" | "study" => {
                SourceCategory::Academic
            }
            "media" | "news" | "newspaper" | "wire" | "outlet" | "broadcast" | "press" => {
                SourceCategory::Media
            }
            "data" | "dataset" | "statistics" | "stats" | "database" => SourceCategory::Data,
            "wikipedia" | "wiki" | "encyclopedia" | "reference" => SourceCategory::Wikipedia,
            "longform" | "long_form" | "magazine" | "feature" | "analysis" | "essay"
            | "investigation" => SourceCategory::Longform,
            "court" | "legal" | "judicial" | "filing" | "court_record" | "ruling" => {
                SourceCategory::Court
            }
            _ => return None,
        };
        Some(category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Establishment,
    Contested,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Establishment => "establishment",
            Stance::Contested => "contested",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "establishment" | "mainstream" | "consensus" | "official" => {
                Some(Stance::Establishment)
            }
            "contested" | "counter" | "controversial" | "dissent" | "critical" | "contrarian" => {
                Some(Stance::Contested)
            }
            _ => None,
        }
    }
}

/// Search buckets used for query fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Wikipedia,
    News,
    Official,
    Data,
    Longform,
}

impl QueryCategory {
    pub const ALL: [QueryCategory; 5] = [
        QueryCategory::Official,
        QueryCategory::Wikipedia,
        QueryCategory::Data,
        QueryCategory::News,
        QueryCategory::Longform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryCategory::Wikipedia => "wikipedia",
            QueryCategory::News => "news",
            QueryCategory::Official => "official",
            QueryCategory::Data => "data",
            QueryCategory::Longform => "longform",
        }
    }

    /// Frontier priority of the first query in the bucket.
    pub fn base_priority(&self) -> i64 {
        match self {
            QueryCategory::Official => 260,
            QueryCategory::Wikipedia => 240,
            QueryCategory::Data => 220,
            QueryCategory::News => 210,
            QueryCategory::Longform => 200,
        }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageTargets {
    /// Target fraction of contested seeds.
    pub controversy_ratio: f64,
    pub max_per_domain: u32,
    pub min_non_media_per_contested: u32,
    pub freshness_window_days: u32,
    pub history_window_years: u32,
}

impl Default for CoverageTargets {
    fn default() -> Self {
        Self {
            controversy_ratio: 0.5,
            max_per_domain: 2,
            min_non_media_per_contested: 1,
            freshness_window_days: 1095,
            history_window_years: 25,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBlock {
    pub keywords: Vec<String>,
    pub site_filters: Vec<String>,
}

impl QueryBlock {
    pub fn is_populated(&self) -> bool {
        !self.keywords.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanQueries {
    pub wikipedia: QueryBlock,
    pub news: QueryBlock,
    pub official: QueryBlock,
    pub data: QueryBlock,
    pub longform: QueryBlock,
}

impl PlanQueries {
    pub fn block(&self, category: QueryCategory) -> &QueryBlock {
        match category {
            QueryCategory::Wikipedia => &self.wikipedia,
            QueryCategory::News => &self.news,
            QueryCategory::Official => &self.official,
            QueryCategory::Data => &self.data,
            QueryCategory::Longform => &self.longform,
        }
    }

    pub fn block_mut(&mut self, category: QueryCategory) -> &mut QueryBlock {
        match category {
            QueryCategory::Wikipedia => &mut self.wikipedia,
            QueryCategory::News => &mut self.news,
            QueryCategory::Official => &mut self.official,
            QueryCategory::Data => &mut self.data,
            QueryCategory::Longform => &mut self.longform,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentQueries {
    pub wikipedia: Vec<String>,
    pub news: Vec<String>,
    pub official: Vec<String>,
    pub data: Vec<String>,
    pub longform: Vec<String>,
}

impl ContentQueries {
    pub fn bucket(&self, category: QueryCategory) -> &[String] {
        match category {
            QueryCategory::Wikipedia => &self.wikipedia,
            QueryCategory::News => &self.news,
            QueryCategory::Official => &self.official,
            QueryCategory::Data => &self.data,
            QueryCategory::Longform => &self.longform,
        }
    }

    pub fn bucket_mut(&mut self, category: QueryCategory) -> &mut Vec<String> {
        match category {
            QueryCategory::Wikipedia => &mut self.wikipedia,
            QueryCategory::News => &mut self.news,
            QueryCategory::Official => &mut self.official,
            QueryCategory::Data => &mut self.data,
            QueryCategory::Longform => &mut self.longform,
        }
    }

    pub fn is_empty(&self) -> bool {
        QueryCategory::ALL.iter().all(|c| self.bucket(*c).is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerSeedCandidate {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_guess: Option<String>,
    pub category: SourceCategory,
    pub stance: Stance,
    /// 1 = highest trust.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credibility_tier: Option<u8>,
    /// 1 = most urgent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    pub quote_pull_hints: Vec<String>,
    pub verification: Vec<String>,
    pub novelty_signals: Vec<String>,
    pub why_it_matters: String,
    pub is_history: bool,
    pub is_controversy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestedClaimPlan {
    pub claim: String,
    pub supporting_sources: Vec<String>,
    pub counter_sources: Vec<String>,
    pub verification_focus: Vec<String>,
}

/// Hostname suffixes that earn a seed a priority bonus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainWhitelists {
    pub authority: Vec<String>,
    pub reference_hubs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRules {
    pub max_per_domain: u32,
    pub max_wiki_seeds: u32,
    pub timeout_ms: u64,
    pub dedupe_strategy: String,
}

impl Default for FetchRules {
    fn default() -> Self {
        Self {
            max_per_domain: 2,
            max_wiki_seeds: 1,
            timeout_ms: 15_000,
            dedupe_strategy: "canonical_url".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryPlan {
    pub topic: String,
    pub aliases: Vec<String>,
    pub must_terms: Vec<String>,
    pub should_terms: Vec<String>,
    pub disallow_terms: Vec<String>,
    pub coverage_targets: CoverageTargets,
    pub queries: PlanQueries,
    pub content_queries: ContentQueries,
    pub seed_candidates: Vec<PlannerSeedCandidate>,
    pub contested_plan: Vec<ContestedClaimPlan>,
    pub domain_whitelists: DomainWhitelists,
    pub fetch_rules: FetchRules,
}
