//! Field-by-field normalization of model plans against the fallback plan.

use serde_json::{Map, Value};
use tracing::warn;

use carrot_common::{host_of, is_http_url, is_wikipedia_host};

use super::raw::{RawPlan, RawSeedCandidate};
use super::{
    ContentQueries, ContestedClaimPlan, CoverageTargets, DiscoveryPlan, DomainWhitelists,
    FetchRules, PlanQueries, PlannerSeedCandidate, QueryBlock, QueryCategory, SourceCategory,
    Stance,
};

const MAX_QUOTE_HINTS: usize = 3;
const HISTORY_MARKERS: &[&str] = &[
    "history",
    "historical",
    "archive",
    "archival",
    "founded",
    "origin",
    "timeline",
    "decades",
];

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

pub(crate) fn trimmed(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Arrays keep their non-empty string entries; a lone string becomes a
/// one-element list. Anything else is malformed.
pub(crate) fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::Array(items) => Some(items.iter().filter_map(trimmed).collect()),
        single @ Value::String(_) => Some(trimmed(single).into_iter().collect()),
        _ => None,
    }
}

/// Numeric coercion in the spirit of `Number(x)`: numbers, numeric strings
/// and booleans convert; everything else (and non-finite results) is absent.
pub(crate) fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().ok()?
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn coerce_u32(value: Option<&Value>) -> Option<u32> {
    coerce_number(value)
        .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.round() as u32)
}

fn coerce_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}

/// 1..=3 scale used by `priority` and `credibilityTier`.
fn coerce_rank(value: Option<&Value>) -> Option<u8> {
    coerce_number(value)
        .map(f64::round)
        .filter(|n| (1.0..=3.0).contains(n))
        .map(|n| n as u8)
}

fn field<'a>(object: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    object.get(camel).or_else(|| object.get(snake))
}

fn dedup_case_insensitive(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}

// ---------------------------------------------------------------------------
// Seed candidates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedRejection {
    NotAnObject,
    MissingUrl,
    InvalidUrl,
}

impl SeedRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedRejection::NotAnObject => "not_an_object",
            SeedRejection::MissingUrl => "missing_url",
            SeedRejection::InvalidUrl => "invalid_url",
        }
    }
}

pub fn normalize_seed_candidate(raw: &Value) -> Result<PlannerSeedCandidate, SeedRejection> {
    if !raw.is_object() {
        return Err(SeedRejection::NotAnObject);
    }
    let raw: RawSeedCandidate =
        serde_json::from_value(raw.clone()).map_err(|_| SeedRejection::NotAnObject)?;

    let url = raw
        .url
        .as_ref()
        .and_then(trimmed)
        .ok_or(SeedRejection::MissingUrl)?;
    if !is_http_url(&url) {
        return Err(SeedRejection::InvalidUrl);
    }
    let host = host_of(&url).unwrap_or_default();

    let category = raw
        .category
        .as_ref()
        .and_then(trimmed)
        .and_then(|c| SourceCategory::from_label(&c))
        .or_else(|| {
            raw.source_type
                .as_ref()
                .and_then(trimmed)
                .and_then(|t| SourceCategory::from_label(&t))
        })
        .unwrap_or(if is_wikipedia_host(&host) {
            SourceCategory::Wikipedia
        } else {
            SourceCategory::Media
        });

    let stance = raw
        .stance
        .as_ref()
        .and_then(trimmed)
        .and_then(|s| Stance::from_label(&s))
        .unwrap_or_else(|| match coerce_bool(raw.is_controversy.as_ref()) {
            Some(true) => Stance::Contested,
            _ => Stance::Establishment,
        });

    let why_it_matters = raw
        .why_it_matters
        .as_ref()
        .and_then(trimmed)
        .unwrap_or_default();

    let is_history = coerce_bool(raw.is_history.as_ref()).unwrap_or_else(|| {
        let why = why_it_matters.to_lowercase();
        HISTORY_MARKERS.iter().any(|m| why.contains(m))
    });

    let mut quote_pull_hints = string_list(raw.quote_pull_hints.as_ref()).unwrap_or_default();
    quote_pull_hints.truncate(MAX_QUOTE_HINTS);

    Ok(PlannerSeedCandidate {
        url,
        title_guess: raw.title_guess.as_ref().and_then(trimmed),
        category,
        stance,
        credibility_tier: coerce_rank(raw.credibility_tier.as_ref()),
        priority: coerce_rank(raw.priority.as_ref()),
        quote_pull_hints,
        verification: string_list(raw.verification.as_ref()).unwrap_or_default(),
        novelty_signals: string_list(raw.novelty_signals.as_ref()).unwrap_or_default(),
        why_it_matters,
        is_history,
        is_controversy: stance == Stance::Contested,
    })
}

fn normalize_seeds(
    raw: Option<&Value>,
    fallback: &[PlannerSeedCandidate],
) -> Vec<PlannerSeedCandidate> {
    let Some(Value::Array(items)) = raw else {
        return fallback.to_vec();
    };

    let seeds: Vec<PlannerSeedCandidate> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match normalize_seed_candidate(item) {
            Ok(seed) => Some(seed),
            Err(reason) => {
                warn!(index, reason = reason.as_str(), "Dropping malformed seed candidate");
                None
            }
        })
        .collect();

    if seeds.is_empty() {
        warn!("No usable seed candidates in model plan, using fallback seeds");
        return fallback.to_vec();
    }
    seeds
}

// ---------------------------------------------------------------------------
// Nested sections
// ---------------------------------------------------------------------------

fn normalize_coverage(raw: Option<&Value>, fallback: &CoverageTargets) -> CoverageTargets {
    let Some(Value::Object(obj)) = raw else {
        return fallback.clone();
    };
    CoverageTargets {
        controversy_ratio: coerce_number(field(obj, "controversyRatio", "controversy_ratio"))
            .filter(|r| (0.0..=1.0).contains(r))
            .unwrap_or(fallback.controversy_ratio),
        max_per_domain: coerce_u32(field(obj, "maxPerDomain", "max_per_domain"))
            .filter(|n| *n >= 1)
            .unwrap_or(fallback.max_per_domain),
        min_non_media_per_contested: coerce_u32(field(
            obj,
            "minNonMediaPerContested",
            "min_non_media_per_contested",
        ))
        .unwrap_or(fallback.min_non_media_per_contested),
        freshness_window_days: coerce_u32(field(
            obj,
            "freshnessWindowDays",
            "freshness_window_days",
        ))
        .unwrap_or(fallback.freshness_window_days),
        history_window_years: coerce_u32(field(obj, "historyWindowYears", "history_window_years"))
            .unwrap_or(fallback.history_window_years),
    }
}

fn normalize_query_block(raw: Option<&Value>, fallback: &QueryBlock) -> QueryBlock {
    match raw {
        Some(Value::Object(obj)) => QueryBlock {
            keywords: string_list(obj.get("keywords"))
                .unwrap_or_else(|| fallback.keywords.clone()),
            site_filters: string_list(field(obj, "siteFilters", "site_filters"))
                .unwrap_or_else(|| fallback.site_filters.clone()),
        },
        Some(value @ Value::Array(_)) => QueryBlock {
            keywords: string_list(Some(value)).unwrap_or_default(),
            site_filters: fallback.site_filters.clone(),
        },
        _ => fallback.clone(),
    }
}

fn normalize_queries(raw: Option<&Value>, fallback: &PlanQueries) -> PlanQueries {
    let Some(Value::Object(obj)) = raw else {
        return fallback.clone();
    };
    let mut queries = PlanQueries::default();
    for category in QueryCategory::ALL {
        *queries.block_mut(category) =
            normalize_query_block(obj.get(category.as_str()), fallback.block(category));
    }
    queries
}

fn normalize_content_queries(raw: Option<&Value>, fallback: &ContentQueries) -> ContentQueries {
    let Some(Value::Object(obj)) = raw else {
        return fallback.clone();
    };
    let mut content = ContentQueries::default();
    for category in QueryCategory::ALL {
        *content.bucket_mut(category) = string_list(obj.get(category.as_str()))
            .map(dedup_case_insensitive)
            .unwrap_or_else(|| fallback.bucket(category).to_vec());
    }
    content
}

fn url_list(value: Option<&Value>) -> Vec<String> {
    string_list(value)
        .unwrap_or_default()
        .into_iter()
        .filter(|u| is_http_url(u))
        .collect()
}

fn normalize_contested(
    raw: Option<&Value>,
    fallback: &[ContestedClaimPlan],
) -> Vec<ContestedClaimPlan> {
    let Some(Value::Array(items)) = raw else {
        return fallback.to_vec();
    };
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let claim = obj.get("claim").and_then(trimmed)?;
            let supporting_sources =
                url_list(field(obj, "supportingSources", "supporting_sources"));
            let counter_sources = url_list(field(obj, "counterSources", "counter_sources"));
            if supporting_sources.is_empty() || counter_sources.is_empty() {
                return None;
            }
            Some(ContestedClaimPlan {
                claim,
                supporting_sources,
                counter_sources,
                verification_focus: string_list(field(
                    obj,
                    "verificationFocus",
                    "verification_focus",
                ))
                .unwrap_or_default(),
            })
        })
        .collect()
}

fn normalize_whitelists(raw: Option<&Value>, fallback: &DomainWhitelists) -> DomainWhitelists {
    let Some(Value::Object(obj)) = raw else {
        return fallback.clone();
    };
    DomainWhitelists {
        authority: string_list(obj.get("authority"))
            .unwrap_or_else(|| fallback.authority.clone()),
        reference_hubs: string_list(field(obj, "referenceHubs", "reference_hubs"))
            .unwrap_or_else(|| fallback.reference_hubs.clone()),
    }
}

fn normalize_fetch_rules(raw: Option<&Value>, fallback: &FetchRules) -> FetchRules {
    let Some(Value::Object(obj)) = raw else {
        return fallback.clone();
    };
    FetchRules {
        max_per_domain: coerce_u32(field(obj, "maxPerDomain", "max_per_domain"))
            .filter(|n| *n >= 1)
            .unwrap_or(fallback.max_per_domain),
        max_wiki_seeds: coerce_u32(field(obj, "maxWikiSeeds", "max_wiki_seeds"))
            .unwrap_or(fallback.max_wiki_seeds),
        timeout_ms: coerce_number(field(obj, "timeoutMs", "timeout_ms"))
            .filter(|n| *n > 0.0)
            .map(|n| n.round() as u64)
            .unwrap_or(fallback.timeout_ms),
        dedupe_strategy: field(obj, "dedupeStrategy", "dedupe_strategy")
            .and_then(trimmed)
            .unwrap_or_else(|| fallback.dedupe_strategy.clone()),
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Replace every absent or malformed field of `raw` with the corresponding
/// field of `fallback`. Caller-supplied aliases (carried by the fallback) are
/// always kept.
pub fn ensure_plan_defaults(raw: RawPlan, fallback: &DiscoveryPlan) -> DiscoveryPlan {
    let list_or = |value: &Option<Value>, default: &[String]| {
        string_list(value.as_ref()).unwrap_or_else(|| default.to_vec())
    };

    let aliases = dedup_case_insensitive(
        fallback
            .aliases
            .iter()
            .cloned()
            .chain(string_list(raw.aliases.as_ref()).unwrap_or_default()),
    );

    DiscoveryPlan {
        topic: raw
            .topic
            .as_ref()
            .and_then(trimmed)
            .unwrap_or_else(|| fallback.topic.clone()),
        aliases,
        must_terms: list_or(&raw.must_terms, &fallback.must_terms),
        should_terms: list_or(&raw.should_terms, &fallback.should_terms),
        disallow_terms: list_or(&raw.disallow_terms, &fallback.disallow_terms),
        coverage_targets: normalize_coverage(
            raw.coverage_targets.as_ref(),
            &fallback.coverage_targets,
        ),
        queries: normalize_queries(raw.queries.as_ref(), &fallback.queries),
        content_queries: normalize_content_queries(
            raw.content_queries.as_ref(),
            &fallback.content_queries,
        ),
        seed_candidates: normalize_seeds(raw.seed_candidates.as_ref(), &fallback.seed_candidates),
        contested_plan: normalize_contested(raw.contested_plan.as_ref(), &fallback.contested_plan),
        domain_whitelists: normalize_whitelists(
            raw.domain_whitelists.as_ref(),
            &fallback.domain_whitelists,
        ),
        fetch_rules: normalize_fetch_rules(raw.fetch_rules.as_ref(), &fallback.fetch_rules),
    }
}
