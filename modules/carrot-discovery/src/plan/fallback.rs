use url::Url;

use super::{
    ContentQueries, CoverageTargets, DiscoveryPlan, DomainWhitelists, FetchRules, PlanQueries,
    PlannerSeedCandidate, QueryBlock, SourceCategory, Stance,
};

const AUTHORITY_SUFFIXES: &[&str] = &[
    ".gov",
    ".mil",
    ".int",
    "un.org",
    "who.int",
    "europa.eu",
    "oecd.org",
    "worldbank.org",
    "supremecourt.gov",
    "uscourts.gov",
    "courtlistener.com",
];

const REFERENCE_HUB_SUFFIXES: &[&str] = &[
    "wikipedia.org",
    "britannica.com",
    "archive.org",
    "jstor.org",
    "pewresearch.org",
    "ourworldindata.org",
    "data.gov",
];

/// `https://en.wikipedia.org/wiki/<Title_With_Underscores>`.
pub fn wikipedia_url(topic: &str) -> String {
    let slug = topic.split_whitespace().collect::<Vec<_>>().join("_");
    let mut url = match Url::parse("https://en.wikipedia.org/wiki/") {
        Ok(url) => url,
        Err(_) => return format!("https://en.wikipedia.org/wiki/{slug}"),
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(&slug);
    }
    url.to_string()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Deterministic plan built from the topic alone. Used whole when the model
/// call fails and field-by-field as the default for partial responses.
pub fn build_fallback_plan(topic: &str, aliases: &[String]) -> DiscoveryPlan {
    let topic = topic.trim().to_string();

    let seed = PlannerSeedCandidate {
        url: wikipedia_url(&topic),
        title_guess: Some(topic.clone()),
        category: SourceCategory::Wikipedia,
        stance: Stance::Establishment,
        credibility_tier: Some(2),
        priority: Some(1),
        quote_pull_hints: vec![topic.clone()],
        verification: vec![topic.clone()],
        novelty_signals: Vec::new(),
        why_it_matters: format!("Baseline encyclopedic overview of {topic}"),
        is_history: false,
        is_controversy: false,
    };

    let mut must_terms = vec![topic.clone()];
    must_terms.extend(aliases.iter().cloned());

    let block = |keywords: Vec<String>, site_filters: &[&str]| QueryBlock {
        keywords,
        site_filters: owned(site_filters),
    };

    DiscoveryPlan {
        topic: topic.clone(),
        aliases: aliases.to_vec(),
        must_terms,
        should_terms: Vec::new(),
        disallow_terms: Vec::new(),
        coverage_targets: CoverageTargets::default(),
        queries: PlanQueries {
            wikipedia: block(vec![topic.clone()], &["wikipedia.org"]),
            news: block(vec![format!("{topic} news")], &[]),
            official: block(vec![format!("{topic} official statement")], &[".gov"]),
            data: block(vec![format!("{topic} statistics")], &[]),
            longform: block(vec![format!("{topic} analysis")], &[]),
        },
        content_queries: ContentQueries {
            wikipedia: vec![topic.clone()],
            news: vec![format!("{topic} latest news")],
            official: vec![format!("{topic} official site")],
            data: vec![format!("{topic} data statistics")],
            longform: vec![format!("{topic} in-depth analysis")],
        },
        seed_candidates: vec![seed],
        contested_plan: Vec::new(),
        domain_whitelists: DomainWhitelists {
            authority: owned(AUTHORITY_SUFFIXES),
            reference_hubs: owned(REFERENCE_HUB_SUFFIXES),
        },
        fetch_rules: FetchRules::default(),
    }
}
