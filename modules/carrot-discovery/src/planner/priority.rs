use std::sync::LazyLock;

use regex::Regex;

use carrot_common::{host_matches_any, host_of};

use crate::plan::{DomainWhitelists, PlannerSeedCandidate, SourceCategory, Stance};

static RECENT_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"202[3-9]").unwrap());

fn priority_bonus(priority: Option<u8>) -> i64 {
    match priority {
        Some(1) => 320,
        Some(2) => 220,
        Some(3) => 140,
        _ => 0,
    }
}

fn tier_bonus(tier: Option<u8>) -> i64 {
    match tier {
        Some(1) => 40,
        Some(2) => 20,
        Some(3) => 8,
        _ => 0,
    }
}

fn category_bonus(category: SourceCategory) -> i64 {
    match category {
        SourceCategory::Court | SourceCategory::Official => 45,
        SourceCategory::Un | SourceCategory::Intergovernmental => 40,
        SourceCategory::Watchdog | SourceCategory::Academic => 30,
        SourceCategory::Data => 25,
        SourceCategory::Media | SourceCategory::Longform => 10,
        SourceCategory::Wikipedia => 0,
    }
}

/// Frontier priority for the seed at `index` of the priority-sorted
/// selection. Higher is fetched sooner.
pub fn compute_seed_priority(
    seed: &PlannerSeedCandidate,
    index: usize,
    whitelists: &DomainWhitelists,
) -> i64 {
    let mut score = 100 - (index as i64) * 2;
    score += priority_bonus(seed.priority);
    score += tier_bonus(seed.credibility_tier);
    score += category_bonus(seed.category);

    if seed.novelty_signals.iter().any(|s| RECENT_YEAR_RE.is_match(s)) {
        score += 12;
    }
    if seed.stance == Stance::Contested {
        score += 18;
    }
    if seed.is_history {
        score += 6;
    }

    if let Some(host) = host_of(&seed.url) {
        if host_matches_any(&host, &whitelists.authority) {
            score += 14;
        } else if host_matches_any(&host, &whitelists.reference_hubs) {
            score += 8;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelists() -> DomainWhitelists {
        DomainWhitelists {
            authority: vec![".gov".into(), "un.org".into()],
            reference_hubs: vec!["wikipedia.org".into()],
        }
    }

    fn seed(url: &str) -> PlannerSeedCandidate {
        PlannerSeedCandidate {
            url: url.to_string(),
            title_guess: None,
            category: SourceCategory::Media,
            stance: Stance::Establishment,
            credibility_tier: None,
            priority: None,
            quote_pull_hints: Vec::new(),
            verification: Vec::new(),
            novelty_signals: Vec::new(),
            why_it_matters: String::new(),
            is_history: false,
            is_controversy: false,
        }
    }

    #[test]
    fn bare_media_seed_scores_base_plus_category() {
        let s = seed("https://example.com/a/b");
        assert_eq!(compute_seed_priority(&s, 0, &whitelists()), 110);
        assert_eq!(compute_seed_priority(&s, 3, &whitelists()), 104);
    }

    #[test]
    fn full_bonus_stack() {
        let mut s = seed("https://www.justice.gov/opa/pr/case-2024");
        s.priority = Some(1);
        s.credibility_tier = Some(1);
        s.category = SourceCategory::Court;
        s.novelty_signals = vec!["filed March 2024".into()];
        s.stance = Stance::Contested;
        s.is_history = true;
        // 100 + 320 + 40 + 45 + 12 + 18 + 6 + 14
        assert_eq!(compute_seed_priority(&s, 0, &whitelists()), 555);
    }

    #[test]
    fn reference_hub_bonus_only_without_authority() {
        let mut s = seed("https://en.wikipedia.org/wiki/Topic");
        s.category = SourceCategory::Wikipedia;
        s.priority = Some(3);
        s.credibility_tier = Some(2);
        // 100 + 140 + 20 + 0 + 8
        assert_eq!(compute_seed_priority(&s, 0, &whitelists()), 268);
    }

    #[test]
    fn old_years_do_not_count_as_novel() {
        let mut s = seed("https://example.com/a/b");
        s.novelty_signals = vec!["2019 report".into(), "2022 follow-up".into()];
        assert_eq!(compute_seed_priority(&s, 0, &whitelists()), 110);
    }

    #[test]
    fn urgent_seed_outranks_earlier_index() {
        let mut urgent = seed("https://example.com/a/b");
        urgent.priority = Some(1);
        let mut later = seed("https://example.com/a/c");
        later.priority = Some(2);
        assert!(
            compute_seed_priority(&urgent, 5, &whitelists())
                > compute_seed_priority(&later, 0, &whitelists())
        );
    }
}
