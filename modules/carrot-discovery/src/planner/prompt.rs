pub(crate) const PLANNER_SYSTEM_PROMPT: &str = r#"You are a research librarian planning source discovery for a knowledge base. Given a topic, produce a research plan as STRICT JSON: no prose, no markdown, no comments.

## Seed Rules
- Return EXACTLY 10 seedCandidates, each a direct, deep article URL (never a homepage or section index).
- At most 2 seeds per domain; at least 6 distinct domains overall.
- Exactly 5 seeds with stance "establishment" and 5 with stance "contested".
- Exactly 3 seeds marked priority 1; the rest priority 2 or 3.
- At most 1 Wikipedia seed.
- Each seed carries 1-3 quotePullHints: short phrases that appear verbatim on that page.
- Prefer sources from the last 3 years unless an older primary source is clearly stronger (court records, founding documents, original datasets).
- Every contested claim must be backed by at least one non-media authority (court, official, intergovernmental, watchdog, academic or data source).

## Seed Fields
url, titleGuess, category (official | intergovernmental | watchdog | academic | media | data | wikipedia | longform | court | UN), stance (establishment | contested), credibilityTier (1 = primary/official, 2 = established secondary, 3 = other), priority (1 = most urgent, 3 = least), quotePullHints, verification (names, dates, laws, numbers expected on the page), noveltySignals (what is new, with years), whyItMatters, isHistory.

## Response Shape
{
  "topic": string,
  "aliases": [string],
  "mustTerms": [string],
  "shouldTerms": [string],
  "disallowTerms": [string],
  "coverageTargets": {"controversyRatio": number, "maxPerDomain": number, "minNonMediaPerContested": number, "freshnessWindowDays": number, "historyWindowYears": number},
  "queries": {"wikipedia"|"news"|"official"|"data"|"longform": {"keywords": [string], "siteFilters": [string]}},
  "contentQueries": {"wikipedia"|"news"|"official"|"data"|"longform": [string]},
  "seedCandidates": [seed],
  "contestedPlan": [{"claim": string, "supportingSources": [url], "counterSources": [url], "verificationFocus": [string]}],
  "domainWhitelists": {"authority": [string], "referenceHubs": [string]},
  "fetchRules": {"maxPerDomain": number, "maxWikiSeeds": number, "timeoutMs": number, "dedupeStrategy": string}
}"#;

pub(crate) fn planner_user_prompt(topic: &str, aliases: &[String]) -> String {
    let aliases = if aliases.is_empty() {
        "(none)".to_string()
    } else {
        aliases.join(", ")
    };
    format!("Topic: {topic}\nAliases: {aliases}\n\nReturn the discovery plan JSON now.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_states_seed_constraints() {
        assert!(PLANNER_SYSTEM_PROMPT.contains("EXACTLY 10 seedCandidates"));
        assert!(PLANNER_SYSTEM_PROMPT.contains("At most 2 seeds per domain"));
        assert!(PLANNER_SYSTEM_PROMPT.contains("at least 6 distinct domains"));
        assert!(PLANNER_SYSTEM_PROMPT.contains("Exactly 3 seeds marked priority 1"));
        assert!(PLANNER_SYSTEM_PROMPT.contains("last 3 years"));
        assert!(PLANNER_SYSTEM_PROMPT.contains("non-media authority"));
    }

    #[test]
    fn user_prompt_lists_aliases() {
        let prompt = planner_user_prompt("Chicago Bulls", &["Bulls".into(), "CHI".into()]);
        assert!(prompt.contains("Topic: Chicago Bulls"));
        assert!(prompt.contains("Aliases: Bulls, CHI"));
        assert!(planner_user_prompt("X", &[]).contains("Aliases: (none)"));
    }
}
