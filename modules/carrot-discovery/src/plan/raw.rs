use ai_client::strip_code_blocks;
use serde::Deserialize;
use serde_json::Value;

/// Plan as returned by the model. Every field is optional and untyped so a
/// partially-wrong response still deserializes; `ensure_plan_defaults` decides
/// what survives.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPlan {
    pub topic: Option<Value>,
    pub aliases: Option<Value>,
    pub must_terms: Option<Value>,
    pub should_terms: Option<Value>,
    pub disallow_terms: Option<Value>,
    pub coverage_targets: Option<Value>,
    pub queries: Option<Value>,
    pub content_queries: Option<Value>,
    #[serde(alias = "seeds")]
    pub seed_candidates: Option<Value>,
    pub contested_plan: Option<Value>,
    pub domain_whitelists: Option<Value>,
    pub fetch_rules: Option<Value>,
}

impl RawPlan {
    /// Parse model output: code fences stripped, and when the text is wrapped
    /// in prose, the outermost `{...}` span is tried.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let body = strip_code_blocks(text);
        match serde_json::from_str::<RawPlan>(body) {
            Ok(plan) => Ok(plan),
            Err(first) => match outer_object(body) {
                Some(inner) if inner.len() < body.len() => serde_json::from_str(inner),
                _ => Err(first),
            },
        }
    }
}

fn outer_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSeedCandidate {
    pub url: Option<Value>,
    #[serde(alias = "title")]
    pub title_guess: Option<Value>,
    pub category: Option<Value>,
    pub source_type: Option<Value>,
    pub stance: Option<Value>,
    pub credibility_tier: Option<Value>,
    pub priority: Option<Value>,
    pub quote_pull_hints: Option<Value>,
    pub verification: Option<Value>,
    pub novelty_signals: Option<Value>,
    pub why_it_matters: Option<Value>,
    pub is_history: Option<Value>,
    pub is_controversy: Option<Value>,
}
