use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::plan::normalize::{coerce_number, trimmed};

// ---------------------------------------------------------------------------
// Validated result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VetterFact {
    pub label: String,
    pub value: String,
    pub citation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VetterQuote {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub citation: String,
}

/// How the source engages with a contested claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestedNote {
    pub note: String,
    pub supporting: String,
    pub counter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<String>,
}

/// Verdict for one source. Built fresh per vetting call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VetterResult {
    pub is_useful: bool,
    /// 0.0 ..= 1.0
    pub relevance_score: f64,
    /// 0.0 ..= 100.0
    pub quality_score: f64,
    pub why_it_matters: String,
    pub facts: Vec<VetterFact>,
    pub quotes: Vec<VetterQuote>,
    pub provenance: Vec<String>,
    pub contested: Option<ContestedNote>,
}

// ---------------------------------------------------------------------------
// Raw model output
// ---------------------------------------------------------------------------

/// Vetter response as returned by the model; `normalize_vetter_result` is the
/// only way to a [`VetterResult`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawVetterResult {
    pub is_useful: Option<Value>,
    pub relevance_score: Option<Value>,
    pub quality_score: Option<Value>,
    pub why_it_matters: Option<Value>,
    pub facts: Option<Value>,
    pub quotes: Option<Value>,
    pub provenance: Option<Value>,
    pub contested: Option<Value>,
}

fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(trimmed)
}

fn entries(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items,
        _ => &[],
    }
}

fn normalize_fact(value: &Value) -> Option<VetterFact> {
    let obj = value.as_object()?;
    Some(VetterFact {
        label: string_field(obj, "label")?,
        value: string_field(obj, "value")?,
        citation: string_field(obj, "citation")?,
    })
}

fn normalize_quote(value: &Value) -> Option<VetterQuote> {
    let obj = value.as_object()?;
    Some(VetterQuote {
        text: string_field(obj, "text")?,
        speaker: string_field(obj, "speaker"),
        citation: string_field(obj, "citation")?,
    })
}

fn normalize_contested(value: Option<&Value>) -> Option<ContestedNote> {
    let obj = value?.as_object()?;
    Some(ContestedNote {
        note: string_field(obj, "note")?,
        supporting: string_field(obj, "supporting").unwrap_or_default(),
        counter: string_field(obj, "counter").unwrap_or_default(),
        claim: string_field(obj, "claim"),
    })
}

fn score(value: Option<&Value>, max: f64) -> f64 {
    coerce_number(value).map(|n| n.clamp(0.0, max)).unwrap_or(0.0)
}

/// Rebuild every field, dropping entries that miss a required field.
/// Provenance falls back to the source URL.
pub fn normalize_vetter_result(raw: RawVetterResult, source_url: &str) -> VetterResult {
    let provenance: Vec<String> = entries(raw.provenance.as_ref())
        .iter()
        .filter_map(trimmed)
        .collect();
    let provenance = if provenance.is_empty() {
        vec![source_url.to_string()]
    } else {
        provenance
    };

    VetterResult {
        is_useful: !matches!(raw.is_useful, Some(Value::Bool(false))),
        relevance_score: score(raw.relevance_score.as_ref(), 1.0),
        quality_score: score(raw.quality_score.as_ref(), 100.0),
        why_it_matters: raw
            .why_it_matters
            .as_ref()
            .and_then(trimmed)
            .unwrap_or_default(),
        facts: entries(raw.facts.as_ref())
            .iter()
            .filter_map(normalize_fact)
            .collect(),
        quotes: entries(raw.quotes.as_ref())
            .iter()
            .filter_map(normalize_quote)
            .collect(),
        provenance,
        contested: normalize_contested(raw.contested.as_ref()),
    }
}
