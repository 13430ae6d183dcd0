//! Hard policy gates run on a normalized result. The first violation rejects
//! the whole source.

use carrot_common::SafetyGuard;

use super::result::VetterResult;
use super::VetterError;

/// Every free-text field a reader will see, labelled for error messages.
fn free_text_fields(result: &VetterResult) -> Vec<(String, &str)> {
    let mut fields = vec![("whyItMatters".to_string(), result.why_it_matters.as_str())];
    for (i, fact) in result.facts.iter().enumerate() {
        fields.push((format!("facts[{i}].label"), fact.label.as_str()));
        fields.push((format!("facts[{i}].value"), fact.value.as_str()));
    }
    for (i, quote) in result.quotes.iter().enumerate() {
        fields.push((format!("quotes[{i}].text"), quote.text.as_str()));
        if let Some(speaker) = &quote.speaker {
            fields.push((format!("quotes[{i}].speaker"), speaker.as_str()));
        }
    }
    if let Some(contested) = &result.contested {
        fields.push(("contested.note".to_string(), contested.note.as_str()));
        if let Some(claim) = &contested.claim {
            fields.push(("contested.claim".to_string(), claim.as_str()));
        }
    }
    fields
}

pub(crate) fn check_pii(guard: &SafetyGuard, result: &VetterResult) -> Result<(), VetterError> {
    for (field, text) in free_text_fields(result) {
        let findings = guard.detect_pii(text);
        if !findings.is_empty() {
            return Err(VetterError::PiiDetected {
                field,
                findings: findings.join(", "),
            });
        }
    }
    Ok(())
}

/// Allegations against a private person need a Tier-1/Tier-2 citation.
/// `known_names` (topic and aliases) never count as private people.
pub(crate) fn check_defamation(
    guard: &SafetyGuard,
    result: &VetterResult,
    known_names: &[String],
) -> Result<(), VetterError> {
    let facts = result
        .facts
        .iter()
        .enumerate()
        .map(|(i, f)| (format!("facts[{i}]"), format!("{}: {}", f.label, f.value), &f.citation));
    let quotes = result.quotes.iter().enumerate().map(|(i, q)| {
        let text = match &q.speaker {
            Some(speaker) => format!("{speaker}: {}", q.text),
            None => q.text.clone(),
        };
        (format!("quotes[{i}]"), text, &q.citation)
    });

    for (field, text, citation) in facts.chain(quotes) {
        if !guard.alleges_against_private_person(&text, known_names) {
            continue;
        }
        if guard.citation_tier(citation).is_none() {
            return Err(VetterError::DefamationGuard {
                field,
                citation: citation.clone(),
            });
        }
    }
    Ok(())
}

pub(crate) fn apply_safety_gates(
    guard: &SafetyGuard,
    result: &VetterResult,
    known_names: &[String],
) -> Result<(), VetterError> {
    check_pii(guard, result)?;
    check_defamation(guard, result, known_names)
}
