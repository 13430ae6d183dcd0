//! Vetter end to end against a scripted completion service.

use std::sync::Arc;

use serde_json::json;

use ai_client::AiError;
use carrot_common::SafetyPolicy;
use carrot_discovery::testing::MockCompletion;
use carrot_discovery::{VetInput, Vetter, VetterError};

const URL: &str = "https://www.example.org/sports/bulls-arena-deal";

fn input() -> VetInput {
    VetInput {
        topic: "Chicago Bulls".into(),
        aliases: vec!["Bulls".into()],
        url: URL.into(),
        text: "The Chicago Bulls and the city signed a new arena lease on Tuesday.".into(),
        contested_claims: Vec::new(),
    }
}

fn vetter(completion: MockCompletion) -> (Arc<MockCompletion>, Vetter) {
    let completion = Arc::new(completion);
    (completion.clone(), Vetter::new(completion))
}

#[tokio::test]
async fn well_formed_response_is_normalized() {
    let (_, vetter) = vetter(MockCompletion::new().on_complete(Some(
        format!(
            "```json\n{}\n```",
            json!({
                "isUseful": true,
                "relevanceScore": 0.9,
                "qualityScore": 82,
                "whyItMatters": " Primary reporting on the lease terms ",
                "facts": [
                    {"label": "Lease length", "value": "30 years", "citation": URL},
                    {"label": "Rent", "value": "$1 per year"},
                    {"label": "Signed", "value": "Tuesday", "citation": URL},
                ],
                "quotes": [{"text": "A fair deal for the city", "speaker": "Mayor", "citation": URL}],
            })
        )
        .as_str(),
    )));

    let result = vetter.vet_source(&input()).await.unwrap();
    assert!(result.is_useful);
    assert_eq!(result.why_it_matters, "Primary reporting on the lease terms");
    let labels: Vec<&str> = result.facts.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(labels, vec!["Lease length", "Signed"]);
    assert_eq!(result.quotes.len(), 1);
    assert_eq!(result.provenance, vec![URL.to_string()]);
    assert!(result.contested.is_none());
}

#[tokio::test]
async fn contested_claims_reach_the_prompt_and_come_back() {
    let claim = "The arena lease shortchanged taxpayers";
    let (completion, vetter) = vetter(MockCompletion::new().on_complete_json(json!({
        "relevanceScore": 0.8,
        "qualityScore": 70,
        "whyItMatters": "Rebuts the subsidy criticism",
        "contested": {"note": "Disputes the subsidy math", "supporting": "", "counter": "City budget office", "claim": claim},
    })));

    let mut input = input();
    input.contested_claims = vec![claim.to_string()];
    let result = vetter.vet_source(&input).await.unwrap();

    let requests = completion.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].messages[1].content.contains(claim));
    assert_eq!(result.contested.unwrap().claim.as_deref(), Some(claim));
}

#[tokio::test]
async fn empty_content_is_rejected() {
    let (_, vetter) = vetter(MockCompletion::new().on_complete(None).on_complete(Some("  ")));
    for _ in 0..2 {
        let err = vetter.vet_source(&input()).await.unwrap_err();
        assert!(matches!(err, VetterError::Empty));
        assert!(err.to_string().contains("deepseek_vetter_empty"));
    }
}

#[tokio::test]
async fn non_json_content_is_a_parse_error() {
    let (_, vetter) =
        vetter(MockCompletion::new().on_complete(Some("This page is about basketball.")));
    let err = vetter.vet_source(&input()).await.unwrap_err();
    assert!(err.to_string().contains("deepseek_vetter_parse_error"));
}

#[tokio::test]
async fn http_failure_carries_status() {
    let (_, vetter) = vetter(
        MockCompletion::new().on_complete_error(AiError::Http {
            status: 402,
            body: "no credit".into(),
        }),
    );
    let err = vetter.vet_source(&input()).await.unwrap_err();
    assert!(err.to_string().starts_with("deepseek_vetter_http_402"));
}

#[tokio::test]
async fn email_anywhere_trips_pii_gate() {
    let (_, vetter) = vetter(
        MockCompletion::new()
            .on_complete_json(json!({"whyItMatters": "Reach the reporter at desk@paper.example"}))
            .on_complete_json(json!({
                "whyItMatters": "Lease coverage",
                "quotes": [{"text": "Email me at fan@bulls.example", "citation": URL}],
            })),
    );
    for _ in 0..2 {
        let err = vetter.vet_source(&input()).await.unwrap_err();
        assert!(err.to_string().contains("pii_detected"));
        assert!(err.is_policy_violation());
    }
}

#[tokio::test]
async fn private_allegation_needs_tiered_citation() {
    let fact = |citation: &str| {
        json!({
            "whyItMatters": "Crime coverage",
            "facts": [{"label": "Incident", "value": "John Smith was arrested outside the arena", "citation": citation}],
        })
    };
    let (_, vetter) = vetter(
        MockCompletion::new()
            .on_complete_json(fact("https://someblog.example/2024/05/arrest"))
            .on_complete_json(fact("https://www.reuters.com/world/us/arena-arrest-2024-05-01/")),
    );

    let err = vetter.vet_source(&input()).await.unwrap_err();
    assert!(err.to_string().contains("defamation_guard"));

    let result = vetter.vet_source(&input()).await.unwrap();
    assert_eq!(result.facts.len(), 1);
    assert_eq!(result.facts[0].value, "John Smith was arrested outside the arena");
}

#[tokio::test]
async fn custom_tier_list_is_honored() {
    let policy = SafetyPolicy {
        tier2_domains: vec!["someblog.example".into()],
        ..SafetyPolicy::default()
    };
    let completion = Arc::new(MockCompletion::new().on_complete_json(json!({
        "facts": [{"label": "Incident", "value": "John Smith was charged", "citation": "https://someblog.example/a/b"}],
    })));
    let vetter = Vetter::new(completion).with_guard(policy.compile().unwrap());
    assert!(vetter.vet_source(&input()).await.is_ok());
}

#[tokio::test]
async fn topic_is_not_treated_as_a_private_person() {
    let team_fact = json!({
        "facts": [{
            "label": "League ruling",
            "value": "Chicago Bulls accused of tampering with a free agent",
            "citation": "https://someblog.example/2024/07/tampering",
        }],
    });
    let attributed = json!({
        "facts": [{
            "label": "Incident",
            "value": "John Smith was charged with fraud, the prosecutor said",
            "citation": "https://someblog.example/2024/07/fraud",
        }],
    });
    let (_, vetter) = vetter(
        MockCompletion::new()
            .on_complete_json(team_fact)
            .on_complete_json(attributed),
    );

    let result = vetter.vet_source(&input()).await.unwrap();
    assert_eq!(result.facts.len(), 1);

    let err = vetter.vet_source(&input()).await.unwrap_err();
    assert!(matches!(err, VetterError::DefamationGuard { .. }));
}
