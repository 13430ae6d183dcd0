use super::VetInput;

pub(crate) const VETTER_SYSTEM_PROMPT: &str = r#"You are a meticulous research analyst vetting web sources for a topic knowledge base. You read one source at a time, judge whether it is worth keeping, and pull out verifiable facts and short quotes.

## Fair Use
- Quote at most 2-3 short verbatim passages. Everything else must be paraphrased.
- Never reproduce whole paragraphs.

## Rejection
- Reject low-value, off-topic, promotional or boilerplate pages by setting "isUseful": false.
- Every fact and quote must carry a citation (the URL or a named section of the source). Uncited entries are discarded.
- Never include personal contact details (emails, phone numbers, home addresses).
- Do not repeat unproven criminal allegations against private individuals unless a major wire service, newspaper of record or official body reports them.

## Response Shape
Return STRICT JSON, no prose, no markdown:
{
  "isUseful": boolean,
  "relevanceScore": number (0-1),
  "qualityScore": number (0-100),
  "whyItMatters": string,
  "facts": [{"label": string, "value": string, "citation": string}],
  "quotes": [{"text": string, "speaker": string, "citation": string}],
  "provenance": [string],
  "contested": {"note": string, "supporting": string, "counter": string, "claim": string} | null
}"#;

pub(crate) fn vetter_user_prompt(input: &VetInput) -> String {
    let aliases = if input.aliases.is_empty() {
        "(none)".to_string()
    } else {
        input.aliases.join(", ")
    };

    let mut prompt = format!(
        "Topic: {topic}\nAliases: {aliases}\nSource URL: {url}\n\n\
         Reject the source (isUseful: false) when any of these hold:\n\
         - fewer than 200 substantive words about the topic\n\
         - qualityScore below 60\n\
         - relevanceScore below 0.75\n\
         - facts or quotes that lack a citation\n",
        topic = input.topic,
        url = input.url,
    );

    if !input.contested_claims.is_empty() {
        prompt.push_str("\nContested claims under review:\n");
        for claim in &input.contested_claims {
            prompt.push_str(&format!("- {claim}\n"));
        }
        prompt.push_str(
            "If the source supports or rebuts one of these claims, fill \"contested\" and copy \
             the exact claim text above into \"contested.claim\".\n",
        );
    }

    prompt.push_str(&format!("\n---\n\n{}", input.text));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(claims: Vec<String>) -> VetInput {
        VetInput {
            topic: "Chicago Bulls".into(),
            aliases: vec!["Bulls".into()],
            url: "https://example.org/a/b".into(),
            text: "Full article body".into(),
            contested_claims: claims,
        }
    }

    #[test]
    fn user_prompt_states_thresholds() {
        let prompt = vetter_user_prompt(&input(Vec::new()));
        assert!(prompt.contains("Topic: Chicago Bulls"));
        assert!(prompt.contains("Aliases: Bulls"));
        assert!(prompt.contains("Source URL: https://example.org/a/b"));
        assert!(prompt.contains("fewer than 200 substantive words"));
        assert!(prompt.contains("qualityScore below 60"));
        assert!(prompt.contains("relevanceScore below 0.75"));
        assert!(prompt.ends_with("Full article body"));
        assert!(!prompt.contains("Contested claims"));
    }

    #[test]
    fn contested_claims_are_listed_verbatim() {
        let prompt = vetter_user_prompt(&input(vec!["The arena deal cost taxpayers $200M".into()]));
        assert!(prompt.contains("- The arena deal cost taxpayers $200M\n"));
        assert!(prompt.contains("contested.claim"));
    }

    #[test]
    fn system_prompt_sets_fair_use_policy() {
        assert!(VETTER_SYSTEM_PROMPT.contains("at most 2-3 short verbatim"));
        assert!(VETTER_SYSTEM_PROMPT.contains("isUseful"));
    }
}
