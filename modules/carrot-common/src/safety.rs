//! Compliance tables for vetting: PII patterns, the private-person allegation
//! heuristic and the citation domain tiers. Everything here is data; the
//! built-in tables can be replaced wholesale from a JSON file.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Match, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::domain::{host_matches_any, host_of, normalize_domain};
use crate::error::CarrotError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiPattern {
    pub label: String,
    pub pattern: String,
}

impl PiiPattern {
    fn new(label: &str, pattern: &str) -> Self {
        Self {
            label: label.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

/// Serializable safety tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SafetyPolicy {
    pub pii_patterns: Vec<PiiPattern>,
    /// Verbs/nouns signalling an unproven criminal allegation.
    pub allegation_terms: Vec<String>,
    /// Words marking the subject as a public figure (officials, executives).
    pub public_figure_markers: Vec<String>,
    /// Capitalized tokens that make a "First Last" pair an institution rather
    /// than a person ("Police Department", "The Board").
    pub non_person_tokens: Vec<String>,
    pub tier1_domains: Vec<String>,
    pub tier2_domains: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            pii_patterns: vec![
                PiiPattern::new(
                    "email address",
                    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
                ),
                PiiPattern::new(
                    "phone number",
                    r"(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b",
                ),
                PiiPattern::new("SSN pattern", r"\b\d{3}-\d{2}-\d{4}\b"),
            ],
            allegation_terms: strings(&[
                "arrested",
                "charged",
                "indicted",
                "accused",
                "alleged",
                "allegedly",
                "suspected",
                "detained",
                "booked",
                "implicated",
            ]),
            public_figure_markers: strings(&[
                "president",
                "senator",
                "sen.",
                "congressman",
                "congresswoman",
                "representative",
                "rep.",
                "governor",
                "gov.",
                "mayor",
                "minister",
                "prime minister",
                "secretary",
                "commissioner",
                "councilmember",
                "council member",
                "alderman",
                "judge",
                "justice",
                "attorney general",
                "prosecutor",
                "sheriff",
                "official",
                "lawmaker",
                "legislator",
                "ceo",
                "chief executive",
                "chairman",
                "chairwoman",
                "founder",
            ]),
            non_person_tokens: strings(&[
                "The", "A", "An", "In", "On", "At", "Last", "This", "That", "New", "North",
                "South", "East", "West", "Department", "Police", "Court", "County", "City",
                "State", "States", "University", "Company", "Inc", "Corp", "Office", "Agency",
                "Ministry", "Government", "Council", "Committee", "Board", "Bureau", "Service",
                "Party", "Group", "News", "Times", "Federal", "National", "United",
            ]),
            tier1_domains: strings(&[
                "reuters.com",
                "apnews.com",
                "afp.com",
                "bbc.com",
                "bbc.co.uk",
                "nytimes.com",
                "washingtonpost.com",
                "wsj.com",
                "ft.com",
                "bloomberg.com",
                "theguardian.com",
                "npr.org",
                "economist.com",
                ".gov",
                ".mil",
                "uscourts.gov",
                "europa.eu",
                "un.org",
            ]),
            tier2_domains: strings(&[
                "cnn.com",
                "nbcnews.com",
                "cbsnews.com",
                "abcnews.go.com",
                "pbs.org",
                "politico.com",
                "axios.com",
                "latimes.com",
                "chicagotribune.com",
                "usatoday.com",
                "aljazeera.com",
                "propublica.org",
                "courtlistener.com",
                "theatlantic.com",
                "time.com",
                "gov.uk",
            ]),
        }
    }
}

impl SafetyPolicy {
    pub fn from_json(json: &str) -> Result<Self, CarrotError> {
        serde_json::from_str(json)
            .map_err(|e| CarrotError::Policy(format!("invalid safety policy JSON: {e}")))
    }

    pub fn from_path(path: &Path) -> Result<Self, CarrotError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            CarrotError::Policy(format!("cannot read safety policy {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Compile every pattern once.
    pub fn compile(&self) -> Result<SafetyGuard, CarrotError> {
        let pii = self
            .pii_patterns
            .iter()
            .map(|p| {
                Regex::new(&p.pattern)
                    .map(|re| (p.label.clone(), re))
                    .map_err(|e| CarrotError::Policy(format!("bad PII pattern {:?}: {e}", p.label)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SafetyGuard {
            pii,
            allegation: term_regex(&self.allegation_terms, TermAnchor::Anywhere)?,
            public_figure: term_regex(&self.public_figure_markers, TermAnchor::Anywhere)?,
            title_suffix: term_regex(&self.public_figure_markers, TermAnchor::AtEnd)?,
            non_person_tokens: self.non_person_tokens.clone(),
            tier1: self.tier1_domains.clone(),
            tier2: self.tier2_domains.clone(),
        })
    }
}

#[derive(Clone, Copy)]
enum TermAnchor {
    Anywhere,
    /// The term closes the text, as a title does right before a name.
    AtEnd,
}

/// Case-insensitive alternation of literal terms, bounded so "charged"
/// does not match "recharged". `None` when the list is empty.
fn term_regex(terms: &[String], anchor: TermAnchor) -> Result<Option<Regex>, CarrotError> {
    let alternatives: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    let alternatives = alternatives.join("|");
    let pattern = match anchor {
        TermAnchor::Anywhere => format!(r"(?:^|[^\w])(?:{alternatives})(?:$|[^\w])"),
        TermAnchor::AtEnd => format!(r"(?:^|[^\w])(?:{alternatives})\s*$"),
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|e| CarrotError::Policy(format!("bad term list: {e}")))
}

/// A run of capitalized words, optionally with middle initials.
static NAME_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[A-Z][a-z]+(?:-[A-Z][a-z]+)?(?:\s+(?:[A-Z]\.\s+)?[A-Z][a-z]+(?:-[A-Z][a-z]+)?)+\b",
    )
    .unwrap()
});
static NAME_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][a-z]+(?:-[A-Z][a-z]+)?").unwrap());
/// An appositive longer than this is a clause, not a title.
const MAX_APPOSITIVE_WORDS: usize = 8;
static BARE_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b((?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,})\b").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainTier {
    Tier1,
    Tier2,
}

/// Compiled form of a [`SafetyPolicy`].
#[derive(Debug, Clone)]
pub struct SafetyGuard {
    pii: Vec<(String, Regex)>,
    allegation: Option<Regex>,
    public_figure: Option<Regex>,
    title_suffix: Option<Regex>,
    non_person_tokens: Vec<String>,
    tier1: Vec<String>,
    tier2: Vec<String>,
}

static DEFAULT_GUARD: LazyLock<SafetyGuard> = LazyLock::new(|| {
    SafetyPolicy::default()
        .compile()
        .expect("built-in safety policy compiles")
});

impl Default for SafetyGuard {
    fn default() -> Self {
        DEFAULT_GUARD.clone()
    }
}

impl SafetyGuard {
    /// Check if text contains PII patterns. Returns descriptions of what was found.
    pub fn detect_pii(&self, text: &str) -> Vec<String> {
        self.pii
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(label, _)| format!("{label} detected"))
            .collect()
    }

    /// Allegation language aimed at someone who looks like a named private
    /// individual. A name is cleared only by a title attached to it
    /// ("Senator John Smith", "John Smith, the mayor,"), by containing an
    /// institution token, or by matching one of `known_names` (the topic and
    /// its aliases). A marker elsewhere in the sentence clears nobody.
    pub fn alleges_against_private_person(&self, text: &str, known_names: &[String]) -> bool {
        let Some(allegation) = &self.allegation else {
            return false;
        };
        if !allegation.is_match(text) {
            return false;
        }
        NAME_RUN_RE
            .find_iter(text)
            .any(|run| self.names_private_person(text, run, known_names))
    }

    fn names_private_person(&self, text: &str, run: Match<'_>, known_names: &[String]) -> bool {
        let words: Vec<Match<'_>> = NAME_WORD_RE.find_iter(run.as_str()).collect();
        let Some((_, leading)) = words.split_last() else {
            return false;
        };

        if self.is_titled(&text[..run.start()])
            || leading
                .iter()
                .any(|w| self.is_titled(&text[..run.start() + w.end()]))
        {
            return false;
        }

        // "In March John Smith": drop leading function words before judging.
        let name: Vec<&str> = words
            .iter()
            .map(|w| w.as_str())
            .skip_while(|w| self.is_non_person_token(w))
            .collect();
        if name.len() < 2 || name.iter().any(|w| self.is_non_person_token(w)) {
            return false;
        }
        if is_known_name(&name.join(" "), known_names) {
            return false;
        }

        !self.has_title_appositive(&text[run.end()..])
    }

    fn is_titled(&self, head: &str) -> bool {
        self.title_suffix.as_ref().is_some_and(|re| re.is_match(head))
    }

    fn is_non_person_token(&self, word: &str) -> bool {
        word.split('-')
            .any(|part| self.non_person_tokens.iter().any(|np| np == part))
    }

    /// ", the mayor," or ", a city official," right after the name.
    fn has_title_appositive(&self, after: &str) -> bool {
        let Some(rest) = after.trim_start().strip_prefix(',') else {
            return false;
        };
        let appositive = rest.split([',', ';', '(', ')']).next().unwrap_or_default();
        appositive.split_whitespace().count() <= MAX_APPOSITIVE_WORDS
            && self.public_figure.as_ref().is_some_and(|re| re.is_match(appositive))
    }

    /// Resolve the host a citation points at: a URL, or the first bare
    /// domain mentioned in free text ("Reuters (reuters.com), 2024").
    pub fn citation_host(citation: &str) -> Option<String> {
        if let Some(host) = host_of(citation) {
            return Some(host);
        }
        BARE_DOMAIN_RE
            .captures(citation)
            .and_then(|c| c.get(1))
            .map(|m| normalize_domain(m.as_str()))
    }

    pub fn citation_tier(&self, citation: &str) -> Option<DomainTier> {
        let host = Self::citation_host(citation)?;
        if host_matches_any(&host, &self.tier1) {
            Some(DomainTier::Tier1)
        } else if host_matches_any(&host, &self.tier2) {
            Some(DomainTier::Tier2)
        } else {
            None
        }
    }
}

fn is_known_name(name: &str, known_names: &[String]) -> bool {
    let name = format!(" {} ", name.to_lowercase());
    known_names
        .iter()
        .map(|k| k.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| format!(" {k} ").contains(&name))
}

/// PII scan with the built-in tables.
pub fn detect_pii(text: &str) -> Vec<String> {
    DEFAULT_GUARD.detect_pii(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_pii_phone() {
        let findings = detect_pii("Call me at 612-555-1234 for info");
        assert_eq!(findings, vec!["phone number detected".to_string()]);
    }

    #[test]
    fn test_detect_pii_email() {
        let findings = detect_pii("Contact john@example.com");
        assert_eq!(findings, vec!["email address detected".to_string()]);
    }

    #[test]
    fn test_detect_pii_clean() {
        let findings = detect_pii("The 2024 budget allocated 1500000 dollars to parks");
        assert!(findings.is_empty());
    }

    fn flags(text: &str) -> bool {
        SafetyGuard::default().alleges_against_private_person(text, &[])
    }

    #[test]
    fn allegation_against_private_person_is_flagged() {
        assert!(flags("John Smith was arrested for embezzlement last week"));
        assert!(flags("In March John Q. Smith was indicted"));
    }

    #[test]
    fn titled_name_is_not_flagged() {
        assert!(!flags("Senator John Smith was charged with bribery"));
        assert!(!flags("Chicago Mayor Jane Doe was indicted on Friday"));
        assert!(!flags("Rep. Jane Doe was accused of misusing funds"));
        assert!(!flags("John Smith, the county prosecutor, was charged with perjury"));
    }

    #[test]
    fn detached_marker_does_not_clear_the_name() {
        assert!(flags("John Smith was charged with fraud, the prosecutor said"));
        assert!(flags("John Smith was arrested after a dispute with the mayor"));
        assert!(flags("Mayor: John Smith was arrested downtown"));
        assert!(flags("John Smith, who was accused of theft, left the state"));
    }

    #[test]
    fn institution_names_are_not_people() {
        assert!(!flags("Police Department accused of withholding records"));
        assert!(!flags("The Board was accused of hiding losses"));
    }

    #[test]
    fn topic_and_aliases_are_not_people() {
        let guard = SafetyGuard::default();
        let known = vec!["Chicago Bulls".to_string(), "Bulls".to_string()];
        assert!(flags("Chicago Bulls accused of tampering"));
        assert!(!guard.alleges_against_private_person(
            "Chicago Bulls accused of tampering",
            &known
        ));
        assert!(guard.alleges_against_private_person(
            "Chicago Bulls guard Jimmy Butler was arrested",
            &known
        ));
    }

    #[test]
    fn no_allegation_no_flag() {
        assert!(!flags("John Smith won the marathon"));
        assert!(!flags("The battery was recharged by Jane Doe"));
    }

    #[test]
    fn citation_tier_from_url_and_text() {
        let guard = SafetyGuard::default();
        assert_eq!(
            guard.citation_tier("https://www.reuters.com/world/us/story-2024"),
            Some(DomainTier::Tier1)
        );
        assert_eq!(
            guard.citation_tier("CNN (cnn.com), March 2024"),
            Some(DomainTier::Tier2)
        );
        assert_eq!(
            guard.citation_tier("https://www.justice.gov/opa/pr/x"),
            Some(DomainTier::Tier1)
        );
        assert_eq!(guard.citation_tier("https://randomblog.example/post/1"), None);
        assert_eq!(guard.citation_tier("a blog post"), None);
    }

    #[test]
    fn policy_json_overrides_tables() {
        let policy = SafetyPolicy::from_json(
            r#"{"piiPatterns":[{"label":"badge id","pattern":"BADGE-\\d{4}"}],"tier1Domains":["example.org"]}"#,
        )
        .unwrap();
        let guard = policy.compile().unwrap();
        assert_eq!(guard.detect_pii("BADGE-1234"), vec!["badge id detected".to_string()]);
        assert!(guard.detect_pii("john@example.com").is_empty());
        assert_eq!(guard.citation_tier("https://example.org/a/b"), Some(DomainTier::Tier1));
        // Unspecified tables keep their defaults.
        assert_eq!(guard.citation_tier("https://cnn.com/a/b"), Some(DomainTier::Tier2));
    }

    #[test]
    fn policy_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"allegationTerms":["sued"]}}"#).unwrap();
        let policy = SafetyPolicy::from_path(file.path()).unwrap();
        assert_eq!(policy.allegation_terms, vec!["sued".to_string()]);
        let guard = policy.compile().unwrap();
        assert!(guard.alleges_against_private_person("Jane Doe sued her landlord", &[]));
        assert!(!guard.alleges_against_private_person("Jane Doe was arrested", &[]));
    }

    #[test]
    fn bad_pattern_is_reported() {
        let policy = SafetyPolicy {
            pii_patterns: vec![PiiPattern::new("broken", "(")],
            ..SafetyPolicy::default()
        };
        let err = policy.compile().unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
