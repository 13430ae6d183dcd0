//! Fair-use excerpt extraction: at most two paragraphs (or a run of
//! sentences) and never more than 300 words.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MIN_ARTICLE_CHARS: usize = 100;
pub const MIN_PARAGRAPH_CHARS: usize = 50;
pub const MAX_QUOTE_WORDS: usize = 300;
pub const MAX_QUOTE_PARAGRAPHS: usize = 2;
/// Sentence accumulation may stop early once this many words are held.
pub const SOFT_QUOTE_WORDS: usize = 200;

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]*);").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^.!?]+(?:[.!?]+["')\]]*|$)"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FairUseQuote {
    pub quote_html: String,
    pub quote_text: String,
    pub quote_word_count: usize,
    /// Character offsets of the first excerpt piece within the article text;
    /// both 0 when it is not found verbatim.
    pub quote_start_char: usize,
    pub quote_end_char: usize,
}

fn decode_entity(entity: &str) -> Option<String> {
    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        _ => {
            let hex = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"));
            let code = if let Some(hex) = hex {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse::<u32>().ok()?
            };
            return char::from_u32(code).map(String::from);
        }
    };
    Some(decoded.to_string())
}

/// Visible text of an HTML fragment: tags stripped, entities decoded (unknown
/// ones removed), whitespace collapsed.
pub fn visible_text(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    let decoded = ENTITY_RE.replace_all(&without_tags, |caps: &regex::Captures| {
        decode_entity(&caps[1]).unwrap_or_default()
    });
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn first_words(text: &str, limit: usize) -> String {
    text.split_whitespace().take(limit).collect::<Vec<_>>().join(" ")
}

fn paragraphs(html: &str) -> Vec<String> {
    PARAGRAPH_RE
        .captures_iter(html)
        .map(|caps| visible_text(&caps[1]))
        .filter(|p| p.chars().count() >= MIN_PARAGRAPH_CHARS)
        .collect()
}

fn accumulate_paragraphs(candidates: Vec<String>) -> Vec<String> {
    let mut taken: Vec<String> = Vec::new();
    let mut words = 0;
    for paragraph in candidates {
        let count = word_count(&paragraph);
        if taken.is_empty() {
            if count > MAX_QUOTE_WORDS {
                taken.push(first_words(&paragraph, MAX_QUOTE_WORDS));
                break;
            }
        } else if words + count > MAX_QUOTE_WORDS {
            break;
        }
        words += count;
        taken.push(paragraph);
        if taken.len() >= MAX_QUOTE_PARAGRAPHS {
            break;
        }
    }
    taken
}

fn sentences(text: &str) -> Vec<String> {
    let normalized = WHITESPACE_RE.replace_all(text, " ");
    SENTENCE_RE
        .find_iter(&normalized)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn accumulate_sentences(candidates: Vec<String>) -> Vec<String> {
    let mut taken: Vec<String> = Vec::new();
    let mut words = 0;
    for sentence in candidates {
        let count = word_count(&sentence);
        if taken.is_empty() && count > MAX_QUOTE_WORDS {
            taken.push(first_words(&sentence, MAX_QUOTE_WORDS));
            break;
        }
        if words + count > MAX_QUOTE_WORDS {
            break;
        }
        words += count;
        taken.push(sentence);
        if words >= SOFT_QUOTE_WORDS {
            break;
        }
    }
    taken
}

/// Character offsets of `needle` in `haystack`, `(0, 0)` when absent.
fn char_span(haystack: &str, needle: &str) -> (usize, usize) {
    match haystack.find(needle) {
        Some(byte_start) if !needle.is_empty() => {
            let start = haystack[..byte_start].chars().count();
            (start, start + needle.chars().count())
        }
        _ => (0, 0),
    }
}

pub fn extract_fair_use_quote(article_html: &str, article_text: &str) -> Option<FairUseQuote> {
    if article_text.trim().chars().count() < MIN_ARTICLE_CHARS {
        return None;
    }

    let mut pieces = accumulate_paragraphs(paragraphs(article_html));
    let from_paragraphs = !pieces.is_empty();
    if !from_paragraphs {
        pieces = accumulate_sentences(sentences(article_text));
    }
    let first = pieces.first()?;

    let (quote_start_char, quote_end_char) = char_span(article_text, first);
    let quote_word_count = pieces.iter().map(|p| word_count(p)).sum();

    let (quote_html, quote_text) = if from_paragraphs {
        (
            pieces.iter().map(|p| format!("<p>{}</p>", escape_html(p))).collect::<String>(),
            pieces.join("\n\n"),
        )
    } else {
        let text = pieces.join(" ");
        (format!("<p>{}</p>", escape_html(&text)), text)
    };

    Some(FairUseQuote {
        quote_html,
        quote_text,
        quote_word_count,
        quote_start_char,
        quote_end_char,
    })
}
