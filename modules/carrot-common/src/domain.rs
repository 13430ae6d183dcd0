use url::Url;

/// Normalize a domain for dedup: lowercase + strip leading `www.`.
pub fn normalize_domain(domain: &str) -> String {
    let d = domain.trim().trim_end_matches('.').to_lowercase();
    d.strip_prefix("www.").unwrap_or(&d).to_string()
}

/// Parse an absolute http(s) URL.
pub fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

pub fn is_http_url(raw: &str) -> bool {
    parse_http_url(raw).is_some()
}

/// Normalized host of an absolute http(s) URL.
pub fn host_of(raw: &str) -> Option<String> {
    parse_http_url(raw)
        .and_then(|u| u.host_str().map(normalize_domain))
        .filter(|h| !h.is_empty())
}

/// Number of non-empty path segments; `None` for unparseable URLs.
pub fn path_segment_count(raw: &str) -> Option<usize> {
    let url = parse_http_url(raw)?;
    Some(
        url.path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).count())
            .unwrap_or(0),
    )
}

/// Suffix match on hostnames. A leading dot (`.gov`) matches any host ending
/// in it; a bare suffix (`reuters.com`) matches the host itself or any
/// subdomain of it, never `notreuters.com`.
pub fn host_matches_suffix(host: &str, suffix: &str) -> bool {
    let host = normalize_domain(host);
    let suffix = suffix.trim().to_lowercase();
    if suffix.is_empty() {
        return false;
    }
    if suffix.starts_with('.') {
        return host.ends_with(&suffix);
    }
    let suffix = suffix.strip_prefix("www.").unwrap_or(&suffix);
    host == suffix || host.ends_with(&format!(".{suffix}"))
}

pub fn host_matches_any(host: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|s| host_matches_suffix(host, s))
}

pub fn is_wikipedia_host(host: &str) -> bool {
    host_matches_suffix(host, "wikipedia.org")
}
