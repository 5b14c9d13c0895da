use std::sync::OnceLock;

use regex::Regex;
use url::Url;

static LINK_RE: OnceLock<Regex> = OnceLock::new();

fn link_regex() -> &'static Regex {
    // Same token shape the rest of the pipeline expects: scheme + a run of
    // non-whitespace. Trailing punctuation ends up in the path, never the host.
    LINK_RE.get_or_init(|| Regex::new(r"https?://\S+").expect("valid regex"))
}

/// Canonical hostname form used everywhere a domain is compared:
/// lowercase, one leading `www.` stripped. Idempotent.
pub fn normalize_domain(raw: &str) -> String {
    let d = raw.trim().to_lowercase();
    match d.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => d,
    }
}

/// Find every URL-like token in `text` and return the normalized hostnames,
/// first-seen order, duplicates kept.
///
/// Tokens that fail to parse or carry no hostname are skipped silently;
/// a malformed link in one message must never abort scanning the rest.
pub fn extract_domains(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for token in link_regex().find_iter(text) {
        let Ok(parsed) = Url::parse(token.as_str()) else {
            continue;
        };
        let Some(host) = parsed.host_str() else {
            continue;
        };
        out.push(normalize_domain(host));
    }
    out
}
