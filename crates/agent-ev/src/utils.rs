//! Helpers for LLM output, search results and report formatting

use crate::api::SearchResult;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").expect("valid regex"));
static BARE_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// Approximate characters per token
const CHARS_PER_TOKEN: usize = 4;

/// A cut document is kept only if at least this many characters fit
const MIN_PARTIAL_CHARS: usize = 500;

/// Trusted international news and research domains
const RELIABLE_DOMAINS: &[&str] = &[
    "bloomberg.com",
    "reuters.com",
    "ft.com",
    "wsj.com",
    "iea.org",
    "mckinsey.com",
    "bcg.com",
    "deloitte.com",
    "pwc.com",
    "tesla.com",
    "marketwatch.com",
    "cnbc.com",
    "insideevs.com",
    "electrek.co",
    "cleantechnica.com",
];

/// Trusted Korean outlets
const KOREAN_DOMAINS: &[&str] = &[
    "mk.co.kr",
    "hankyung.com",
    "chosun.com",
    "joongang.co.kr",
    "etnews.com",
];

/// Results returned when no trusted domain matches
const FALLBACK_SOURCES: usize = 5;

/// Extract a JSON object from an LLM answer
///
/// A fenced ```` ```json ```` block wins; otherwise the span from the first
/// `{` to the last `}` is tried. Returns `None` when nothing parses.
pub fn extract_json_from_text(text: &str) -> Option<Map<String, Value>> {
    let candidate = FENCED_JSON_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .or_else(|| BARE_JSON_RE.find(text))?
        .as_str();

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            warn!("Failed to parse JSON from LLM output: {}", e);
            None
        }
    }
}

/// Keep documents within a token budget
///
/// Documents are kept whole while they fit into `max_tokens * 4` characters.
/// The first one that does not fit is cut to the remaining budget, but only
/// when more than 500 characters remain. Nothing after it is kept.
pub fn truncate_documents(documents: &[String], max_tokens: usize) -> Vec<String> {
    let max_chars = max_tokens * CHARS_PER_TOKEN;
    let mut kept = Vec::new();
    let mut total = 0;

    for doc in documents {
        let len = doc.chars().count();
        if total + len <= max_chars {
            kept.push(doc.clone());
            total += len;
        } else {
            let remaining = max_chars - total;
            if remaining > MIN_PARTIAL_CHARS {
                kept.push(doc.chars().take(remaining).collect());
            }
            break;
        }
    }

    kept
}

/// Blend keyword hits in title and snippet with the engine's own score
pub fn calculate_relevance_score(result: &SearchResult, keywords: &[&str]) -> f64 {
    let haystack = format!("{} {}", result.title, result.content).to_lowercase();
    let hits = keywords
        .iter()
        .filter(|keyword| haystack.contains(&keyword.to_lowercase()))
        .count();

    (hits as f64 + result.score) / 2.0
}

/// Union of several result lists, one entry per URL, best score first
pub fn merge_search_results(lists: Vec<Vec<SearchResult>>) -> Vec<SearchResult> {
    let mut merged = deduplicate_results(lists.into_iter().flatten().collect());
    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged
}

/// Whether the URL's host is a trusted domain or one of its subdomains
fn is_trusted_url(url: &str) -> bool {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    else {
        return false;
    };
    RELIABLE_DOMAINS.iter().chain(KOREAN_DOMAINS).any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Keep results from trusted domains
///
/// When none match, the five best-scored results are returned instead.
pub fn filter_reliable_sources(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let (reliable, rest): (Vec<_>, Vec<_>) = results
        .into_iter()
        .partition(|result| is_trusted_url(&result.url));

    if !reliable.is_empty() {
        return reliable;
    }

    let mut rest = rest;
    rest.sort_by(|a, b| b.score.total_cmp(&a.score));
    rest.truncate(FALLBACK_SOURCES);
    rest
}

/// Drop repeated URLs, keeping the first occurrence; results without a URL are dropped
pub fn deduplicate_results(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|result| !result.url.is_empty() && seen.insert(result.url.clone()))
        .collect()
}

/// Round to a whole number and group thousands: `1234567.8` → `1,234,568`
pub fn format_number(value: Option<f64>, default: &str) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return default.to_string();
    };

    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Signed percentage with two decimals: `3.14159` → `+3.14%`
pub fn format_percent(value: Option<f64>, default: &str) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{v:+.2}%"),
        None => default.to_string(),
    }
}

/// First `max` characters of `text`
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, score: f64) -> SearchResult {
        SearchResult::new(format!("title {url}"), url, score)
    }

    #[test]
    fn test_extract_fenced_json() {
        let text = "Here you go:\n```json\n{\"summary\": \"EV growth\", \"n\": 1}\n```\nThanks {not json}";
        let map = extract_json_from_text(text).unwrap();
        assert_eq!(map["summary"], "EV growth");
    }

    #[test]
    fn test_extract_bare_json() {
        let text = "Report: {\"a\": {\"b\": [1, 2]}} end";
        let map = extract_json_from_text(text).unwrap();
        assert_eq!(map["a"]["b"][1], 2);
    }

    #[test]
    fn test_extract_invalid_json() {
        assert!(extract_json_from_text("no json here").is_none());
        assert!(extract_json_from_text("{broken: json}").is_none());
        // A fenced block that fails to parse is not retried as bare JSON
        assert!(extract_json_from_text("```json\n{oops}\n``` {\"a\": 1}").is_none());
    }

    #[test]
    fn test_truncate_documents_whole_fit() {
        let docs = vec!["a".repeat(10), "b".repeat(10)];
        assert_eq!(truncate_documents(&docs, 5), docs);
    }

    #[test]
    fn test_truncate_documents_partial() {
        // Budget 4000 chars: 3000 fit, 1000 remain (> 500) so the second is cut
        let docs = vec!["a".repeat(3000), "b".repeat(2000), "c".repeat(10)];
        let kept = truncate_documents(&docs, 1000);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].len(), 1000);
    }

    #[test]
    fn test_truncate_documents_small_remainder_dropped() {
        // Only 400 chars remain, so the overflowing document is dropped
        let docs = vec!["a".repeat(3600), "b".repeat(2000), "c".repeat(10)];
        let kept = truncate_documents(&docs, 1000);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_truncate_documents_counts_chars() {
        let docs = vec!["전기차".repeat(300)];
        let kept = truncate_documents(&docs, 200);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].chars().count(), 800);
    }

    #[test]
    fn test_relevance_score() {
        let r = SearchResult::new("Tesla battery news", "https://x.com", 0.8)
            .with_content("Solid-state BATTERY progress");
        let score = calculate_relevance_score(&r, &["battery", "tesla", "byd"]);
        assert!((score - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_merge_search_results() {
        let merged = merge_search_results(vec![
            vec![result("https://a.com", 0.2), result("https://b.com", 0.9)],
            vec![result("https://a.com", 0.99), result("https://c.com", 0.5)],
        ]);
        let urls: Vec<&str> = merged.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://b.com", "https://c.com", "https://a.com"]);
    }

    #[test]
    fn test_filter_reliable_sources() {
        let filtered = filter_reliable_sources(vec![
            result("https://blog.example.com/ev", 0.9),
            result("https://www.Reuters.com/business/autos", 0.3),
            result("https://www.hankyung.com/article/1", 0.1),
        ]);
        assert_eq!(filtered.len(), 2);
        assert!(filtered[0].url.contains("Reuters"));
    }

    #[test]
    fn test_trusted_url_matches_host_only() {
        assert!(is_trusted_url("https://ft.com/content/ev"));
        assert!(is_trusted_url("https://markets.ft.com/data"));
        assert!(!is_trusted_url("https://microsoft.com/ev"));
        assert!(!is_trusted_url("https://example.com/?src=reuters.com"));
        assert!(!is_trusted_url("not a url"));
    }

    #[test]
    fn test_filter_reliable_sources_fallback() {
        let results: Vec<SearchResult> = (0..8)
            .map(|i| result(&format!("https://blog{i}.example.com"), f64::from(i) / 10.0))
            .collect();
        let filtered = filter_reliable_sources(results);
        assert_eq!(filtered.len(), 5);
        assert_eq!(filtered[0].url, "https://blog7.example.com");
    }

    #[test]
    fn test_deduplicate_results() {
        let deduped = deduplicate_results(vec![
            result("https://a.com", 0.1),
            result("", 0.9),
            result("https://a.com", 0.8),
            result("https://b.com", 0.2),
        ]);
        assert_eq!(deduped.len(), 2);
        assert!((deduped[0].score - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(Some(1_234_567.8), "N/A"), "1,234,568");
        assert_eq!(format_number(Some(999.0), "N/A"), "999");
        assert_eq!(format_number(Some(-12_500.0), "N/A"), "-12,500");
        assert_eq!(format_number(Some(0.4), "N/A"), "0");
        assert_eq!(format_number(None, "N/A"), "N/A");
        assert_eq!(format_number(Some(f64::NAN), "0"), "0");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(Some(3.14159), "0.00%"), "+3.14%");
        assert_eq!(format_percent(Some(-0.5), "0.00%"), "-0.50%");
        assert_eq!(format_percent(None, "0.00%"), "0.00%");
    }
}
