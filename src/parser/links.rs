use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Aggregator redirect path whose links are deprioritized in favor of the
/// underlying employer URL. Single known pattern; if the upstream redirect
/// scheme changes this silently stops matching.
const REDIRECT_PATH: &str = "simplify.jobs/p/";

static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]\((https?://[^\s)]+)\)").unwrap());
static HREF_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href=["'](https?://[^"']+)["']"#).unwrap());
static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?://[^\s\)\]]+)").unwrap());

/// Ordered extraction strategies; the first that yields a URL wins.
const STRATEGIES: &[fn(&str) -> Option<String>] = &[
    anchor_skipping_redirects,
    anchor_any,
    markdown_target,
    href_attribute,
    bare_url,
];

/// Pull the best absolute link out of a cell, markup or plain text.
pub fn extract_link(cell: &str) -> Option<String> {
    if cell.trim().is_empty() {
        return None;
    }
    STRATEGIES.iter().find_map(|strategy| strategy(cell))
}

/// Entity unescape + trim. Deliberately no heavier URL canonicalization;
/// stored dedupe keys must stay predictable across runs.
pub fn normalize(url: &str) -> String {
    unescape(url.trim())
}

fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn is_absolute(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn anchor_hrefs(cell: &str) -> Vec<String> {
    if !cell.contains('<') {
        return Vec::new();
    }
    let fragment = Html::parse_fragment(cell);
    fragment
        .select(&ANCHOR_SEL)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect()
}

fn anchor_skipping_redirects(cell: &str) -> Option<String> {
    anchor_hrefs(cell)
        .into_iter()
        .find(|href| is_absolute(href) && !href.to_lowercase().contains(REDIRECT_PATH))
        .map(|href| normalize(&href))
}

fn anchor_any(cell: &str) -> Option<String> {
    anchor_hrefs(cell)
        .into_iter()
        .find(|href| is_absolute(href))
        .map(|href| normalize(&href))
}

fn markdown_target(cell: &str) -> Option<String> {
    MD_LINK_RE.captures(cell).map(|caps| normalize(&caps[1]))
}

fn href_attribute(cell: &str) -> Option<String> {
    HREF_ATTR_RE.captures(cell).map(|caps| normalize(&caps[1]))
}

fn bare_url(cell: &str) -> Option<String> {
    BARE_URL_RE.captures(cell).map(|caps| normalize(&caps[1]))
}

// ── Tests ──
