use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::links;
use crate::parser::rows::NormalizedRow;

/// Marker used by the source document for rows that add another location
/// or detail to the posting introduced by the previous primary row.
pub const CONTINUATION_GLYPH: &str = "↳";

// Accepts "0d", "0 d", "0 day", "0 days".
static AGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b0\s*d\b|\b0\s*days?\b").unwrap());

/// Column roles resolved from whatever headers the table happened to have.
#[derive(Debug, Clone)]
pub struct Schema {
    pub company: String,
    pub role: String,
    pub location: Option<String>,
    pub age: Option<String>,
    pub application: Option<String>,
}

impl Schema {
    /// Resolve roles by header substring; nothing is positional except the
    /// company/role fallbacks to the first two columns.
    pub fn detect(row: &NormalizedRow) -> Self {
        let headers: Vec<&str> = row.headers().collect();
        let find = |needles: &[&str]| -> Option<String> {
            headers
                .iter()
                .find(|header| {
                    let lower = header.to_lowercase();
                    needles.iter().any(|needle| lower.contains(needle))
                })
                .map(|header| header.to_string())
        };

        Schema {
            company: find(&["company"])
                .or_else(|| headers.first().map(|h| h.to_string()))
                .unwrap_or_else(|| "Company".to_string()),
            role: find(&["role", "position"])
                .or_else(|| headers.get(1).map(|h| h.to_string()))
                .unwrap_or_else(|| "Role".to_string()),
            location: find(&["location"]),
            age: find(&["age"]),
            application: find(&["apply", "application"]),
        }
    }
}

/// One qualifying posting, ready to notify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub company: String,
    pub role: String,
    pub location: String,
    pub age: String,
    pub link: Option<String>,
    pub key: String,
}

/// Walk normalized rows in document order, apply the country and age
/// filters, resolve continuation rows to their owning primary row, and
/// compute a stable dedupe key per qualifying row. Keys already present in
/// `notified` are dropped. Order matters: the continuation context is
/// carried row to row.
pub fn qualify(
    rows: &[NormalizedRow],
    schema: &Schema,
    country: &str,
    notified: &HashSet<String>,
) -> Vec<Posting> {
    let country_lower = country.to_lowercase();
    let mut last_company: Option<String> = None;
    let mut last_link: Option<String> = None;
    let mut postings = Vec::new();

    for row in rows {
        let location = schema
            .location
            .as_deref()
            .map(|header| row.text(header))
            .unwrap_or("");
        let age = schema
            .age
            .as_deref()
            .map(|header| row.text(header))
            .unwrap_or("");

        if location.is_empty() || !location.to_lowercase().contains(&country_lower) {
            continue;
        }
        if !AGE_RE.is_match(&age.to_lowercase()) {
            continue;
        }

        // Prefer the raw application cell so anchors survive stripping.
        let current_link = schema.application.as_deref().and_then(|header| {
            links::extract_link(row.raw(header)).or_else(|| links::extract_link(row.text(header)))
        });

        let company_text = row.text(&schema.company).trim().to_string();
        let is_continuation = company_text == CONTINUATION_GLYPH;

        if !company_text.is_empty() && !is_continuation {
            last_company = Some(company_text.clone());
            if current_link.is_some() {
                last_link = current_link.clone();
            }
        }

        // Continuation rows without a link of their own inherit the last
        // resolved primary link.
        let link = current_link.or_else(|| {
            if is_continuation {
                last_link.clone()
            } else {
                None
            }
        });

        let company = if is_continuation {
            last_company.clone().unwrap_or(company_text)
        } else {
            company_text
        };
        let role = row.text(&schema.role).trim().to_string();
        let location = location.trim().to_string();

        // Linkless postings still need a stable identity.
        let key = match &link {
            Some(url) => links::normalize(url),
            None => links::normalize(&format!("{company}|{role}|{location}")),
        };
        if notified.contains(&key) {
            continue;
        }

        postings.push(Posting {
            company,
            role,
            location,
            age: age.to_string(),
            link,
            key,
        });
    }

    postings
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::rows::{normalize, RawRow};

    const HEADERS: [&str; 5] = ["Company", "Role", "Location", "Application", "Age"];

    fn row(cells: [&str; 5]) -> NormalizedRow {
        let mut raw = RawRow::default();
        for (header, cell) in HEADERS.iter().zip(cells) {
            raw.push(*header, cell);
        }
        normalize(&raw)
    }

    fn schema() -> Schema {
        Schema::detect(&row(["", "", "", "", ""]))
    }

    fn acme(location: &str, age: &str) -> NormalizedRow {
        row([
            "Acme",
            "SWE Intern",
            location,
            r#"<a href="https://acme.example/apply">Apply</a>"#,
            age,
        ])
    }

    #[test]
    fn schema_detection_by_header_substring() {
        let s = schema();
        assert_eq!(s.company, "Company");
        assert_eq!(s.role, "Role");
        assert_eq!(s.location.as_deref(), Some("Location"));
        assert_eq!(s.age.as_deref(), Some("Age"));
        assert_eq!(s.application.as_deref(), Some("Application"));
    }

    #[test]
    fn schema_falls_back_to_first_columns() {
        let mut raw = RawRow::default();
        raw.push("Org", "Acme");
        raw.push("Title", "SWE");
        let s = Schema::detect(&normalize(&raw));
        assert_eq!(s.company, "Org");
        assert_eq!(s.role, "Title");
        assert!(s.location.is_none());
        assert!(s.age.is_none());
    }

    #[test]
    fn location_filter_is_literal_substring() {
        let empty = HashSet::new();
        let s = schema();
        assert_eq!(qualify(&[acme("Toronto, Canada", "0d")], &s, "Canada", &empty).len(), 1);
        assert_eq!(qualify(&[acme("Canada Remote", "0d")], &s, "Canada", &empty).len(), 1);
        assert_eq!(qualify(&[acme("CANADA", "0d")], &s, "Canada", &empty).len(), 1);
        assert_eq!(qualify(&[acme("United States", "0d")], &s, "Canada", &empty).len(), 0);
        assert_eq!(qualify(&[acme("", "0d")], &s, "Canada", &empty).len(), 0);
    }

    #[test]
    fn age_filter_accepts_zero_day_forms_only() {
        let empty = HashSet::new();
        let s = schema();
        for age in ["0d", "0 d", "0 day", "0 days"] {
            assert_eq!(qualify(&[acme("Canada", age)], &s, "Canada", &empty).len(), 1, "{age}");
        }
        for age in ["3d", "10d", "", "fresh"] {
            assert_eq!(qualify(&[acme("Canada", age)], &s, "Canada", &empty).len(), 0, "{age}");
        }
    }

    #[test]
    fn continuation_inherits_company_and_link() {
        let rows = [
            acme("Toronto, Canada", "0d"),
            row(["↳", "SWE Intern", "Vancouver, Canada", "", "0d"]),
        ];
        let postings = qualify(&rows, &schema(), "Canada", &HashSet::new());
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[1].company, "Acme");
        assert_eq!(postings[1].link.as_deref(), Some("https://acme.example/apply"));
        // Same resolved link, same key: the dispatch loop collapses them.
        assert_eq!(postings[0].key, postings[1].key);
    }

    #[test]
    fn continuation_with_own_link_keeps_it() {
        let rows = [
            acme("Toronto, Canada", "0d"),
            row([
                "↳",
                "SWE Intern",
                "Montreal, Canada",
                r#"<a href="https://acme.example/montreal">Apply</a>"#,
                "0d",
            ]),
        ];
        let postings = qualify(&rows, &schema(), "Canada", &HashSet::new());
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[1].company, "Acme");
        assert_eq!(postings[1].key, "https://acme.example/montreal");
    }

    #[test]
    fn linkless_primary_uses_composite_key() {
        let rows = [
            acme("Toronto, Canada", "0d"),
            row(["BigCo", "Dev Intern", "Ottawa, Canada", "", "0d"]),
        ];
        let postings = qualify(&rows, &schema(), "Canada", &HashSet::new());
        assert_eq!(postings.len(), 2);
        // A primary row never inherits the previous posting's link.
        assert!(postings[1].link.is_none());
        assert_eq!(postings[1].key, "BigCo|Dev Intern|Ottawa, Canada");
    }

    #[test]
    fn notified_keys_are_dropped() {
        let notified: HashSet<String> =
            ["https://acme.example/apply".to_string()].into_iter().collect();
        let postings = qualify(&[acme("Toronto, Canada", "0d")], &schema(), "Canada", &notified);
        assert!(postings.is_empty());
    }

    #[test]
    fn rows_failing_filters_do_not_update_continuation_context() {
        // The US primary is filtered out before context tracking, so its
        // continuation attributes to the last qualifying company.
        let rows = [
            acme("Toronto, Canada", "0d"),
            row([
                "BigCo",
                "Dev Intern",
                "New York, USA",
                r#"<a href="https://bigco.example/apply">Apply</a>"#,
                "0d",
            ]),
            row(["↳", "Dev Intern", "Calgary, Canada", "", "0d"]),
        ];
        let postings = qualify(&rows, &schema(), "Canada", &HashSet::new());
        assert_eq!(postings.len(), 2);
        assert_eq!(postings[1].company, "Acme");
        assert_eq!(postings[1].link.as_deref(), Some("https://acme.example/apply"));
    }

    #[test]
    fn missing_location_column_disqualifies_everything() {
        let mut raw = RawRow::default();
        raw.push("Company", "Acme");
        raw.push("Role", "SWE");
        let normalized = normalize(&raw);
        let s = Schema::detect(&normalized);
        assert!(qualify(&[normalized], &s, "Canada", &HashSet::new()).is_empty());
    }
}
