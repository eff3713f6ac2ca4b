// SPDX-License-Identifier: PMPL-1.0-or-later
//! Meta-tag validator: title, description, social cards, canonical URL,
//! and heading structure.
//!
//! Per-page rules live here. The duplicate-title/description rules are
//! cross-page: the reporter applies them after every page is collected,
//! using the helpers at the bottom of this module.

use crate::extract::PageFacts;
use crate::model::{Findings, Severity, Violation};
use crate::validators::Validator;
use url::Url;

/// Title length bounds (characters)
pub const TITLE_RANGE: std::ops::RangeInclusive<usize> = 30..=60;
/// Description length bounds (characters)
pub const DESCRIPTION_RANGE: std::ops::RangeInclusive<usize> = 70..=160;

/// Open Graph properties every page must carry
const REQUIRED_OG: &[&str] = &["og:title", "og:description", "og:image", "og:url"];
/// Twitter Card names every page must carry
const REQUIRED_TWITTER: &[&str] = &["twitter:card", "twitter:title", "twitter:description"];

const RULE_IDS: &[&str] = &[
    "title-missing",
    "title-length",
    "title-brand",
    "description-missing",
    "description-length",
    "og-tags",
    "twitter-tags",
    "canonical-missing",
    "canonical-mismatch",
    "single-h1",
    "robots-noindex",
    "duplicate-title",
    "duplicate-description",
];

/// Meta-tag validator
pub struct MetaValidator {
    brand: Option<String>,
}

impl MetaValidator {
    /// `brand` is the name expected in every title; the brand rule is
    /// skipped when unset.
    pub fn new(brand: Option<String>) -> Self {
        Self { brand }
    }
}

impl Validator for MetaValidator {
    fn name(&self) -> &'static str {
        "Meta tags"
    }

    fn rule_ids(&self) -> &'static [&'static str] {
        RULE_IDS
    }

    fn validate(&self, facts: &PageFacts, page_url: &Url) -> Findings {
        let mut findings = Findings::new();
        let url = page_url.as_str();
        let meta = &facts.meta;

        match meta.title.as_deref().filter(|t| !t.is_empty()) {
            None => findings.violations.push(
                Violation::new("title-missing", Severity::Critical, "Page has no <title>")
                    .with_category("metadata")
                    .with_suggestion("Add a unique, descriptive <title> of 30-60 characters")
                    .for_page(url),
            ),
            Some(title) => {
                let len = title.chars().count();
                if !TITLE_RANGE.contains(&len) {
                    findings.violations.push(
                        Violation::new(
                            "title-length",
                            Severity::Serious,
                            &format!(
                                "Title is {} characters; expected {}-{}",
                                len,
                                TITLE_RANGE.start(),
                                TITLE_RANGE.end()
                            ),
                        )
                        .with_category("metadata")
                        .with_element(title)
                        .with_suggestion("Rewrite the title to fit search-result snippets")
                        .for_page(url),
                    );
                }
                if let Some(brand) = &self.brand {
                    if !title.to_lowercase().contains(&brand.to_lowercase()) {
                        findings.violations.push(
                            Violation::new(
                                "title-brand",
                                Severity::Moderate,
                                &format!("Title does not mention the brand \"{}\"", brand),
                            )
                            .with_category("metadata")
                            .with_element(title)
                            .with_suggestion("Append the brand name, e.g. \"... | Acme Septic\"")
                            .for_page(url),
                        );
                    }
                }
            }
        }

        match meta.description.as_deref().filter(|d| !d.is_empty()) {
            None => findings.violations.push(
                Violation::new(
                    "description-missing",
                    Severity::Serious,
                    "Page has no meta description",
                )
                .with_category("metadata")
                .with_suggestion("Add a meta description of 70-160 characters")
                .for_page(url),
            ),
            Some(description) => {
                let len = description.chars().count();
                if !DESCRIPTION_RANGE.contains(&len) {
                    findings.violations.push(
                        Violation::new(
                            "description-length",
                            Severity::Moderate,
                            &format!(
                                "Meta description is {} characters; expected {}-{}",
                                len,
                                DESCRIPTION_RANGE.start(),
                                DESCRIPTION_RANGE.end()
                            ),
                        )
                        .with_category("metadata")
                        .with_suggestion("Adjust the description length for search snippets")
                        .for_page(url),
                    );
                }
            }
        }

        let missing_og: Vec<&str> = REQUIRED_OG
            .iter()
            .copied()
            .filter(|p| !meta.og.contains_key(*p))
            .collect();
        if !missing_og.is_empty() {
            findings.violations.push(
                Violation::new(
                    "og-tags",
                    Severity::Moderate,
                    &format!("Missing Open Graph tags: {}", missing_og.join(", ")),
                )
                .with_category("metadata")
                .with_suggestion("Add the missing og: meta properties for link previews")
                .for_page(url),
            );
        }

        let missing_twitter: Vec<&str> = REQUIRED_TWITTER
            .iter()
            .copied()
            .filter(|n| !meta.twitter.contains_key(*n))
            .collect();
        if !missing_twitter.is_empty() {
            findings.violations.push(
                Violation::new(
                    "twitter-tags",
                    Severity::Moderate,
                    &format!("Missing Twitter Card tags: {}", missing_twitter.join(", ")),
                )
                .with_category("metadata")
                .with_suggestion("Add the missing twitter: meta tags for link previews")
                .for_page(url),
            );
        }

        check_canonical(meta.canonical.as_deref(), page_url, &mut findings);

        if meta.h1_count != 1 {
            findings.violations.push(
                Violation::new(
                    "single-h1",
                    Severity::Serious,
                    &format!("Page has {} <h1> elements; expected exactly one", meta.h1_count),
                )
                .with_category("metadata")
                .with_suggestion("Use one <h1> per page and <h2>-<h6> for subsections")
                .for_page(url),
            );
        }

        if let Some(robots) = meta.robots.as_deref() {
            if robots.to_lowercase().contains("noindex") {
                findings.advisories.push(
                    Violation::new(
                        "robots-noindex",
                        Severity::Info,
                        "Page is marked noindex and will not appear in search results",
                    )
                    .with_category("metadata")
                    .with_element(robots)
                    .for_page(url),
                );
            }
        }

        findings
    }
}

/// Canonical must exist and point at the page's own origin + path.
fn check_canonical(canonical: Option<&str>, page_url: &Url, findings: &mut Findings) {
    let url = page_url.as_str();
    let Some(canonical) = canonical.filter(|c| !c.is_empty()) else {
        findings.violations.push(
            Violation::new(
                "canonical-missing",
                Severity::Serious,
                "Page has no canonical link",
            )
            .with_category("metadata")
            .with_suggestion("Add <link rel=\"canonical\"> pointing at the page's own URL")
            .for_page(url),
        );
        return;
    };

    let resolved = match page_url.join(canonical) {
        Ok(u) => u,
        Err(_) => {
            findings.violations.push(
                Violation::new(
                    "canonical-mismatch",
                    Severity::Serious,
                    &format!("Canonical URL \"{}\" is not a valid URL", canonical),
                )
                .with_category("metadata")
                .for_page(url),
            );
            return;
        }
    };

    let expected = crate::crawl::normalize_url(page_url);
    let actual = crate::crawl::normalize_url(&resolved);
    let same = expected.origin() == actual.origin() && expected.path() == actual.path();
    if !same {
        findings.violations.push(
            Violation::new(
                "canonical-mismatch",
                Severity::Serious,
                &format!(
                    "Canonical \"{}\" does not match the page's own URL {}",
                    canonical, expected
                ),
            )
            .with_category("metadata")
            .with_suggestion("Point the canonical at this page's resolved origin and path")
            .for_page(url),
        );
    }
}

/// Cross-page duplicate detection, applied by the reporter once every page
/// is collected. Returns (url, violation) pairs; each affected page gets a
/// violation naming the other pages sharing the value.
pub fn duplicate_violations(
    rule_id: &str,
    what: &str,
    by_value: &std::collections::BTreeMap<String, Vec<String>>,
) -> Vec<(String, Violation)> {
    let severity = if rule_id == "duplicate-title" {
        Severity::Serious
    } else {
        Severity::Moderate
    };

    let mut out = Vec::new();
    for (value, urls) in by_value {
        if urls.len() < 2 {
            continue;
        }
        for url in urls {
            let others: Vec<&str> = urls
                .iter()
                .filter(|u| *u != url)
                .map(String::as_str)
                .collect();
            out.push((
                url.clone(),
                Violation::new(
                    rule_id,
                    severity,
                    &format!("Duplicate {} \"{}\" also used by: {}", what, value, others.join(", ")),
                )
                .with_category("metadata")
                .with_suggestion(&format!("Write a unique {} for each page", what))
                .for_page(url),
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    fn well_formed_page() -> String {
        // 45-char title containing the brand, 120-char description
        let title = "Septic Tank Pumping in Ruston | Acme Septic";
        let description = "a".repeat(120);
        format!(
            r#"<html lang="en"><head>
                <title>{title}</title>
                <meta name="description" content="{description}">
                <meta property="og:title" content="t">
                <meta property="og:description" content="d">
                <meta property="og:image" content="https://example.com/og.jpg">
                <meta property="og:url" content="https://example.com/">
                <meta name="twitter:card" content="summary">
                <meta name="twitter:title" content="t">
                <meta name="twitter:description" content="d">
                <link rel="canonical" href="https://example.com/">
            </head><body><h1>Septic pumping</h1></body></html>"#
        )
    }

    fn validate_at(html: &str, page: &str, brand: Option<&str>) -> Findings {
        let url = Url::parse(page).unwrap();
        let facts = extract::extract(html, &url, &url);
        MetaValidator::new(brand.map(String::from)).validate(&facts, &url)
    }

    #[test]
    fn test_well_formed_page_no_issues() {
        let findings = validate_at(&well_formed_page(), "https://example.com/", Some("Acme Septic"));
        assert!(findings.violations.is_empty(), "{:?}", findings.violations);
    }

    #[test]
    fn test_short_title_flagged() {
        let html = r#"<head><title>Home</title></head>"#;
        let findings = validate_at(html, "https://example.com/", None);
        assert!(findings.violations.iter().any(|v| v.rule_id == "title-length"));
    }

    #[test]
    fn test_missing_brand_flagged() {
        let html = r#"<head><title>Septic tank pumping and cleaning near you</title></head>"#;
        let findings = validate_at(html, "https://example.com/", Some("Acme Septic"));
        assert!(findings.violations.iter().any(|v| v.rule_id == "title-brand"));
    }

    #[test]
    fn test_missing_og_lists_missing_properties() {
        let findings = validate_at("<head></head>", "https://example.com/", None);
        let og = findings.violations.iter().find(|v| v.rule_id == "og-tags").unwrap();
        assert!(og.message.contains("og:title"));
        assert!(og.message.contains("og:image"));
    }

    #[test]
    fn test_canonical_mismatch() {
        let html = r#"<head><link rel="canonical" href="https://example.com/other"></head>"#;
        let findings = validate_at(html, "https://example.com/services", None);
        assert!(findings.violations.iter().any(|v| v.rule_id == "canonical-mismatch"));
    }

    #[test]
    fn test_canonical_trailing_slash_equivalent() {
        let html = r#"<head><link rel="canonical" href="https://example.com/services/"></head>"#;
        let findings = validate_at(html, "https://example.com/services", None);
        assert!(!findings.violations.iter().any(|v| v.rule_id == "canonical-mismatch"));
    }

    #[test]
    fn test_h1_count_rules() {
        let none = validate_at("<body></body>", "https://example.com/", None);
        assert!(none.violations.iter().any(|v| v.rule_id == "single-h1"));

        let two = validate_at("<body><h1>A</h1><h1>B</h1></body>", "https://example.com/", None);
        assert!(two.violations.iter().any(|v| v.rule_id == "single-h1"));
    }

    #[test]
    fn test_noindex_is_advisory() {
        let html = r#"<head><meta name="robots" content="noindex, nofollow"></head>"#;
        let findings = validate_at(html, "https://example.com/drafts", None);
        assert!(findings.advisories.iter().any(|v| v.rule_id == "robots-noindex"));
        assert!(!findings.violations.iter().any(|v| v.rule_id == "robots-noindex"));
    }

    #[test]
    fn test_duplicate_titles_flag_both_pages() {
        let mut by_title = std::collections::BTreeMap::new();
        by_title.insert(
            "Acme Septic".to_string(),
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string(),
            ],
        );
        by_title.insert(
            "Unique".to_string(),
            vec!["https://example.com/c".to_string()],
        );

        let violations = duplicate_violations("duplicate-title", "title", &by_title);
        assert_eq!(violations.len(), 2);
        let (url_a, v_a) = &violations[0];
        assert_eq!(url_a, "https://example.com/a");
        assert!(v_a.message.contains("https://example.com/b"));
        assert_eq!(v_a.severity, Severity::Serious);
    }
}
