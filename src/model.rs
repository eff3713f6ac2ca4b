// SPDX-License-Identifier: PMPL-1.0-or-later
//! Core result types shared by every checker.
//!
//! A run produces one [`PageResult`] per visited URL. Validators produce
//! [`Violation`]s; informational "needs review" items travel separately as
//! advisories so they never affect the pass flag unless strict mode promotes
//! them.

use crate::extract::PageFacts;
use serde::{Deserialize, Serialize};

/// Maximum length of an element snippet carried on a violation. Keeps
/// reports readable when a page embeds large inline markup.
const MAX_ELEMENT_SNIPPET: usize = 200;

/// Severity of a violation, in axe-style impact order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks users outright or breaks the page contract
    Critical,
    /// Serious barrier, must be addressed
    Serious,
    /// Degrades quality, should be addressed
    Moderate,
    /// Minor polish issue
    Minor,
    /// Informational
    Info,
}

impl Severity {
    /// All severities, most severe first.
    pub fn all() -> [Severity; 5] {
        [
            Severity::Critical,
            Severity::Serious,
            Severity::Moderate,
            Severity::Minor,
            Severity::Info,
        ]
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Serious => write!(f, "SERIOUS"),
            Severity::Moderate => write!(f, "MODERATE"),
            Severity::Minor => write!(f, "MINOR"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WcagLevel {
    /// Level A - minimum conformance
    A,
    /// Level AA - standard conformance
    AA,
    /// Level AAA - enhanced conformance
    AAA,
}

impl std::fmt::Display for WcagLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WcagLevel::A => write!(f, "A"),
            WcagLevel::AA => write!(f, "AA"),
            WcagLevel::AAA => write!(f, "AAA"),
        }
    }
}

/// A single rule failure detected on a page.
///
/// `rule_id` must be one of the producing validator's known rules; the
/// runner logs a warning if a validator emits an unknown id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule identifier (e.g. "image-alt", "color-contrast")
    pub rule_id: String,
    /// Severity level
    pub severity: Severity,
    /// Detailed message
    pub message: String,
    /// Category used for grouped remediation advice
    pub category: String,
    /// URL of the page the violation was found on
    pub page_url: String,
    /// Serialized representation of the offending element, truncated
    pub element: Option<String>,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl Violation {
    /// Create a new violation
    pub fn new(rule_id: &str, severity: Severity, message: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.to_string(),
            category: String::new(),
            page_url: String::new(),
            element: None,
            suggestion: None,
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    /// Set the offending element snippet, truncated to a bounded length
    pub fn with_element(mut self, element: &str) -> Self {
        let snippet = if element.len() > MAX_ELEMENT_SNIPPET {
            let mut end = MAX_ELEMENT_SNIPPET;
            while !element.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}…", &element[..end])
        } else {
            element.to_string()
        };
        self.element = Some(snippet);
        self
    }

    /// Set the suggested fix
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    /// Set the page URL
    pub fn for_page(mut self, url: &str) -> Self {
        self.page_url = url.to_string();
        self
    }
}

/// Output of one validator over one page's facts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Findings {
    /// Rule failures; any entry makes the page fail
    pub violations: Vec<Violation>,
    /// Informational "needs review" items; never affect the pass flag
    /// unless promoted by strict mode
    pub advisories: Vec<Violation>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another set of findings into this one
    pub fn merge(&mut self, other: Findings) {
        self.violations.extend(other.violations);
        self.advisories.extend(other.advisories);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty() && self.advisories.is_empty()
    }
}

/// The full outcome for one crawled URL: extracted facts, violations, and
/// the pass flag. Immutable once the run is sealed by the reporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// Full URL of the page
    pub url: String,
    /// Path component, for compact display
    pub path: String,
    /// Fetch error, if the page could not be retrieved
    pub fetch_error: Option<String>,
    /// Facts extracted from the page
    pub facts: PageFacts,
    /// Rule failures
    pub violations: Vec<Violation>,
    /// Informational items that do not affect the pass flag
    pub advisories: Vec<Violation>,
    /// True iff `violations` is empty
    pub pass: bool,
}

impl PageResult {
    /// Build a result for a successfully fetched and validated page.
    pub fn from_validation(url: &url::Url, facts: PageFacts, findings: Findings) -> Self {
        let pass = findings.violations.is_empty();
        Self {
            url: url.to_string(),
            path: url.path().to_string(),
            fetch_error: None,
            facts,
            violations: findings.violations,
            advisories: findings.advisories,
            pass,
        }
    }

    /// Build a result for a page that could not be fetched. The fetch error
    /// is recorded both as the error field and as a critical violation so
    /// the pass invariant holds.
    pub fn fetch_failure(url: &url::Url, error: &crate::error::AuditError) -> Self {
        let message = error.to_string();
        let violation = Violation::new(
            "fetch-error",
            Severity::Critical,
            &format!("Page could not be fetched: {}", message),
        )
        .with_category("availability")
        .with_suggestion("Verify the page is deployed and reachable")
        .for_page(url.as_str());

        Self {
            url: url.to_string(),
            path: url.path().to_string(),
            fetch_error: Some(message),
            facts: PageFacts::default(),
            violations: vec![violation],
            advisories: Vec::new(),
            pass: false,
        }
    }

    /// Recompute the pass flag after the reporter folds in cross-page
    /// violations or promotes advisories in strict mode.
    pub fn recompute_pass(&mut self) {
        self.pass = self.violations.is_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order_most_severe_first() {
        assert!(Severity::Critical < Severity::Serious);
        assert!(Severity::Serious < Severity::Moderate);
        assert!(Severity::Minor < Severity::Info);
    }

    #[test]
    fn test_violation_builder() {
        let v = Violation::new("image-alt", Severity::Critical, "Image has no accessible name")
            .with_category("image-alt")
            .with_element("<img src=\"hero.jpg\">")
            .with_suggestion("Add an alt attribute")
            .for_page("https://example.com/");

        assert_eq!(v.rule_id, "image-alt");
        assert_eq!(v.severity, Severity::Critical);
        assert_eq!(v.page_url, "https://example.com/");
        assert_eq!(v.element.as_deref(), Some("<img src=\"hero.jpg\">"));
    }

    #[test]
    fn test_element_snippet_truncated() {
        let long = format!("<div data-x=\"{}\">", "a".repeat(400));
        let v = Violation::new("r", Severity::Info, "m").with_element(&long);
        let snippet = v.element.unwrap();
        assert!(snippet.chars().count() <= 201);
        assert!(snippet.ends_with('…'));
    }

    #[test]
    fn test_pass_iff_no_violations() {
        let url = url::Url::parse("https://example.com/services").unwrap();

        let clean = PageResult::from_validation(&url, PageFacts::default(), Findings::new());
        assert!(clean.pass);

        let mut findings = Findings::new();
        findings.violations.push(Violation::new("single-h1", Severity::Serious, "No h1"));
        let failed = PageResult::from_validation(&url, PageFacts::default(), findings);
        assert!(!failed.pass);
    }

    #[test]
    fn test_advisories_do_not_affect_pass() {
        let url = url::Url::parse("https://example.com/").unwrap();
        let mut findings = Findings::new();
        findings.advisories.push(Violation::new("link-redirect", Severity::Info, "301"));
        let page = PageResult::from_validation(&url, PageFacts::default(), findings);
        assert!(page.pass);
        assert_eq!(page.advisories.len(), 1);
    }

    #[test]
    fn test_fetch_failure_fails_page() {
        let url = url::Url::parse("https://example.com/missing").unwrap();
        let err = crate::error::AuditError::HttpStatus {
            url: url.to_string(),
            status: 404,
        };
        let page = PageResult::fetch_failure(&url, &err);
        assert!(!page.pass);
        assert!(page.fetch_error.is_some());
        assert_eq!(page.violations.len(), 1);
        assert_eq!(page.violations[0].rule_id, "fetch-error");
    }
}
