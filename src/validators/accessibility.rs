// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessibility validator: interactive-element and ARIA checks.
//!
//! Direct checks over extracted facts, classified by axe-style impact:
//! - Every image needs an accessible name (alt, or an enclosing link with text)
//! - Every link, button, and custom interactive element needs an accessible name
//! - aria-hidden must not be set on focusable elements
//! - Form controls need associated labels
//! - The document needs a lang attribute
//!
//! Hidden elements are excluded from name checks; they still participate in
//! the aria-hidden-focus rule, which is about hiding itself.

use crate::extract::PageFacts;
use crate::model::{Findings, Severity, Violation, WcagLevel};
use crate::validators::Validator;
use url::Url;

/// Accessibility validator, tag-filterable by WCAG level
pub struct AccessibilityValidator {
    level: WcagLevel,
}

impl AccessibilityValidator {
    pub fn new(level: WcagLevel) -> Self {
        Self { level }
    }
}

/// (rule id, minimum WCAG level the rule applies from)
const RULES: &[(&str, WcagLevel)] = &[
    ("image-alt", WcagLevel::A),
    ("link-name", WcagLevel::A),
    ("button-name", WcagLevel::A),
    ("aria-hidden-focus", WcagLevel::A),
    ("label", WcagLevel::A),
    ("html-lang", WcagLevel::A),
];

const RULE_IDS: &[&str] = &[
    "image-alt",
    "link-name",
    "button-name",
    "aria-hidden-focus",
    "label",
    "html-lang",
];

fn rule_applies(rule_id: &str, level: WcagLevel) -> bool {
    RULES
        .iter()
        .find(|(id, _)| *id == rule_id)
        .map(|(_, min)| *min <= level)
        .unwrap_or(false)
}

impl Validator for AccessibilityValidator {
    fn name(&self) -> &'static str {
        "Accessibility"
    }

    fn rule_ids(&self) -> &'static [&'static str] {
        RULE_IDS
    }

    fn validate(&self, facts: &PageFacts, page_url: &Url) -> Findings {
        let mut findings = Findings::new();
        let url = page_url.as_str();

        if rule_applies("image-alt", self.level) {
            check_image_alt(facts, url, &mut findings);
        }
        if rule_applies("link-name", self.level) {
            check_names(facts, url, &mut findings);
        }
        if rule_applies("aria-hidden-focus", self.level) {
            check_aria_hidden_focus(facts, url, &mut findings);
        }
        if rule_applies("label", self.level) {
            check_labels(facts, url, &mut findings);
        }
        if rule_applies("html-lang", self.level) {
            check_lang(facts, url, &mut findings);
        }

        findings
    }
}

/// Images need an accessible name unless decorative, hidden, or wrapped in
/// a link that already carries text.
fn check_image_alt(facts: &PageFacts, url: &str, findings: &mut Findings) {
    for image in &facts.images {
        if image.hidden || image.decorative {
            continue;
        }
        let link_text_covers = image
            .enclosing_link_text
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false);
        if image.alt.is_none() && !link_text_covers {
            findings.violations.push(
                Violation::new(
                    "image-alt",
                    Severity::Critical,
                    "Image has no accessible name: missing alt attribute and no enclosing link text",
                )
                .with_category("image-alt")
                .with_element(&image.snippet)
                .with_suggestion(
                    "Add alt=\"description\" for informative images or alt=\"\" for decorative images",
                )
                .for_page(url),
            );
        }
    }
}

/// Links, buttons, and role-driven widgets need an accessible name.
fn check_names(facts: &PageFacts, url: &str, findings: &mut Findings) {
    for el in &facts.aria {
        if el.hidden || el.accessible_name.is_some() || el.is_form_control() {
            continue;
        }
        let (rule_id, severity, what) = match (el.tag.as_str(), el.role.as_deref()) {
            ("a", _) | (_, Some("link")) => ("link-name", Severity::Serious, "Link"),
            ("button", _) | (_, Some("button")) => ("button-name", Severity::Critical, "Button"),
            ("input", _) => continue, // covered by the label rule
            (_, Some(role)) => {
                findings.violations.push(
                    Violation::new(
                        "button-name",
                        Severity::Serious,
                        &format!("Element with role=\"{}\" has no accessible name", role),
                    )
                    .with_category("aria")
                    .with_element(&el.snippet)
                    .with_suggestion("Add aria-label or visible text content")
                    .for_page(url),
                );
                continue;
            }
            _ => continue,
        };
        findings.violations.push(
            Violation::new(
                rule_id,
                severity,
                &format!(
                    "{} has no accessible name: no text content, aria-label, aria-labelledby, or title",
                    what
                ),
            )
            .with_category("aria")
            .with_element(&el.snippet)
            .with_suggestion("Add visible text or an aria-label describing the action")
            .for_page(url),
        );
    }
}

/// aria-hidden="true" on a focusable element hides it from screen readers
/// while leaving it in the tab order.
fn check_aria_hidden_focus(facts: &PageFacts, url: &str, findings: &mut Findings) {
    for el in &facts.aria {
        if el.aria_hidden && el.focusable {
            findings.violations.push(
                Violation::new(
                    "aria-hidden-focus",
                    Severity::Serious,
                    &format!(
                        "aria-hidden=\"true\" on a focusable <{}>: hidden from screen readers but still keyboard-reachable",
                        el.tag
                    ),
                )
                .with_category("aria")
                .with_element(&el.snippet)
                .with_suggestion("Remove aria-hidden or add tabindex=\"-1\"")
                .for_page(url),
            );
        }
    }
}

/// Form controls need an associated label.
fn check_labels(facts: &PageFacts, url: &str, findings: &mut Findings) {
    for el in &facts.aria {
        if el.hidden || !el.is_form_control() {
            continue;
        }
        if !el.has_label && el.accessible_name.is_none() {
            findings.violations.push(
                Violation::new(
                    "label",
                    Severity::Critical,
                    &format!("<{}> has no associated label or accessible name", el.tag),
                )
                .with_category("form-labels")
                .with_element(&el.snippet)
                .with_suggestion(
                    "Associate a <label for=\"id\"> with the control, or wrap it in a <label>",
                )
                .for_page(url),
            );
        }
    }
}

/// The document language must be declared for screen readers.
fn check_lang(facts: &PageFacts, url: &str, findings: &mut Findings) {
    let missing = facts
        .meta
        .lang
        .as_deref()
        .map(|l| l.trim().is_empty())
        .unwrap_or(true);
    if missing {
        findings.violations.push(
            Violation::new(
                "html-lang",
                Severity::Serious,
                "<html> element has no lang attribute",
            )
            .with_category("aria")
            .with_suggestion("Add lang=\"en\" (or the page language) to the <html> element")
            .for_page(url),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    fn validate(html: &str) -> Findings {
        let url = Url::parse("https://example.com/").unwrap();
        let facts = extract::extract(html, &url, &url);
        AccessibilityValidator::new(WcagLevel::AA).validate(&facts, &url)
    }

    fn by_rule<'a>(findings: &'a Findings, rule: &str) -> Vec<&'a Violation> {
        findings.violations.iter().filter(|v| v.rule_id == rule).collect()
    }

    #[test]
    fn test_clean_page_passes() {
        let html = r#"
            <html lang="en"><body>
                <a href="/services">Septic pumping services</a>
                <button aria-label="Open menu"></button>
                <img src="truck.jpg" alt="Our pump truck">
                <label for="email">Email</label>
                <input type="email" id="email">
            </body></html>
        "#;
        let findings = validate(html);
        assert!(findings.violations.is_empty(), "{:?}", findings.violations);
    }

    #[test]
    fn test_img_without_alt_exactly_one_violation() {
        let html = r#"<html lang="en"><body><img src="hero.jpg"></body></html>"#;
        let findings = validate(html);
        let hits = by_rule(&findings, "image-alt");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].severity, Severity::Critical);
    }

    #[test]
    fn test_img_in_link_with_text_passes() {
        let html = r#"<html lang="en"><body>
            <a href="/"><img src="logo.png">Acme Septic</a>
        </body></html>"#;
        let findings = validate(html);
        assert!(by_rule(&findings, "image-alt").is_empty());
    }

    #[test]
    fn test_decorative_image_passes() {
        let html = r#"<html lang="en"><body><img src="divider.png" role="presentation"></body></html>"#;
        let findings = validate(html);
        assert!(by_rule(&findings, "image-alt").is_empty());
    }

    #[test]
    fn test_empty_link_flagged() {
        let html = r#"<html lang="en"><body><a href="/offers"><i class="arrow"></i></a></body></html>"#;
        let findings = validate(html);
        assert_eq!(by_rule(&findings, "link-name").len(), 1);
    }

    #[test]
    fn test_icon_button_flagged() {
        let html = r#"<html lang="en"><body><button><i class="icon-x"></i></button></body></html>"#;
        let findings = validate(html);
        let hits = by_rule(&findings, "button-name");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].severity, Severity::Critical);
    }

    #[test]
    fn test_aria_hidden_focusable_flagged() {
        let html = r#"<html lang="en"><body><button aria-hidden="true">Hidden</button></body></html>"#;
        let findings = validate(html);
        assert_eq!(by_rule(&findings, "aria-hidden-focus").len(), 1);
    }

    #[test]
    fn test_unlabelled_input_flagged() {
        let html = r#"<html lang="en"><body><form><input type="text" name="q"></form></body></html>"#;
        let findings = validate(html);
        assert_eq!(by_rule(&findings, "label").len(), 1);
    }

    #[test]
    fn test_missing_lang_flagged() {
        let findings = validate("<html><body><p>Hi</p></body></html>");
        assert_eq!(by_rule(&findings, "html-lang").len(), 1);
    }

    #[test]
    fn test_hidden_elements_skipped() {
        let html = r#"
            <html lang="en"><body>
                <div style="display: none">
                    <img src="preload.jpg">
                    <button></button>
                </div>
            </body></html>
        "#;
        let findings = validate(html);
        assert!(findings.violations.is_empty(), "{:?}", findings.violations);
    }

    #[test]
    fn test_all_rules_declared() {
        let v = AccessibilityValidator::new(WcagLevel::AA);
        let html = r#"<html><body><img src="x.jpg"><a href="/x"></a><button></button><input type="text"></body></html>"#;
        let url = Url::parse("https://example.com/").unwrap();
        let facts = extract::extract(html, &url, &url);
        let findings = v.validate(&facts, &url);
        for violation in &findings.violations {
            assert!(
                v.rule_ids().contains(&violation.rule_id.as_str()),
                "unknown rule id {}",
                violation.rule_id
            );
        }
    }
}
