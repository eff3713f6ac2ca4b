// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast validator.
//!
//! Applies WCAG 2.0 thresholds to the extracted color pairs:
//! - AA: 4.5:1 for normal text, 3:1 for large text
//! - AAA: 7:1 for normal text, 4.5:1 for large text
//!
//! Contrast is undefined at level A, so the validator produces nothing
//! there.

use crate::extract::{PageFacts, Rgb};
use crate::model::{Findings, Severity, Violation, WcagLevel};
use crate::validators::Validator;
use url::Url;

/// Contrast validator for extracted color pairs
pub struct ContrastValidator {
    level: WcagLevel,
}

impl ContrastValidator {
    pub fn new(level: WcagLevel) -> Self {
        Self { level }
    }
}

const RULE_IDS: &[&str] = &["color-contrast"];

/// Relative luminance per WCAG 2.x
/// <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>
pub fn relative_luminance(color: Rgb) -> f64 {
    let channel = |c: u8| {
        let v = c as f64 / 255.0;
        if v <= 0.03928 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * channel(color.r) + 0.7152 * channel(color.g) + 0.0722 * channel(color.b)
}

/// Contrast ratio between two colors, always >= 1.0
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (lighter, darker) = if la > lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Minimum required ratio for a text class at a conformance level. None at
/// level A, where WCAG imposes no contrast requirement.
pub fn required_ratio(level: WcagLevel, large_text: bool) -> Option<f64> {
    match (level, large_text) {
        (WcagLevel::A, _) => None,
        (WcagLevel::AA, false) => Some(4.5),
        (WcagLevel::AA, true) => Some(3.0),
        (WcagLevel::AAA, false) => Some(7.0),
        (WcagLevel::AAA, true) => Some(4.5),
    }
}

impl Validator for ContrastValidator {
    fn name(&self) -> &'static str {
        "Contrast"
    }

    fn rule_ids(&self) -> &'static [&'static str] {
        RULE_IDS
    }

    fn validate(&self, facts: &PageFacts, page_url: &Url) -> Findings {
        let mut findings = Findings::new();

        for pair in &facts.color_pairs {
            let Some(required) = required_ratio(self.level, pair.large_text) else {
                continue;
            };
            let ratio = contrast_ratio(pair.fg, pair.bg);
            if ratio < required {
                let text_class = if pair.large_text { "large" } else { "normal" };
                findings.violations.push(
                    Violation::new(
                        "color-contrast",
                        Severity::Serious,
                        &format!(
                            "Contrast ratio {:.2}:1 ({} on {}) is below the {} requirement of {}:1 for {} text",
                            ratio, pair.fg, pair.bg, self.level, required, text_class
                        ),
                    )
                    .with_category("color-contrast")
                    .with_element(&pair.snippet)
                    .with_suggestion(&format!(
                        "Adjust the text or background color to reach at least {}:1",
                        required
                    ))
                    .for_page(page_url.as_str()),
                );
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    #[test]
    fn test_black_on_white_is_21() {
        let ratio = contrast_ratio(Rgb::BLACK, Rgb::WHITE);
        assert!((ratio - 21.0).abs() < 0.1, "got {:.2}", ratio);
    }

    #[test]
    fn test_ratio_symmetric() {
        let a = Rgb::new(0x1a, 0x7f, 0x37);
        let b = Rgb::new(0xf0, 0xf0, 0xf0);
        assert!((contrast_ratio(a, b) - contrast_ratio(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_self_ratio_is_one() {
        let c = Rgb::new(128, 64, 200);
        assert!((contrast_ratio(c, c) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_luminance_extremes() {
        assert!((relative_luminance(Rgb::WHITE) - 1.0).abs() < 0.01);
        assert!(relative_luminance(Rgb::BLACK).abs() < 0.01);
    }

    #[test]
    fn test_thresholds_per_level() {
        assert_eq!(required_ratio(WcagLevel::A, false), None);
        assert_eq!(required_ratio(WcagLevel::AA, false), Some(4.5));
        assert_eq!(required_ratio(WcagLevel::AA, true), Some(3.0));
        assert_eq!(required_ratio(WcagLevel::AAA, false), Some(7.0));
        assert_eq!(required_ratio(WcagLevel::AAA, true), Some(4.5));
    }

    fn validate(html: &str, level: WcagLevel) -> Findings {
        let url = Url::parse("https://example.com/").unwrap();
        let facts = extract::extract(html, &url, &url);
        ContrastValidator::new(level).validate(&facts, &url)
    }

    #[test]
    fn test_good_contrast_passes() {
        let html = r#"<body><p style="color: #000; background-color: #fff">Readable</p></body>"#;
        let findings = validate(html, WcagLevel::AA);
        assert!(findings.violations.is_empty(), "{:?}", findings.violations);
    }

    #[test]
    fn test_poor_contrast_fails_aa() {
        let html = r#"<body><p style="color: #aaa; background-color: #ccc">Faint</p></body>"#;
        let findings = validate(html, WcagLevel::AA);
        assert_eq!(findings.violations.len(), 1);
        assert_eq!(findings.violations[0].rule_id, "color-contrast");
    }

    #[test]
    fn test_aa_pass_aaa_fail() {
        // #595959 on white is ~7.0:1 at the boundary; #767676 is ~4.54:1
        let html = r#"<body><p style="color: #767676; background-color: #ffffff">Mid gray</p></body>"#;
        assert!(validate(html, WcagLevel::AA).violations.is_empty());
        assert_eq!(validate(html, WcagLevel::AAA).violations.len(), 1);
    }

    #[test]
    fn test_large_text_threshold_relaxed() {
        // ~3.9:1 fails normal AA but passes large-text AA
        let html = r#"
            <body>
                <h1 style="color: #8a8a8a; background-color: #ffffff">Big heading</h1>
            </body>
        "#;
        let findings = validate(html, WcagLevel::AA);
        assert!(findings.violations.is_empty(), "{:?}", findings.violations);
    }

    #[test]
    fn test_level_a_produces_nothing() {
        let html = r#"<body><p style="color: #fff; background-color: #fff">Invisible</p></body>"#;
        assert!(validate(html, WcagLevel::A).violations.is_empty());
    }

    #[test]
    fn test_background_inherited_from_ancestor() {
        let html = r#"
            <body>
                <div style="background-color: #1a1a1a">
                    <p style="color: #2a2a2a">Dark on dark</p>
                </div>
            </body>
        "#;
        let findings = validate(html, WcagLevel::AA);
        assert!(!findings.violations.is_empty());
    }
}
