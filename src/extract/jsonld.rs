// SPDX-License-Identifier: PMPL-1.0-or-later
//! JSON-LD block extraction.
//!
//! Every `<script type="application/ld+json">` body is parsed as JSON. A
//! parse failure is recorded as a structured fact, never thrown -- the
//! validator turns it into a violation.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Truncation bound for raw JSON-LD carried in facts
const MAX_RAW_LEN: usize = 2_000;

/// One structured-data block found on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonLdFact {
    /// Raw script body, truncated for reporting
    pub raw: String,
    /// Parsed JSON value; None when parsing failed
    pub value: Option<serde_json::Value>,
    /// Parse error message; Some exactly when `value` is None
    pub parse_error: Option<String>,
}

/// Extract every JSON-LD block from a document.
pub fn extract_json_ld(document: &Html) -> Vec<JsonLdFact> {
    let selector =
        Selector::parse("script[type=\"application/ld+json\"]").expect("valid selector");

    document
        .select(&selector)
        .map(|script| {
            let body: String = script.text().collect();
            let body = body.trim();
            let mut raw = body.to_string();
            if raw.len() > MAX_RAW_LEN {
                let mut end = MAX_RAW_LEN;
                while !raw.is_char_boundary(end) {
                    end -= 1;
                }
                raw.truncate(end);
            }

            match serde_json::from_str::<serde_json::Value>(body) {
                Ok(value) => JsonLdFact { raw, value: Some(value), parse_error: None },
                Err(e) => JsonLdFact { raw, value: None, parse_error: Some(e.to_string()) },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_block_parsed() {
        let html = r#"
            <script type="application/ld+json">
            {"@context": "https://schema.org", "@type": "LocalBusiness", "name": "Acme Septic"}
            </script>
        "#;
        let blocks = extract_json_ld(&Html::parse_document(html));
        assert_eq!(blocks.len(), 1);
        let value = blocks[0].value.as_ref().unwrap();
        assert_eq!(value["@type"], "LocalBusiness");
        assert!(blocks[0].parse_error.is_none());
    }

    #[test]
    fn test_malformed_block_recorded_not_thrown() {
        let html = r#"<script type="application/ld+json">{"@type": </script>"#;
        let blocks = extract_json_ld(&Html::parse_document(html));
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].value.is_none());
        assert!(blocks[0].parse_error.is_some());
    }

    #[test]
    fn test_other_scripts_ignored() {
        let html = r#"
            <script>console.log("hi")</script>
            <script type="application/json">{"x": 1}</script>
        "#;
        let blocks = extract_json_ld(&Html::parse_document(html));
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_multiple_blocks() {
        let html = r#"
            <script type="application/ld+json">{"@context":"https://schema.org","@type":"WebPage"}</script>
            <script type="application/ld+json">{"@context":"https://schema.org","@type":"FAQPage","mainEntity":[]}</script>
        "#;
        let blocks = extract_json_ld(&Html::parse_document(html));
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.value.is_some()));
    }
}
