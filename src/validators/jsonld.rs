// SPDX-License-Identifier: PMPL-1.0-or-later
//! JSON-LD structured-data validator.
//!
//! Every block must parse, declare `@context: https://schema.org`, and carry
//! an `@type`. Known types have required-property checklists; one violation
//! is produced per missing property so reports pinpoint exactly what to add.
//! Unknown types are advisories, not failures.

use crate::extract::PageFacts;
use crate::model::{Findings, Severity, Violation};
use crate::validators::Validator;
use serde_json::Value;
use url::Url;

const SCHEMA_ORG: &str = "https://schema.org";

/// Required properties per known schema.org type
const REQUIRED_PROPERTIES: &[(&str, &[&str])] = &[
    ("LocalBusiness", &["name", "address", "telephone", "url"]),
    ("Service", &["name", "provider"]),
    ("BreadcrumbList", &["itemListElement"]),
    ("FAQPage", &["mainEntity"]),
    ("Article", &["headline", "author", "datePublished"]),
    ("WebPage", &["name"]),
];

const RULE_IDS: &[&str] = &[
    "jsonld-parse",
    "jsonld-context",
    "jsonld-type",
    "jsonld-required",
    "jsonld-address-type",
    "breadcrumb-item",
    "jsonld-unknown-type",
];

/// JSON-LD validator
pub struct JsonLdValidator;

impl Validator for JsonLdValidator {
    fn name(&self) -> &'static str {
        "Structured data"
    }

    fn rule_ids(&self) -> &'static [&'static str] {
        RULE_IDS
    }

    fn validate(&self, facts: &PageFacts, page_url: &Url) -> Findings {
        let mut findings = Findings::new();
        let url = page_url.as_str();

        for block in &facts.json_ld {
            match (&block.value, &block.parse_error) {
                (None, Some(error)) => {
                    findings.violations.push(
                        Violation::new(
                            "jsonld-parse",
                            Severity::Serious,
                            &format!("JSON-LD block does not parse: {}", error),
                        )
                        .with_category("structured-data")
                        .with_element(&block.raw)
                        .with_suggestion("Fix the JSON syntax; validate with a JSON linter")
                        .for_page(url),
                    );
                }
                (Some(value), _) => {
                    let inherited = has_schema_context(value);
                    for entity in entities(value) {
                        validate_entity(entity, inherited, url, &mut findings);
                    }
                }
                (None, None) => {}
            }
        }

        findings
    }
}

/// Flatten a block into its entities: a bare object, a top-level array, or
/// an `@graph` wrapper.
fn entities(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![value],
        },
        _ => vec![value],
    }
}

fn has_schema_context(entity: &Value) -> bool {
    match entity.get("@context") {
        Some(Value::String(s)) => normalized_context(s),
        Some(Value::Array(items)) => items
            .iter()
            .any(|i| i.as_str().map(normalized_context).unwrap_or(false)),
        _ => false,
    }
}

fn normalized_context(s: &str) -> bool {
    let trimmed = s.trim_end_matches('/');
    trimmed == SCHEMA_ORG || trimmed == "http://schema.org"
}

fn validate_entity(entity: &Value, inherited_context: bool, url: &str, findings: &mut Findings) {
    let Some(map) = entity.as_object() else {
        findings.violations.push(
            Violation::new(
                "jsonld-type",
                Severity::Serious,
                "JSON-LD entity is not an object",
            )
            .with_category("structured-data")
            .for_page(url),
        );
        return;
    };

    // @graph members inherit the wrapper's @context
    if !inherited_context && !has_schema_context(entity) {
        findings.violations.push(
            Violation::new(
                "jsonld-context",
                Severity::Serious,
                &format!("JSON-LD entity is missing \"@context\": \"{}\"", SCHEMA_ORG),
            )
            .with_category("structured-data")
            .with_suggestion(&format!("Set \"@context\": \"{}\"", SCHEMA_ORG))
            .for_page(url),
        );
    }

    let Some(entity_type) = map.get("@type").and_then(Value::as_str) else {
        findings.violations.push(
            Violation::new(
                "jsonld-type",
                Severity::Serious,
                "JSON-LD entity is missing an @type",
            )
            .with_category("structured-data")
            .with_suggestion("Add an @type such as LocalBusiness, Service, or WebPage")
            .for_page(url),
        );
        return;
    };

    let Some((_, required)) = REQUIRED_PROPERTIES.iter().find(|(t, _)| *t == entity_type) else {
        findings.advisories.push(
            Violation::new(
                "jsonld-unknown-type",
                Severity::Info,
                &format!("No checklist for @type \"{}\"; properties not verified", entity_type),
            )
            .with_category("structured-data")
            .for_page(url),
        );
        return;
    };

    for property in *required {
        let present = map
            .get(*property)
            .map(|v| !v.is_null() && v.as_str().map(|s| !s.is_empty()).unwrap_or(true))
            .unwrap_or(false);
        if !present {
            findings.violations.push(
                Violation::new(
                    "jsonld-required",
                    Severity::Serious,
                    &format!("{} is missing required property \"{}\"", entity_type, property),
                )
                .with_category("structured-data")
                .with_suggestion(&format!("Add the \"{}\" property to the {} block", property, entity_type))
                .for_page(url),
            );
        }
    }

    if entity_type == "LocalBusiness" {
        check_postal_address(map, url, findings);
    }
    if entity_type == "BreadcrumbList" {
        check_breadcrumbs(map, url, findings);
    }
}

/// LocalBusiness.address must itself be typed PostalAddress.
fn check_postal_address(map: &serde_json::Map<String, Value>, url: &str, findings: &mut Findings) {
    let Some(address) = map.get("address") else {
        return; // already reported as a missing required property
    };
    let typed = address.get("@type").and_then(Value::as_str) == Some("PostalAddress");
    if !typed {
        findings.violations.push(
            Violation::new(
                "jsonld-address-type",
                Severity::Serious,
                "LocalBusiness address must be an object with \"@type\": \"PostalAddress\"",
            )
            .with_category("structured-data")
            .with_suggestion("Wrap the address in a PostalAddress object")
            .for_page(url),
        );
    }
}

/// Breadcrumb items must each be a ListItem carrying position, name, and item.
fn check_breadcrumbs(map: &serde_json::Map<String, Value>, url: &str, findings: &mut Findings) {
    let Some(Value::Array(items)) = map.get("itemListElement") else {
        return;
    };
    for (index, item) in items.iter().enumerate() {
        let is_list_item = item.get("@type").and_then(Value::as_str) == Some("ListItem");
        let missing: Vec<&str> = ["position", "name", "item"]
            .iter()
            .copied()
            .filter(|p| item.get(*p).map(Value::is_null).unwrap_or(true))
            .collect();

        if !is_list_item || !missing.is_empty() {
            let mut problems = Vec::new();
            if !is_list_item {
                problems.push("@type must be ListItem".to_string());
            }
            if !missing.is_empty() {
                problems.push(format!("missing {}", missing.join(", ")));
            }
            findings.violations.push(
                Violation::new(
                    "breadcrumb-item",
                    Severity::Serious,
                    &format!("BreadcrumbList item {} invalid: {}", index + 1, problems.join("; ")),
                )
                .with_category("structured-data")
                .with_suggestion(
                    "Each item needs @type: ListItem with position, name, and item",
                )
                .for_page(url),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;

    fn validate(html: &str) -> Findings {
        let url = Url::parse("https://example.com/").unwrap();
        let facts = extract::extract(html, &url, &url);
        JsonLdValidator.validate(&facts, &url)
    }

    fn block(json: &str) -> String {
        format!(r#"<script type="application/ld+json">{}</script>"#, json)
    }

    #[test]
    fn test_complete_local_business_passes() {
        let html = block(
            r#"{
                "@context": "https://schema.org",
                "@type": "LocalBusiness",
                "name": "Acme Septic",
                "telephone": "+1-555-123-4567",
                "url": "https://example.com",
                "address": {
                    "@type": "PostalAddress",
                    "streetAddress": "100 Main St",
                    "addressLocality": "Ruston"
                }
            }"#,
        );
        let findings = validate(&html);
        assert!(findings.violations.is_empty(), "{:?}", findings.violations);
    }

    #[test]
    fn test_missing_telephone_exactly_one_violation() {
        let html = block(
            r#"{
                "@context": "https://schema.org",
                "@type": "LocalBusiness",
                "name": "Acme Septic",
                "url": "https://example.com",
                "address": {"@type": "PostalAddress"}
            }"#,
        );
        let findings = validate(&html);
        assert_eq!(findings.violations.len(), 1);
        assert_eq!(findings.violations[0].rule_id, "jsonld-required");
        assert!(findings.violations[0].message.contains("telephone"));
    }

    #[test]
    fn test_untyped_address_flagged() {
        let html = block(
            r#"{
                "@context": "https://schema.org",
                "@type": "LocalBusiness",
                "name": "Acme",
                "telephone": "x",
                "url": "https://example.com",
                "address": {"streetAddress": "100 Main St"}
            }"#,
        );
        let findings = validate(&html);
        assert!(findings.violations.iter().any(|v| v.rule_id == "jsonld-address-type"));
    }

    #[test]
    fn test_parse_failure_is_violation_not_panic() {
        let html = block(r#"{"@type": "#);
        let findings = validate(&html);
        assert_eq!(findings.violations.len(), 1);
        assert_eq!(findings.violations[0].rule_id, "jsonld-parse");
    }

    #[test]
    fn test_missing_context_flagged() {
        let html = block(r#"{"@type": "WebPage", "name": "Home"}"#);
        let findings = validate(&html);
        assert!(findings.violations.iter().any(|v| v.rule_id == "jsonld-context"));
    }

    #[test]
    fn test_http_context_accepted() {
        let html = block(r#"{"@context": "http://schema.org", "@type": "WebPage", "name": "Home"}"#);
        let findings = validate(&html);
        assert!(!findings.violations.iter().any(|v| v.rule_id == "jsonld-context"));
    }

    #[test]
    fn test_missing_type_flagged() {
        let html = block(r#"{"@context": "https://schema.org", "name": "Home"}"#);
        let findings = validate(&html);
        assert!(findings.violations.iter().any(|v| v.rule_id == "jsonld-type"));
    }

    #[test]
    fn test_breadcrumb_items_validated() {
        let html = block(
            r#"{
                "@context": "https://schema.org",
                "@type": "BreadcrumbList",
                "itemListElement": [
                    {"@type": "ListItem", "position": 1, "name": "Home", "item": "https://example.com/"},
                    {"@type": "ListItem", "position": 2, "name": "Services"}
                ]
            }"#,
        );
        let findings = validate(&html);
        let hits: Vec<_> = findings
            .violations
            .iter()
            .filter(|v| v.rule_id == "breadcrumb-item")
            .collect();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].message.contains("item 2"));
        assert!(hits[0].message.contains("item"));
    }

    #[test]
    fn test_graph_entities_validated() {
        let html = block(
            r#"{
                "@context": "https://schema.org",
                "@graph": [
                    {"@type": "WebPage", "name": "Home"},
                    {"@type": "FAQPage"}
                ]
            }"#,
        );
        let findings = validate(&html);
        assert!(findings
            .violations
            .iter()
            .any(|v| v.rule_id == "jsonld-required" && v.message.contains("mainEntity")));
        // @graph members inherit the wrapper's context
        assert!(!findings.violations.iter().any(|v| v.rule_id == "jsonld-context"));
    }

    #[test]
    fn test_unknown_type_is_advisory() {
        let html = block(r#"{"@context": "https://schema.org", "@type": "Organization", "name": "Acme"}"#);
        let findings = validate(&html);
        assert!(findings.violations.is_empty());
        assert!(findings.advisories.iter().any(|v| v.rule_id == "jsonld-unknown-type"));
    }
}
