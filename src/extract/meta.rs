// SPDX-License-Identifier: PMPL-1.0-or-later
//! Meta-tag extraction: title, description, Open Graph, Twitter Card,
//! canonical link, robots directives, and heading counts.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Document-level metadata facts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaFacts {
    /// <title> text, trimmed
    pub title: Option<String>,
    /// <meta name="description"> content
    pub description: Option<String>,
    /// <link rel="canonical"> href
    pub canonical: Option<String>,
    /// Open Graph tags keyed by full property name (e.g. "og:title")
    pub og: BTreeMap<String, String>,
    /// Twitter Card tags keyed by full name (e.g. "twitter:card")
    pub twitter: BTreeMap<String, String>,
    /// <meta name="robots"> content
    pub robots: Option<String>,
    /// lang attribute on <html>
    pub lang: Option<String>,
    /// Number of <h1> elements
    pub h1_count: usize,
}

/// Extract metadata facts from a document.
pub fn extract_meta(document: &Html) -> MetaFacts {
    let title_sel = Selector::parse("head title").expect("valid selector");
    let meta_sel = Selector::parse("meta").expect("valid selector");
    let canonical_sel = Selector::parse("link[rel=\"canonical\"]").expect("valid selector");
    let h1_sel = Selector::parse("h1").expect("valid selector");
    let html_sel = Selector::parse("html").expect("valid selector");

    let mut facts = MetaFacts {
        title: document.select(&title_sel).next().map(|t| {
            t.text().collect::<String>().trim().to_string()
        }),
        canonical: document
            .select(&canonical_sel)
            .next()
            .and_then(|l| l.value().attr("href"))
            .map(String::from),
        lang: document
            .select(&html_sel)
            .next()
            .and_then(|h| h.value().attr("lang"))
            .map(String::from),
        h1_count: document.select(&h1_sel).count(),
        ..MetaFacts::default()
    };

    for meta in document.select(&meta_sel) {
        let content = match meta.value().attr("content") {
            Some(c) => c.trim().to_string(),
            None => continue,
        };

        // OG tags use property=, Twitter and plain meta use name=
        if let Some(property) = meta.value().attr("property") {
            if property.starts_with("og:") {
                facts.og.entry(property.to_string()).or_insert(content);
                continue;
            }
        }

        if let Some(name) = meta.value().attr("name") {
            match name {
                "description" => {
                    facts.description.get_or_insert(content);
                }
                "robots" => {
                    facts.robots.get_or_insert(content);
                }
                n if n.starts_with("twitter:") => {
                    facts.twitter.entry(n.to_string()).or_insert(content);
                }
                _ => {}
            }
        }
    }

    facts
}
