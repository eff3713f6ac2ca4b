// SPDX-License-Identifier: PMPL-1.0-or-later
//! Fact extraction from a rendered or raw HTML document.
//!
//! Extraction is deterministic: the same HTML string always yields the same
//! [`PageFacts`], with no reliance on timing or network state. Validators
//! never touch the DOM directly; everything they need is pulled out here.

pub mod aria;
pub mod jsonld;
pub mod links;
pub mod meta;
pub mod style;

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use url::Url;

pub use aria::AriaFact;
pub use jsonld::JsonLdFact;
pub use links::{ImageFact, LinkFact};
pub use meta::MetaFacts;
pub use style::{ColorPairFact, Rgb};

/// Everything a validator can know about one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageFacts {
    /// Hyperlinks, resolved and classified internal/external
    pub links: Vec<LinkFact>,
    /// Images, resolved and classified internal/external
    pub images: Vec<ImageFact>,
    /// Title, description, OG/Twitter tags, canonical, h1 count
    pub meta: MetaFacts,
    /// JSON-LD blocks, parsed or carrying a structured parse error
    pub json_ld: Vec<JsonLdFact>,
    /// Interactive elements with computed accessible names
    pub aria: Vec<AriaFact>,
    /// Foreground/background color pairs for visible text
    pub color_pairs: Vec<ColorPairFact>,
}

/// Extract all facts from an HTML document.
///
/// `page_url` resolves relative links; `base` classifies them as internal
/// or external.
pub fn extract(html: &str, page_url: &Url, base: &Url) -> PageFacts {
    let document = Html::parse_document(html);
    PageFacts {
        links: links::extract_links(&document, page_url, base),
        images: links::extract_images(&document, page_url, base),
        meta: meta::extract_meta(&document),
        json_ld: jsonld::extract_json_ld(&document),
        aria: aria::extract_interactive(&document),
        color_pairs: style::extract_color_pairs(&document),
    }
}

/// Serialize an element's open tag for report snippets. Attributes are
/// sorted by name so the output is stable across runs.
pub(crate) fn open_tag(el: &ElementRef) -> String {
    let mut attrs: Vec<(&str, &str)> = el.value().attrs().collect();
    attrs.sort_by_key(|(name, _)| *name);
    let rendered: String = attrs
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", name, value))
        .collect();
    format!("<{}{}>", el.value().name(), rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_is_deterministic() {
        let html = r#"
            <html><head><title>Acme Septic | Home</title></head>
            <body>
                <h1>Septic pumping</h1>
                <a href="/services">Services</a>
                <img src="/truck.jpg" alt="Pump truck">
                <script type="application/ld+json">{"@context":"https://schema.org","@type":"WebPage","name":"Home"}</script>
            </body></html>
        "#;
        let page = Url::parse("https://example.com/").unwrap();
        let base = page.clone();

        let a = extract(html, &page, &base);
        let b = extract(html, &page, &base);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_extract_collects_all_fact_kinds() {
        let html = r#"
            <html><head><title>T</title></head>
            <body style="color: #333">
                <h1>Heading</h1>
                <p>Visible text</p>
                <a href="/about">About</a>
                <img src="logo.png" alt="Logo">
                <script type="application/ld+json">{"@context":"https://schema.org","@type":"WebPage"}</script>
            </body></html>
        "#;
        let page = Url::parse("https://example.com/").unwrap();
        let facts = extract(html, &page, &page);

        assert_eq!(facts.links.len(), 1);
        assert_eq!(facts.images.len(), 1);
        assert_eq!(facts.json_ld.len(), 1);
        assert_eq!(facts.meta.h1_count, 1);
        assert!(!facts.aria.is_empty());
        assert!(!facts.color_pairs.is_empty());
    }

    #[test]
    fn test_open_tag_attrs_sorted() {
        let html = r#"<img src="a.png" alt="x" class="hero">"#;
        let doc = Html::parse_document(html);
        let sel = scraper::Selector::parse("img").unwrap();
        let el = doc.select(&sel).next().unwrap();
        assert_eq!(open_tag(&el), r#"<img alt="x" class="hero" src="a.png">"#);
    }
}
