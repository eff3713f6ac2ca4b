// SPDX-License-Identifier: PMPL-1.0-or-later
//! Link and image extraction.
//!
//! Relative URLs are resolved against the page URL; each resolved URL is
//! classified as internal (same host as the base URL) or external. Only
//! http/https targets are kept -- mailto:, tel:, javascript: and data: are
//! not auditable link targets.

use crate::extract::{aria, open_tag};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// One hyperlink discovered on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkFact {
    /// Raw href attribute as authored
    pub href: String,
    /// Resolved absolute URL
    pub url: String,
    /// Same host as the configured base URL
    pub internal: bool,
    /// Visible link text, trimmed
    pub text: String,
}

/// One image discovered on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFact {
    /// Raw src attribute as authored
    pub src: String,
    /// Resolved absolute URL
    pub url: String,
    /// Same host as the configured base URL
    pub internal: bool,
    /// Alt attribute; None when missing entirely (distinct from alt="")
    pub alt: Option<String>,
    /// Marked decorative via role="presentation"/"none" or aria-hidden
    pub decorative: bool,
    /// Trimmed text of an enclosing <a>, when one exists
    pub enclosing_link_text: Option<String>,
    /// Hidden from rendering or assistive technology
    pub hidden: bool,
    /// Open tag for report snippets
    pub snippet: String,
}

/// Resolve an href/src against the page URL, keeping only http/https.
fn resolve(raw: &str, page_url: &Url) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let resolved = page_url.join(trimmed).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Extract all auditable hyperlinks from a document.
pub fn extract_links(document: &Html, page_url: &Url, base: &Url) -> Vec<LinkFact> {
    let selector = Selector::parse("a[href]").expect("valid selector");
    document
        .select(&selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let resolved = resolve(href, page_url)?;
            Some(LinkFact {
                href: href.to_string(),
                url: resolved.to_string(),
                internal: crate::crawl::is_internal(&resolved, base),
                text: el.text().collect::<String>().trim().to_string(),
            })
        })
        .collect()
}

/// Extract all images from a document.
pub fn extract_images(document: &Html, page_url: &Url, base: &Url) -> Vec<ImageFact> {
    let selector = Selector::parse("img").expect("valid selector");
    document
        .select(&selector)
        .filter_map(|el| {
            let src = el.value().attr("src")?;
            let resolved = resolve(src, page_url)?;

            let role = el.value().attr("role").unwrap_or("");
            let decorative = role == "presentation"
                || role == "none"
                || el.value().attr("aria-hidden") == Some("true");

            let enclosing_link_text = el
                .ancestors()
                .filter_map(scraper::ElementRef::wrap)
                .find(|a| a.value().name() == "a")
                .map(|a| a.text().collect::<String>().trim().to_string());

            Some(ImageFact {
                src: src.to_string(),
                url: resolved.to_string(),
                internal: crate::crawl::is_internal(&resolved, base),
                alt: el.value().attr("alt").map(String::from),
                decorative,
                enclosing_link_text,
                hidden: aria::is_hidden(&el),
                snippet: open_tag(&el),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    fn base() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_relative_links_resolved() {
        let d = doc(r#"<a href="/services">Services</a><a href="faq">FAQ</a>"#);
        let page = Url::parse("https://example.com/pricing/").unwrap();
        let links = extract_links(&d, &page, &base());

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://example.com/services");
        assert_eq!(links[1].url, "https://example.com/pricing/faq");
    }

    #[test]
    fn test_internal_external_classification() {
        let d = doc(r#"
            <a href="/about">About</a>
            <a href="https://maps.google.com/?q=acme">Map</a>
        "#);
        let links = extract_links(&d, &base(), &base());
        assert!(links[0].internal);
        assert!(!links[1].internal);
    }

    #[test]
    fn test_non_http_schemes_skipped() {
        let d = doc(r#"
            <a href="mailto:office@example.com">Email</a>
            <a href="tel:+15551234567">Call</a>
            <a href="javascript:void(0)">Menu</a>
            <a href="/contact">Contact</a>
        "#);
        let links = extract_links(&d, &base(), &base());
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/contact");
    }

    #[test]
    fn test_image_alt_missing_vs_empty() {
        let d = doc(r#"<img src="a.png"><img src="b.png" alt="">"#);
        let images = extract_images(&d, &base(), &base());
        assert_eq!(images[0].alt, None);
        assert_eq!(images[1].alt, Some(String::new()));
    }

    #[test]
    fn test_image_enclosing_link_text() {
        let d = doc(r#"<a href="/home"><img src="logo.png">Acme Septic</a>"#);
        let images = extract_images(&d, &base(), &base());
        assert_eq!(images[0].enclosing_link_text.as_deref(), Some("Acme Septic"));
    }

    #[test]
    fn test_decorative_image_flagged() {
        let d = doc(r#"<img src="divider.png" role="presentation">"#);
        let images = extract_images(&d, &base(), &base());
        assert!(images[0].decorative);
    }

    #[test]
    fn test_data_uri_images_skipped() {
        let d = doc(r#"<img src="data:image/png;base64,iVBOR"><img src="/real.png" alt="x">"#);
        let images = extract_images(&d, &base(), &base());
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].src, "/real.png");
    }
}
