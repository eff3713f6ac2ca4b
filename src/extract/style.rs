// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color and typography resolution for contrast checking.
//!
//! Effective colors are resolved statically: inline styles and simple
//! `<style>` rules (tag, .class, #id selectors -- combinators are ignored).
//! Text color inherits down the tree; background color is found by walking
//! the ancestor chain until the first non-transparent background, defaulting
//! to white. Text is "large" at >= 24px, or >= 18.7px with bold weight.

use crate::extract::aria;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// An opaque sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A foreground/background pair for one visible text-bearing element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPairFact {
    /// Effective text color
    pub fg: Rgb,
    /// Effective background color
    pub bg: Rgb,
    /// Large text per WCAG (>= 24px, or >= 18.7px bold)
    pub large_text: bool,
    /// Open tag for report snippets
    pub snippet: String,
}

/// Parse a CSS color value into an opaque RGB color. Returns None for
/// transparent, fully-transparent rgba(), and values that cannot be
/// resolved statically (gradients, variables) -- callers treat None as
/// "keep walking".
pub fn parse_color(value: &str) -> Option<Rgb> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.starts_with('#') {
        parse_hex(&trimmed)
    } else if trimmed.starts_with("rgb") {
        parse_rgb_fn(&trimmed)
    } else {
        parse_named(&trimmed)
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(Rgb::new(r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb::new(r, g, b))
        }
        _ => None,
    }
}

fn rgb_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*([0-9.]+)\s*)?\)")
            .expect("valid regex")
    })
}

fn parse_rgb_fn(value: &str) -> Option<Rgb> {
    let caps = rgb_regex().captures(value)?;
    if let Some(alpha) = caps.get(4) {
        let alpha: f64 = alpha.as_str().parse().ok()?;
        if alpha == 0.0 {
            return None;
        }
    }
    Some(Rgb::new(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    ))
}

fn parse_named(name: &str) -> Option<Rgb> {
    let (r, g, b) = match name {
        "white" => (255, 255, 255),
        "black" => (0, 0, 0),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "gray" | "grey" => (128, 128, 128),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "olive" => (128, 128, 0),
        "lime" => (0, 255, 0),
        "aqua" | "cyan" => (0, 255, 255),
        "teal" => (0, 128, 128),
        "navy" => (0, 0, 128),
        "fuchsia" | "magenta" => (255, 0, 255),
        "purple" => (128, 0, 128),
        "orange" => (255, 165, 0),
        _ => return None,
    };
    Some(Rgb::new(r, g, b))
}

/// Look up a property in an element's inline style attribute.
pub fn inline_decl(el: &ElementRef, prop: &str) -> Option<String> {
    let style = el.value().attr("style")?;
    declaration(style, prop)
}

fn declaration(declarations: &str, prop: &str) -> Option<String> {
    for decl in declarations.split(';') {
        let mut parts = decl.splitn(2, ':');
        let name = parts.next()?.trim();
        if name.eq_ignore_ascii_case(prop) {
            return parts.next().map(|v| v.trim().to_string());
        }
    }
    None
}

/// A simple selector auditbot can match statically
#[derive(Debug, Clone, PartialEq)]
enum SimpleSelector {
    Tag(String),
    Class(String),
    Id(String),
    TagClass(String, String),
}

impl SimpleSelector {
    fn parse(selector: &str) -> Option<Self> {
        let s = selector.trim();
        if s.is_empty() || s.contains(' ') || s.contains('>') || s.contains(':') || s.contains('[') {
            return None;
        }
        if let Some(id) = s.strip_prefix('#') {
            return Some(SimpleSelector::Id(id.to_string()));
        }
        if let Some(class) = s.strip_prefix('.') {
            return Some(SimpleSelector::Class(class.to_string()));
        }
        if let Some(dot) = s.find('.') {
            return Some(SimpleSelector::TagClass(
                s[..dot].to_lowercase(),
                s[dot + 1..].to_string(),
            ));
        }
        Some(SimpleSelector::Tag(s.to_lowercase()))
    }

    fn specificity(&self) -> u8 {
        match self {
            SimpleSelector::Id(_) => 3,
            SimpleSelector::Class(_) | SimpleSelector::TagClass(_, _) => 2,
            SimpleSelector::Tag(_) => 1,
        }
    }

    fn matches(&self, el: &ElementRef) -> bool {
        let has_class = |class: &str| {
            el.value()
                .attr("class")
                .map(|c| c.split_whitespace().any(|x| x == class))
                .unwrap_or(false)
        };
        match self {
            SimpleSelector::Tag(tag) => el.value().name() == tag,
            SimpleSelector::Class(class) => has_class(class),
            SimpleSelector::Id(id) => el.value().attr("id") == Some(id.as_str()),
            SimpleSelector::TagClass(tag, class) => el.value().name() == tag && has_class(class),
        }
    }
}

/// Declarations gathered from the document's `<style>` blocks
#[derive(Debug, Default)]
pub struct Stylesheet {
    rules: Vec<(SimpleSelector, String)>,
}

impl Stylesheet {
    /// Parse every `<style>` block in a document. Rules with selectors that
    /// cannot be matched statically are dropped.
    pub fn parse(document: &Html) -> Self {
        static BLOCK_RE: OnceLock<Regex> = OnceLock::new();
        let block_re = BLOCK_RE
            .get_or_init(|| Regex::new(r"([^{}]+)\{([^}]*)\}").expect("valid regex"));

        let style_sel = Selector::parse("style").expect("valid selector");
        let mut rules = Vec::new();

        for style in document.select(&style_sel) {
            let css: String = style.text().collect();
            for caps in block_re.captures_iter(&css) {
                let declarations = caps[2].trim().to_string();
                for selector in caps[1].split(',') {
                    if let Some(parsed) = SimpleSelector::parse(selector) {
                        rules.push((parsed, declarations.clone()));
                    }
                }
            }
        }

        Self { rules }
    }

    /// Find the winning declared value of a property for an element:
    /// highest specificity, document order breaking ties. Inline styles
    /// always win over stylesheet rules.
    pub fn declared(&self, el: &ElementRef, prop: &str) -> Option<String> {
        if let Some(inline) = inline_decl(el, prop) {
            return Some(inline);
        }
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, (sel, _))| sel.matches(el))
            .filter_map(|(order, (sel, decls))| {
                declaration(decls, prop).map(|v| (sel.specificity(), order, v))
            })
            .max_by_key(|(spec, order, _)| (*spec, *order))
            .map(|(_, _, v)| v)
    }
}

/// Browser-default font sizes in px for elements that differ from body text
fn default_font_size(tag: &str) -> Option<f32> {
    match tag {
        "h1" => Some(32.0),
        "h2" => Some(24.0),
        "h3" => Some(18.72),
        "h4" => Some(16.0),
        "h5" => Some(13.28),
        "h6" => Some(10.72),
        "small" => Some(13.28),
        _ => None,
    }
}

/// Elements that are bold by default
const BOLD_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "b", "strong", "th"];

fn parse_font_size(value: &str) -> Option<f32> {
    let v = value.trim().to_lowercase();
    if let Some(px) = v.strip_suffix("px") {
        return px.trim().parse().ok();
    }
    if let Some(pt) = v.strip_suffix("pt") {
        return pt.trim().parse::<f32>().ok().map(|p| p * 4.0 / 3.0);
    }
    if let Some(rem) = v.strip_suffix("rem") {
        return rem.trim().parse::<f32>().ok().map(|r| r * 16.0);
    }
    None
}

fn parse_font_weight(value: &str) -> Option<u16> {
    match value.trim().to_lowercase().as_str() {
        "bold" | "bolder" => Some(700),
        "normal" => Some(400),
        "lighter" => Some(300),
        other => other.parse().ok(),
    }
}

fn self_and_ancestors<'a>(el: &ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    std::iter::once(**el)
        .chain(el.ancestors())
        .filter_map(ElementRef::wrap)
}

/// Effective text color: nearest declared `color` on the element or an
/// ancestor, defaulting to black.
pub fn effective_text_color(el: &ElementRef, sheet: &Stylesheet) -> Rgb {
    for node in self_and_ancestors(el) {
        if let Some(value) = sheet.declared(&node, "color") {
            if let Some(color) = parse_color(&value) {
                return color;
            }
        }
    }
    Rgb::BLACK
}

/// Effective background color: walk the ancestor chain until the first
/// non-transparent background, defaulting to white.
pub fn effective_background(el: &ElementRef, sheet: &Stylesheet) -> Rgb {
    for node in self_and_ancestors(el) {
        for prop in ["background-color", "background"] {
            if let Some(value) = sheet.declared(&node, prop) {
                // Shorthand backgrounds may carry images or positions;
                // take the first token that parses as a color
                if let Some(color) =
                    parse_color(&value).or_else(|| value.split_whitespace().find_map(parse_color))
                {
                    return color;
                }
            }
        }
    }
    Rgb::WHITE
}

/// Effective font size in px: nearest declared `font-size`, else the
/// nearest element-default (headings), else 16.
pub fn effective_font_size(el: &ElementRef, sheet: &Stylesheet) -> f32 {
    for node in self_and_ancestors(el) {
        if let Some(value) = sheet.declared(&node, "font-size") {
            if let Some(size) = parse_font_size(&value) {
                return size;
            }
        }
        if let Some(size) = default_font_size(node.value().name()) {
            return size;
        }
    }
    16.0
}

/// Effective font weight: nearest declared `font-weight`, else 700 for
/// elements that are bold by default, else 400.
pub fn effective_font_weight(el: &ElementRef, sheet: &Stylesheet) -> u16 {
    for node in self_and_ancestors(el) {
        if let Some(value) = sheet.declared(&node, "font-weight") {
            if let Some(weight) = parse_font_weight(&value) {
                return weight;
            }
        }
        if BOLD_TAGS.contains(&node.value().name()) {
            return 700;
        }
    }
    400
}

/// WCAG large-text classification
pub fn is_large_text(font_size_px: f32, font_weight: u16) -> bool {
    font_size_px >= 24.0 || (font_size_px >= 18.7 && font_weight >= 700)
}

/// Tags whose text content is not rendered
const NON_RENDERED: &[&str] = &["script", "style", "noscript", "template", "head", "title", "meta", "link"];

fn has_direct_text(el: &ElementRef) -> bool {
    el.children()
        .filter_map(|n| n.value().as_text())
        .any(|t| !t.trim().is_empty())
}

/// Extract a foreground/background color pair for every visible
/// text-bearing element.
pub fn extract_color_pairs(document: &Html) -> Vec<ColorPairFact> {
    let sheet = Stylesheet::parse(document);
    let all = Selector::parse("*").expect("valid selector");

    document
        .select(&all)
        .filter(|el| !NON_RENDERED.contains(&el.value().name()))
        .filter(has_direct_text)
        .filter(|el| !aria::is_hidden(el))
        .map(|el| {
            let size = effective_font_size(&el, &sheet);
            let weight = effective_font_weight(&el, &sheet);
            ColorPairFact {
                fg: effective_text_color(&el, &sheet),
                bg: effective_background(&el, &sheet),
                large_text: is_large_text(size, weight),
                snippet: crate::extract::open_tag(&el),
            }
        })
        .collect()
}
