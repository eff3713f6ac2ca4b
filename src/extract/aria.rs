// SPDX-License-Identifier: PMPL-1.0-or-later
//! Interactive-element extraction and accessible-name computation.
//!
//! For each interactive element (links, buttons, form controls, elements
//! with interactive ARIA roles) the accessible name is computed with the
//! precedence: aria-label, aria-labelledby referent text, title, alt (for
//! images), then text content. Elements hidden from rendering or assistive
//! technology are carried with their hidden flags so validators can exclude
//! them from name checks while still seeing aria-hidden misuse.

use crate::extract::{open_tag, style};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// ARIA roles that make any element interactive
const INTERACTIVE_ROLES: &[&str] = &[
    "button", "link", "checkbox", "radio", "tab", "menuitem", "menuitemcheckbox",
    "menuitemradio", "switch", "textbox", "combobox", "listbox", "searchbox",
    "slider", "spinbutton",
];

/// Natively focusable element names
const FOCUSABLE_ELEMENTS: &[&str] =
    &["a", "button", "input", "select", "textarea", "details", "summary"];

/// Input types that are not user-facing controls
const NON_CONTROL_INPUT_TYPES: &[&str] = &["hidden", "submit", "reset", "button", "image"];

/// One interactive element and its computed accessible name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AriaFact {
    /// Element name (lowercased by the parser)
    pub tag: String,
    /// Explicit ARIA role, if any
    pub role: Option<String>,
    /// type attribute for inputs
    pub input_type: Option<String>,
    /// Accessible name by the documented precedence; None when empty
    pub accessible_name: Option<String>,
    /// Form control with an associated <label> (for/id or wrapping)
    pub has_label: bool,
    /// Keyboard-focusable
    pub focusable: bool,
    /// Hidden from rendering or assistive technology (any mechanism)
    pub hidden: bool,
    /// Carries aria-hidden="true" directly
    pub aria_hidden: bool,
    /// Open tag for report snippets
    pub snippet: String,
}

impl AriaFact {
    /// Whether this is a form control that needs a label
    pub fn is_form_control(&self) -> bool {
        match self.tag.as_str() {
            "select" | "textarea" => true,
            "input" => {
                let ty = self.input_type.as_deref().unwrap_or("text");
                !NON_CONTROL_INPUT_TYPES.contains(&ty)
            }
            _ => false,
        }
    }
}

/// Whether an element is hidden by itself or any ancestor: `hidden`
/// attribute, `aria-hidden="true"`, `display:none`, `visibility:hidden`,
/// or a zero-size inline box.
pub fn is_hidden(el: &ElementRef) -> bool {
    std::iter::once(**el)
        .chain(el.ancestors())
        .filter_map(ElementRef::wrap)
        .any(|e| element_hides(&e))
}

fn element_hides(el: &ElementRef) -> bool {
    if el.value().attr("hidden").is_some() || el.value().attr("aria-hidden") == Some("true") {
        return true;
    }
    if let Some(display) = style::inline_decl(el, "display") {
        if display == "none" {
            return true;
        }
    }
    if let Some(visibility) = style::inline_decl(el, "visibility") {
        if visibility == "hidden" {
            return true;
        }
    }
    let zero = |prop: &str| {
        style::inline_decl(el, prop)
            .map(|v| matches!(v.as_str(), "0" | "0px"))
            .unwrap_or(false)
    };
    zero("width") && zero("height")
}

/// Compute the accessible name for an element.
///
/// `id_text` maps element ids to their text content, for aria-labelledby
/// resolution. Returns None when every source is empty.
pub fn accessible_name(el: &ElementRef, id_text: &HashMap<String, String>) -> Option<String> {
    if let Some(label) = nonempty(el.value().attr("aria-label")) {
        return Some(label);
    }

    if let Some(refs) = nonempty(el.value().attr("aria-labelledby")) {
        let text: Vec<String> = refs
            .split_whitespace()
            .filter_map(|id| id_text.get(id))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !text.is_empty() {
            return Some(text.join(" "));
        }
    }

    if let Some(title) = nonempty(el.value().attr("title")) {
        return Some(title);
    }

    if el.value().name() == "img" || el.value().attr("type") == Some("image") {
        if let Some(alt) = nonempty(el.value().attr("alt")) {
            return Some(alt);
        }
    }

    let text = el.text().collect::<String>().trim().to_string();
    if !text.is_empty() {
        return Some(text);
    }

    // A link or button whose only content is an image takes that image's alt
    let img_sel = Selector::parse("img[alt]").expect("valid selector");
    for img in el.select(&img_sel) {
        if let Some(alt) = nonempty(img.value().attr("alt")) {
            return Some(alt);
        }
    }

    None
}

fn nonempty(attr: Option<&str>) -> Option<String> {
    attr.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

fn is_focusable(el: &ElementRef) -> bool {
    if el.value().attr("disabled").is_some() {
        return false;
    }
    if let Some(tabindex) = el.value().attr("tabindex") {
        if let Ok(index) = tabindex.trim().parse::<i32>() {
            return index >= 0;
        }
    }
    let name = el.value().name();
    if name == "a" {
        return el.value().attr("href").is_some();
    }
    FOCUSABLE_ELEMENTS.contains(&name)
}

fn is_interactive(el: &ElementRef) -> bool {
    if let Some(role) = el.value().attr("role") {
        if INTERACTIVE_ROLES.contains(&role) {
            return true;
        }
    }
    match el.value().name() {
        "a" => el.value().attr("href").is_some(),
        "button" | "select" | "textarea" => true,
        "input" => el.value().attr("type") != Some("hidden"),
        _ => false,
    }
}

/// Extract every interactive element from a document.
pub fn extract_interactive(document: &Html) -> Vec<AriaFact> {
    let all = Selector::parse("*").expect("valid selector");
    let label_sel = Selector::parse("label[for]").expect("valid selector");

    // Text content by id, for aria-labelledby resolution
    let mut id_text: HashMap<String, String> = HashMap::new();
    for el in document.select(&all) {
        if let Some(id) = el.value().attr("id") {
            id_text
                .entry(id.to_string())
                .or_insert_with(|| el.text().collect::<String>());
        }
    }

    // Explicit label associations
    let label_fors: HashSet<String> = document
        .select(&label_sel)
        .filter_map(|l| l.value().attr("for").map(String::from))
        .collect();

    document
        .select(&all)
        .filter(is_interactive)
        .map(|el| {
            let id = el.value().attr("id");
            let wrapped_in_label = el
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| a.value().name() == "label");
            let has_label = wrapped_in_label
                || id.map(|i| label_fors.contains(i)).unwrap_or(false)
                || el.value().attr("aria-label").is_some()
                || el.value().attr("aria-labelledby").is_some();

            AriaFact {
                tag: el.value().name().to_string(),
                role: el.value().attr("role").map(String::from),
                input_type: el.value().attr("type").map(String::from),
                accessible_name: accessible_name(&el, &id_text),
                has_label,
                focusable: is_focusable(&el),
                hidden: is_hidden(&el),
                aria_hidden: el.value().attr("aria-hidden") == Some("true"),
                snippet: open_tag(&el),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(html: &str) -> Vec<AriaFact> {
        extract_interactive(&Html::parse_document(html))
    }

    #[test]
    fn test_aria_label_wins() {
        let f = facts(r#"<button aria-label="Close dialog" title="x">text</button>"#);
        assert_eq!(f[0].accessible_name.as_deref(), Some("Close dialog"));
    }

    #[test]
    fn test_labelledby_referent_text() {
        let f = facts(r#"
            <span id="req-label">Request a quote</span>
            <button aria-labelledby="req-label"></button>
        "#);
        let button = f.iter().find(|x| x.tag == "button").unwrap();
        assert_eq!(button.accessible_name.as_deref(), Some("Request a quote"));
    }

    #[test]
    fn test_title_before_text() {
        let f = facts(r#"<a href="/" title="Home page">ignored precedence check</a>"#);
        assert_eq!(f[0].accessible_name.as_deref(), Some("Home page"));
    }

    #[test]
    fn test_text_content_fallback() {
        let f = facts(r#"<a href="/services">Our services</a>"#);
        assert_eq!(f[0].accessible_name.as_deref(), Some("Our services"));
    }

    #[test]
    fn test_image_link_takes_alt() {
        let f = facts(r#"<a href="/"><img src="logo.png" alt="Acme Septic home"></a>"#);
        let link = f.iter().find(|x| x.tag == "a").unwrap();
        assert_eq!(link.accessible_name.as_deref(), Some("Acme Septic home"));
    }

    #[test]
    fn test_no_name_is_none() {
        let f = facts(r#"<button><i class="icon-close"></i></button>"#);
        assert_eq!(f[0].accessible_name, None);
    }

    #[test]
    fn test_hidden_mechanisms() {
        let f = facts(r#"
            <div style="display: none"><button>A</button></div>
            <button style="visibility: hidden">B</button>
            <button aria-hidden="true">C</button>
            <button hidden>D</button>
            <button style="width: 0; height: 0">E</button>
            <button>Visible</button>
        "#);
        let hidden: Vec<bool> = f.iter().map(|x| x.hidden).collect();
        assert_eq!(hidden, vec![true, true, true, true, true, false]);
    }

    #[test]
    fn test_aria_hidden_focusable_flagged() {
        let f = facts(r#"<a href="/deals" aria-hidden="true">Deals</a>"#);
        assert!(f[0].aria_hidden);
        assert!(f[0].focusable);
    }

    #[test]
    fn test_label_association() {
        let f = facts(r#"
            <label for="email">Email</label>
            <input type="email" id="email">
            <label>Phone <input type="tel"></label>
            <input type="text" id="orphan">
        "#);
        let inputs: Vec<&AriaFact> = f.iter().filter(|x| x.tag == "input").collect();
        assert!(inputs[0].has_label);
        assert!(inputs[1].has_label);
        assert!(!inputs[2].has_label);
    }

    #[test]
    fn test_form_control_classification() {
        let f = facts(r#"
            <input type="text">
            <input type="submit" value="Go">
            <select></select>
        "#);
        assert!(f[0].is_form_control());
        assert!(!f[1].is_form_control());
        assert!(f[2].is_form_control());
    }

    #[test]
    fn test_role_makes_interactive() {
        let f = facts(r#"<div role="button">Click me</div>"#);
        assert_eq!(f.len(), 1);
        assert_eq!(f[0].role.as_deref(), Some("button"));
    }

    #[test]
    fn test_disabled_not_focusable() {
        let f = facts(r#"<button disabled>Save</button>"#);
        assert!(!f[0].focusable);
    }

    #[test]
    fn test_negative_tabindex_not_focusable() {
        let f = facts(r#"<button tabindex="-1">Skip</button>"#);
        assert!(!f[0].focusable);
    }
}
