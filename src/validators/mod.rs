// SPDX-License-Identifier: PMPL-1.0-or-later
//! Validators: one module per audit concern.
//!
//! Pure validators implement [`Validator`] over extracted facts. The link
//! and performance checks are "active": they issue network requests or
//! drive an external tool, with the pure classification logic factored out
//! and unit-tested on its own. Every violation a validator produces must
//! cite one of its declared rule ids; the runner logs a warning otherwise.

pub mod accessibility;
pub mod contrast;
pub mod jsonld;
pub mod links;
pub mod meta;
pub mod performance;

use crate::extract::PageFacts;
use crate::model::Findings;
use serde::{Deserialize, Serialize};
use url::Url;

/// Which audit a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// Interactive-element and ARIA checks
    Accessibility,
    /// WCAG color-contrast ratios
    Contrast,
    /// Title/description/OG/Twitter/canonical/heading rules
    Meta,
    /// schema.org structured-data shape
    JsonLd,
    /// Link and image reachability
    Links,
    /// Page-speed category scores
    Performance,
}

impl CheckKind {
    /// Short name used for report files and console output
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::Accessibility => "accessibility",
            CheckKind::Contrast => "contrast",
            CheckKind::Meta => "meta",
            CheckKind::JsonLd => "jsonld",
            CheckKind::Links => "links",
            CheckKind::Performance => "performance",
        }
    }

    /// All checks, in the order `all` runs them
    pub fn all() -> [CheckKind; 6] {
        [
            CheckKind::Accessibility,
            CheckKind::Contrast,
            CheckKind::Meta,
            CheckKind::JsonLd,
            CheckKind::Links,
            CheckKind::Performance,
        ]
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait implemented by the pure validators
pub trait Validator: Send + Sync {
    /// Human-readable name of this validator
    fn name(&self) -> &'static str;

    /// Rule ids this validator may produce
    fn rule_ids(&self) -> &'static [&'static str];

    /// Validate one page's facts
    fn validate(&self, facts: &PageFacts, page_url: &Url) -> Findings;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_kind_names_unique() {
        let names: std::collections::HashSet<_> =
            CheckKind::all().iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn test_check_kind_serde() {
        let json = serde_json::to_string(&CheckKind::JsonLd).unwrap();
        assert_eq!(json, "\"jsonld\"");
    }
}
