// SPDX-License-Identifier: PMPL-1.0-or-later
//! Link and image reachability checker.
//!
//! Every discovered link and image is probed with a HEAD request (GET
//! fallback). 2xx passes; 3xx is a redirect -- not a failure, but recorded
//! separately with its resolved target; 4xx/5xx and network errors are
//! broken. External links are only probed when explicitly enabled, and are
//! never crawled.
//!
//! This is an active checker: the probing is async, the classification into
//! violations is pure and tested on its own.

use crate::extract::PageFacts;
use crate::fetch::{Fetcher, ProbeOutcome};
use crate::model::{Findings, Severity, Violation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

pub const RULE_IDS: &[&str] = &["link-broken", "image-broken", "link-redirect"];

/// One probed target, for the run summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Probed URL
    pub url: String,
    /// Page the target was discovered on
    pub found_on: String,
    /// HTTP status, when a response arrived
    pub status: Option<u16>,
    /// Redirect target from the Location header
    pub redirect_target: Option<String>,
    /// Network error, when no response arrived
    pub error: Option<String>,
    /// Target was an image
    pub is_image: bool,
}

/// Classify one probe outcome into findings and a summary record.
pub fn classify(
    target: &str,
    found_on: &str,
    is_image: bool,
    outcome: &ProbeOutcome,
) -> (Findings, LinkRecord) {
    let mut findings = Findings::new();
    let mut record = LinkRecord {
        url: target.to_string(),
        found_on: found_on.to_string(),
        status: None,
        redirect_target: None,
        error: None,
        is_image,
    };

    match outcome {
        ProbeOutcome::Reachable { status } => {
            record.status = Some(*status);
        }
        ProbeOutcome::Redirect { status, location } => {
            record.status = Some(*status);
            record.redirect_target = location.clone();
            let target_note = location.as_deref().unwrap_or("(no Location header)");
            findings.advisories.push(
                Violation::new(
                    "link-redirect",
                    Severity::Info,
                    &format!("{} responds {} redirecting to {}", target, status, target_note),
                )
                .with_category("links")
                .with_suggestion("Link directly to the final URL to skip the redirect hop")
                .for_page(found_on),
            );
        }
        ProbeOutcome::Broken { status, error } => {
            record.status = *status;
            record.error = error.clone();
            let rule_id = if is_image { "image-broken" } else { "link-broken" };
            let what = if is_image { "Image" } else { "Link" };
            let detail = match (status, error) {
                (Some(code), _) => format!("HTTP {}", code),
                (None, Some(err)) => err.clone(),
                (None, None) => "no response".to_string(),
            };
            findings.violations.push(
                Violation::new(
                    rule_id,
                    Severity::Serious,
                    &format!("{} {} is broken: {}", what, target, detail),
                )
                .with_category("links")
                .with_suggestion("Fix or remove the target")
                .for_page(found_on),
            );
        }
    }

    (findings, record)
}

/// Probe every link and image on a page. `cache` deduplicates targets
/// across the whole run so each URL is requested once.
pub async fn check_page(
    fetcher: &Fetcher,
    facts: &PageFacts,
    page_url: &Url,
    include_external: bool,
    cache: &mut HashMap<String, ProbeOutcome>,
) -> (Findings, Vec<LinkRecord>) {
    let mut findings = Findings::new();
    let mut records = Vec::new();

    let targets: Vec<(String, bool)> = facts
        .links
        .iter()
        .filter(|l| l.internal || include_external)
        .map(|l| (l.url.clone(), false))
        .chain(
            facts
                .images
                .iter()
                .filter(|i| i.internal || include_external)
                .map(|i| (i.url.clone(), true)),
        )
        .collect();

    for (target, is_image) in targets {
        let outcome = match cache.get(&target) {
            Some(cached) => cached.clone(),
            None => {
                let parsed = match Url::parse(&target) {
                    Ok(u) => u,
                    Err(_) => continue,
                };
                debug!("Probing {}", target);
                let outcome = fetcher.probe(&parsed).await;
                cache.insert(target.clone(), outcome.clone());
                outcome
            }
        };

        let (target_findings, record) = classify(&target, page_url.as_str(), is_image, &outcome);
        findings.merge(target_findings);
        records.push(record);
    }

    (findings, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_404_is_broken() {
        let outcome = ProbeOutcome::Broken { status: Some(404), error: None };
        let (findings, record) =
            classify("https://example.com/gone", "https://example.com/", false, &outcome);

        assert_eq!(findings.violations.len(), 1);
        assert_eq!(findings.violations[0].rule_id, "link-broken");
        assert!(findings.violations[0].message.contains("404"));
        assert_eq!(record.status, Some(404));
    }

    #[test]
    fn test_301_is_redirect_not_broken() {
        let outcome = ProbeOutcome::Redirect {
            status: 301,
            location: Some("https://example.com/new-home".to_string()),
        };
        let (findings, record) =
            classify("https://example.com/old", "https://example.com/", false, &outcome);

        assert!(findings.violations.is_empty());
        assert_eq!(findings.advisories.len(), 1);
        assert_eq!(findings.advisories[0].rule_id, "link-redirect");
        assert_eq!(record.redirect_target.as_deref(), Some("https://example.com/new-home"));
    }

    #[test]
    fn test_200_passes() {
        let outcome = ProbeOutcome::Reachable { status: 200 };
        let (findings, record) =
            classify("https://example.com/ok", "https://example.com/", false, &outcome);
        assert!(findings.is_empty());
        assert_eq!(record.status, Some(200));
    }

    #[test]
    fn test_broken_image_uses_image_rule() {
        let outcome = ProbeOutcome::Broken { status: Some(500), error: None };
        let (findings, _) =
            classify("https://example.com/hero.jpg", "https://example.com/", true, &outcome);
        assert_eq!(findings.violations[0].rule_id, "image-broken");
    }

    #[test]
    fn test_network_error_is_broken() {
        let outcome = ProbeOutcome::Broken {
            status: None,
            error: Some("connection refused for https://example.com/x".to_string()),
        };
        let (findings, record) =
            classify("https://example.com/x", "https://example.com/", false, &outcome);
        assert_eq!(findings.violations.len(), 1);
        assert!(record.error.is_some());
    }
}
