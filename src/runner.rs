// SPDX-License-Identifier: PMPL-1.0-or-later
//! Run orchestration: crawl → fetch → extract → validate → report.
//!
//! One sequential flow per run. Configuration problems (bad base URL,
//! missing browser or Lighthouse binary) abort before any page is visited;
//! per-page fetch and audit failures are recorded on the page result and
//! the run continues. The crawler state and the collector are the only
//! mutable state, both owned here.

use crate::config::AuditConfig;
use crate::crawl::CrawlState;
use crate::error::Result;
use crate::extract;
use crate::fetch::{FetchMode, Fetcher};
use crate::model::{Findings, PageResult};
use crate::render::Renderer;
use crate::report::{print_page_progress, AuditRun, RunCollector};
use crate::validators::accessibility::AccessibilityValidator;
use crate::validators::contrast::ContrastValidator;
use crate::validators::jsonld::JsonLdValidator;
use crate::validators::meta::MetaValidator;
use crate::validators::{links, performance, CheckKind, Validator};
use std::collections::HashMap;
use tracing::{info, warn};
use url::Url;

/// Everything one run needs, constructed up front and handed through the
/// flow -- no ambient mutable state.
pub struct RunContext {
    config: AuditConfig,
    base: Url,
    mode: FetchMode,
    fetcher: Fetcher,
    renderer: Option<Renderer>,
}

impl RunContext {
    /// Validate configuration and allocate resources. Every configuration
    /// error surfaces here, before any page is visited.
    pub async fn new(kind: CheckKind, config: AuditConfig) -> Result<Self> {
        let base = config.base()?;
        let fetcher = Fetcher::new(&config)?;

        let (mode, renderer) = if config.rendered {
            (FetchMode::Rendered, Some(Renderer::detect(config.timeout()).await?))
        } else {
            (FetchMode::Static, None)
        };

        if kind == CheckKind::Performance {
            performance::detect().await?;
        }

        Ok(Self { config, base, mode, fetcher, renderer })
    }

    fn pure_validator(&self, kind: CheckKind) -> Option<Box<dyn Validator>> {
        match kind {
            CheckKind::Accessibility => {
                Some(Box::new(AccessibilityValidator::new(self.config.wcag_level)))
            }
            CheckKind::Contrast => Some(Box::new(ContrastValidator::new(self.config.wcag_level))),
            CheckKind::Meta => Some(Box::new(MetaValidator::new(self.config.brand.clone()))),
            CheckKind::JsonLd => Some(Box::new(JsonLdValidator)),
            CheckKind::Links | CheckKind::Performance => None,
        }
    }

    fn known_rules(&self, kind: CheckKind) -> &'static [&'static str] {
        match kind {
            CheckKind::Links => links::RULE_IDS,
            CheckKind::Performance => performance::RULE_IDS,
            CheckKind::Accessibility => AccessibilityValidator::new(self.config.wcag_level).rule_ids(),
            CheckKind::Contrast => ContrastValidator::new(self.config.wcag_level).rule_ids(),
            CheckKind::Meta => MetaValidator::new(None).rule_ids(),
            CheckKind::JsonLd => JsonLdValidator.rule_ids(),
        }
    }

    /// Fetch a page body in the configured mode.
    async fn page_body(&self, url: &Url) -> Result<String> {
        match (self.mode, &self.renderer) {
            (FetchMode::Rendered, Some(renderer)) => renderer.render(url).await,
            _ => Ok(self.fetcher.fetch_page(url).await?.body),
        }
    }

    /// Run one check over the site and return the sealed run.
    pub async fn run(&self, kind: CheckKind, verbose: bool) -> Result<AuditRun> {
        let mut state = if self.config.pages.is_empty() {
            CrawlState::from_seed(&self.base, self.config.max_pages)
        } else {
            CrawlState::from_pages(&self.base, &self.config.pages, self.config.max_pages)
        };

        let validator = self.pure_validator(kind);
        let known_rules = self.known_rules(kind);
        let mut collector =
            RunCollector::new(kind, self.base.as_str(), self.config.strict);
        let mut probe_cache = HashMap::new();

        info!("Starting {} audit of {}", kind, self.base);

        let deadline = self
            .config
            .run_timeout_secs
            .map(|secs| std::time::Instant::now() + std::time::Duration::from_secs(secs));

        while let Some(url) = state.next() {
            if let Some(deadline) = deadline {
                if std::time::Instant::now() >= deadline {
                    warn!("Run deadline reached, reporting on {} pages", state.visited_count() - 1);
                    break;
                }
            }
            let body = match self.page_body(&url).await {
                Ok(body) => body,
                Err(error) if error.is_page_recoverable() => {
                    warn!("Skipping {}: {}", url, error);
                    let page = PageResult::fetch_failure(&url, &error);
                    print_page_progress(&page, verbose);
                    collector.add_page(page);
                    continue;
                }
                Err(error) => return Err(error),
            };

            let facts = extract::extract(&body, &url, &self.base);

            for link in &facts.links {
                if let Ok(target) = Url::parse(&link.url) {
                    state.enqueue(&target, &self.base);
                }
            }

            let findings = match (&validator, kind) {
                (Some(validator), _) => validator.validate(&facts, &url),
                (None, CheckKind::Links) => {
                    let (findings, records) = links::check_page(
                        &self.fetcher,
                        &facts,
                        &url,
                        self.config.include_external,
                        &mut probe_cache,
                    )
                    .await;
                    collector.add_link_records(records);
                    findings
                }
                (None, CheckKind::Performance) => {
                    match performance::audit_page(&url, self.config.device).await {
                        Ok(scores) => {
                            collector.add_perf(url.as_str(), scores);
                            performance::threshold_findings(
                                &scores,
                                &self.config.thresholds,
                                url.as_str(),
                            )
                        }
                        Err(error) if error.is_page_recoverable() => {
                            warn!("Audit of {} failed: {}", url, error);
                            let page = PageResult::fetch_failure(&url, &error);
                            print_page_progress(&page, verbose);
                            collector.add_page(page);
                            continue;
                        }
                        Err(error) => return Err(error),
                    }
                }
                (None, _) => Findings::new(),
            };

            check_rule_ids(&findings, known_rules);

            let page = PageResult::from_validation(&url, facts, findings);
            print_page_progress(&page, verbose);
            collector.add_page(page);
        }

        let run = collector.finalize();
        info!(
            "Finished {} audit: {} pages, {} violations",
            kind, run.summary.pages_scanned, run.summary.violations_total
        );
        Ok(run)
    }
}

/// Every violation must cite a rule the validator declares. An unknown id
/// is a validator bug, logged rather than aborting the page.
fn check_rule_ids(findings: &Findings, known: &[&str]) {
    for violation in findings.violations.iter().chain(findings.advisories.iter()) {
        if !known.contains(&violation.rule_id.as_str()) {
            warn!(
                "validator produced unknown rule id {} on {}",
                violation.rule_id, violation.page_url
            );
        }
    }
}

/// Convenience entry point: build a context and run one check.
pub async fn run_check(kind: CheckKind, config: AuditConfig, verbose: bool) -> Result<AuditRun> {
    let ctx = RunContext::new(kind, config).await?;
    ctx.run(kind, verbose).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Severity, Violation};

    #[test]
    fn test_context_rejects_missing_base_url() {
        let config = AuditConfig::default();
        let result = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(RunContext::new(CheckKind::Meta, config));
        assert!(result.is_err());
    }

    #[test]
    fn test_known_rules_cover_fetch_path() {
        // The fetch-error rule is produced by the runner itself, not a
        // validator, so it is deliberately absent from every rule list
        let findings = Findings {
            violations: vec![Violation::new("image-alt", Severity::Critical, "x")],
            advisories: vec![],
        };
        // Should not panic for known ids
        check_rule_ids(&findings, &["image-alt"]);
    }
}
