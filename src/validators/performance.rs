// SPDX-License-Identifier: PMPL-1.0-or-later
//! Page-speed checker built on the Lighthouse CLI.
//!
//! Each page is audited under a fixed device/network emulation profile;
//! the four category scores (performance, accessibility, best-practices,
//! seo), each in [0, 1], are compared against configurable thresholds.
//! A missing `lighthouse` binary is a configuration error raised before
//! any page is visited. The child process is killed if it outlives the
//! audit timeout.
//!
//! Letter grades are display-only sugar; pass/fail uses the thresholds.

use crate::config::{DeviceProfile, PerfThresholds};
use crate::error::{AuditError, Result};
use crate::model::{Findings, Severity, Violation};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

pub const RULE_IDS: &[&str] = &[
    "perf-score-performance",
    "perf-score-accessibility",
    "perf-score-best-practices",
    "perf-score-seo",
];

/// Lighthouse runs need headroom beyond the page-fetch timeout
const AUDIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Category scores from one audit, each in [0, 1]. None when Lighthouse
/// could not score the category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerfScores {
    pub performance: Option<f64>,
    pub accessibility: Option<f64>,
    pub best_practices: Option<f64>,
    pub seo: Option<f64>,
}

impl PerfScores {
    /// Iterate (category name, score, threshold) triples
    fn categories(&self, thresholds: &PerfThresholds) -> [(&'static str, Option<f64>, f64); 4] {
        [
            ("performance", self.performance, thresholds.performance),
            ("accessibility", self.accessibility, thresholds.accessibility),
            ("best-practices", self.best_practices, thresholds.best_practices),
            ("seo", self.seo, thresholds.seo),
        ]
    }
}

/// Display-only letter grade for a score. Monotonic in the score.
pub fn grade(score: f64) -> &'static str {
    if score >= 0.9 {
        "A"
    } else if score >= 0.8 {
        "B"
    } else if score >= 0.7 {
        "C"
    } else if score >= 0.5 {
        "D"
    } else {
        "F"
    }
}

/// Check that the Lighthouse CLI is available.
pub async fn detect() -> Result<()> {
    let available = Command::new("lighthouse")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false);

    if available {
        Ok(())
    } else {
        Err(AuditError::Config(
            "the performance check requires the lighthouse CLI on PATH \
             (npm install -g lighthouse)"
                .to_string(),
        ))
    }
}

/// Run Lighthouse against one URL and extract category scores.
pub async fn audit_page(url: &Url, device: DeviceProfile) -> Result<PerfScores> {
    let mut cmd = Command::new("lighthouse");
    cmd.arg(url.as_str())
        .arg("--output=json")
        .arg("--output-path=stdout")
        .arg("--quiet")
        .arg("--chrome-flags=--headless --no-sandbox")
        .arg("--only-categories=performance,accessibility,best-practices,seo");
    if device == DeviceProfile::Desktop {
        cmd.arg("--preset=desktop");
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::null()).kill_on_drop(true);

    debug!("Running lighthouse against {} ({})", url, device);
    let mut child = cmd
        .spawn()
        .map_err(|e| AuditError::Config(format!("failed to launch lighthouse: {}", e)))?;

    let wait = tokio::time::timeout(AUDIT_TIMEOUT, async {
        let mut output = String::new();
        if let Some(mut stdout) = child.stdout.take() {
            use tokio::io::AsyncReadExt;
            stdout.read_to_string(&mut output).await?;
        }
        let status = child.wait().await?;
        Ok::<_, std::io::Error>((status, output))
    })
    .await;

    match wait {
        Ok(Ok((status, output))) => {
            if !status.success() {
                return Err(AuditError::Validation {
                    rule: "perf-score-performance".to_string(),
                    message: format!("lighthouse exited with {:?} for {}", status.code(), url),
                });
            }
            parse_scores(&output, url.as_str())
        }
        Ok(Err(e)) => Err(AuditError::Io(e)),
        Err(_) => {
            warn!("Lighthouse audit of {} timed out, killing", url);
            let _ = child.kill().await;
            Err(AuditError::Timeout { url: url.to_string() })
        }
    }
}

/// Pull the category scores out of a Lighthouse JSON report.
pub fn parse_scores(report: &str, url: &str) -> Result<PerfScores> {
    let value: serde_json::Value =
        serde_json::from_str(report).map_err(|e| AuditError::Parse {
            url: url.to_string(),
            message: format!("lighthouse report is not valid JSON: {}", e),
        })?;

    let score = |category: &str| {
        value["categories"][category]["score"].as_f64()
    };

    Ok(PerfScores {
        performance: score("performance"),
        accessibility: score("accessibility"),
        best_practices: score("best-practices"),
        seo: score("seo"),
    })
}

/// Compare scores against thresholds. Unscored categories become
/// advisories, not failures.
pub fn threshold_findings(scores: &PerfScores, thresholds: &PerfThresholds, url: &str) -> Findings {
    let mut findings = Findings::new();

    for (category, score, threshold) in scores.categories(thresholds) {
        match score {
            Some(score) if score < threshold => {
                findings.violations.push(
                    Violation::new(
                        &format!("perf-score-{}", category),
                        Severity::Serious,
                        &format!(
                            "{} score {:.2} (grade {}) is below the threshold {:.2}",
                            category,
                            score,
                            grade(score),
                            threshold
                        ),
                    )
                    .with_category("performance")
                    .with_suggestion("Review the full Lighthouse report for failing audits")
                    .for_page(url),
                );
            }
            Some(_) => {}
            None => {
                findings.advisories.push(
                    Violation::new(
                        &format!("perf-score-{}", category),
                        Severity::Info,
                        &format!("{} category was not scored for this page", category),
                    )
                    .with_category("performance")
                    .for_page(url),
                );
            }
        }
    }

    findings
}
