// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report generation and console output.
//!
//! The collector accumulates page results as they complete; `finalize`
//! seals the run: pages are sorted by URL (stable output regardless of
//! crawl order), cross-page duplicate checks are folded in, strict mode
//! promotes advisories, and summary aggregates are computed. Rendering the
//! same sealed run twice yields identical bytes (timestamps excluded from
//! the diff contract).

use crate::model::{PageResult, Severity, Violation};
use crate::validators::links::LinkRecord;
use crate::validators::performance::{grade, PerfScores};
use crate::validators::{meta, CheckKind};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// How many rules the ranked issue list shows
const TOP_RULES: usize = 5;

/// Output format for persisted reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown report plus a JSON sidecar
    Markdown,
    /// JSON only
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Performance scores for one page, kept for the worst-pages ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePerf {
    pub url: String,
    pub scores: PerfScores,
}

/// Aggregate counts for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub pages_scanned: usize,
    pub pages_passed: usize,
    pub pages_failed: usize,
    pub violations_total: usize,
    pub advisories_total: usize,
    pub violations_by_severity: BTreeMap<Severity, usize>,
    pub violations_by_rule: BTreeMap<String, usize>,
    /// title text -> pages using it (only entries with >= 2 pages)
    pub duplicate_titles: BTreeMap<String, Vec<String>>,
    /// description text -> pages using it (only entries with >= 2 pages)
    pub duplicate_descriptions: BTreeMap<String, Vec<String>>,
    pub broken_links: Vec<LinkRecord>,
    pub redirects: Vec<LinkRecord>,
    /// Pages ranked worst-first by performance score
    pub worst_pages: Vec<PagePerf>,
}

/// A sealed audit run: everything the reports are rendered from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRun {
    pub check: CheckKind,
    pub base_url: String,
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub strict: bool,
    pub summary: RunSummary,
    pub pages: Vec<PageResult>,
    /// True iff every page passed
    pub passed: bool,
}

/// Accumulates page results while a run is in flight
pub struct RunCollector {
    check: CheckKind,
    base_url: String,
    strict: bool,
    pages: Vec<PageResult>,
    link_records: Vec<LinkRecord>,
    perf: Vec<PagePerf>,
    started_at: DateTime<Utc>,
}

impl RunCollector {
    pub fn new(check: CheckKind, base_url: &str, strict: bool) -> Self {
        Self {
            check,
            base_url: base_url.to_string(),
            strict,
            pages: Vec::new(),
            link_records: Vec::new(),
            perf: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn add_page(&mut self, page: PageResult) {
        self.pages.push(page);
    }

    pub fn add_link_records(&mut self, records: Vec<LinkRecord>) {
        self.link_records.extend(records);
    }

    pub fn add_perf(&mut self, url: &str, scores: PerfScores) {
        self.perf.push(PagePerf { url: url.to_string(), scores });
    }

    /// Seal the run: sort, apply cross-page checks, promote advisories in
    /// strict mode, and compute aggregates. The result is immutable.
    pub fn finalize(mut self) -> AuditRun {
        self.pages.sort_by(|a, b| a.url.cmp(&b.url));

        // Cross-page duplicate detection belongs to the meta check and runs
        // only once every page is collected
        let (duplicate_titles, duplicate_descriptions) = if self.check == CheckKind::Meta {
            apply_duplicate_checks(&mut self.pages)
        } else {
            (BTreeMap::new(), BTreeMap::new())
        };

        if self.strict {
            for page in &mut self.pages {
                for mut advisory in page.advisories.drain(..) {
                    advisory.severity = Severity::Minor;
                    page.violations.push(advisory);
                }
            }
        }

        for page in &mut self.pages {
            page.recompute_pass();
        }

        let mut violations_by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
        let mut violations_by_rule: BTreeMap<String, usize> = BTreeMap::new();
        let mut violations_total = 0;
        let mut advisories_total = 0;
        for page in &self.pages {
            advisories_total += page.advisories.len();
            for violation in &page.violations {
                violations_total += 1;
                *violations_by_severity.entry(violation.severity).or_insert(0) += 1;
                *violations_by_rule.entry(violation.rule_id.clone()).or_insert(0) += 1;
            }
        }

        let mut broken_links: Vec<LinkRecord> = self
            .link_records
            .iter()
            .filter(|r| r.error.is_some() || r.status.map(|s| s >= 400).unwrap_or(false))
            .cloned()
            .collect();
        broken_links.sort_by(|a, b| a.url.cmp(&b.url).then(a.found_on.cmp(&b.found_on)));

        let mut redirects: Vec<LinkRecord> = self
            .link_records
            .iter()
            .filter(|r| r.status.map(|s| (300..400).contains(&s)).unwrap_or(false))
            .cloned()
            .collect();
        redirects.sort_by(|a, b| a.url.cmp(&b.url).then(a.found_on.cmp(&b.found_on)));

        let mut worst_pages = self.perf;
        worst_pages.sort_by(|a, b| {
            let score = |p: &PagePerf| p.scores.performance.unwrap_or(0.0);
            score(a).partial_cmp(&score(b)).unwrap_or(std::cmp::Ordering::Equal)
                .then(a.url.cmp(&b.url))
        });

        let pages_passed = self.pages.iter().filter(|p| p.pass).count();
        let pages_failed = self.pages.len() - pages_passed;
        let passed = pages_failed == 0;

        AuditRun {
            check: self.check,
            base_url: self.base_url,
            session_id: Uuid::new_v4(),
            started_at: self.started_at,
            strict: self.strict,
            summary: RunSummary {
                pages_scanned: self.pages.len(),
                pages_passed,
                pages_failed,
                violations_total,
                advisories_total,
                violations_by_severity,
                violations_by_rule,
                duplicate_titles,
                duplicate_descriptions,
                broken_links,
                redirects,
                worst_pages,
            },
            pages: self.pages,
            passed,
        }
    }
}

/// Find duplicate titles/descriptions and append the violations to each
/// affected page. Returns the duplicate maps for the summary.
fn apply_duplicate_checks(
    pages: &mut [PageResult],
) -> (BTreeMap<String, Vec<String>>, BTreeMap<String, Vec<String>>) {
    let mut by_title: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut by_description: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for page in pages.iter() {
        if let Some(title) = page.facts.meta.title.as_deref().filter(|t| !t.is_empty()) {
            by_title.entry(title.to_string()).or_default().push(page.url.clone());
        }
        if let Some(desc) = page.facts.meta.description.as_deref().filter(|d| !d.is_empty()) {
            by_description.entry(desc.to_string()).or_default().push(page.url.clone());
        }
    }

    by_title.retain(|_, urls| urls.len() >= 2);
    by_description.retain(|_, urls| urls.len() >= 2);

    let mut extra: Vec<(String, Violation)> = Vec::new();
    extra.extend(meta::duplicate_violations("duplicate-title", "title", &by_title));
    extra.extend(meta::duplicate_violations(
        "duplicate-description",
        "description",
        &by_description,
    ));

    for (url, violation) in extra {
        if let Some(page) = pages.iter_mut().find(|p| p.url == url) {
            page.violations.push(violation);
        }
    }

    (by_title, by_description)
}

/// Remediation advice per violation category, shown grouped in the console
/// summary
const REMEDIATION: &[(&str, &str)] = &[
    ("image-alt", "Give every informative image an alt text; mark decorative images with alt=\"\""),
    ("color-contrast", "Darken text or lighten backgrounds until the WCAG ratio is met"),
    ("aria", "Ensure every interactive element exposes a name, role, and value to assistive tech"),
    ("form-labels", "Associate every form control with a visible <label>"),
    ("metadata", "Write unique titles and descriptions per page and keep social-card tags complete"),
    ("structured-data", "Keep JSON-LD blocks valid and complete so rich results stay eligible"),
    ("links", "Fix broken targets and link directly to final URLs"),
    ("performance", "Compress images, trim unused scripts, and re-run Lighthouse"),
    ("availability", "Make sure every audited page is deployed and responds with HTTP 200"),
];

fn advice_for(category: &str) -> Option<&'static str> {
    REMEDIATION.iter().find(|(c, _)| *c == category).map(|(_, a)| *a)
}

/// Render the Markdown report.
pub fn render_markdown(run: &AuditRun) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {} report: {}\n\n", run.check, run.base_url));
    md.push_str(&format!(
        "**Generated:** {}\n",
        run.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("**Session:** `{}`\n", run.session_id));
    md.push_str(&format!(
        "**Result:** {}\n\n",
        if run.passed { "PASS" } else { "FAIL" }
    ));

    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages scanned | {} |\n", run.summary.pages_scanned));
    md.push_str(&format!("| Pages passed | {} |\n", run.summary.pages_passed));
    md.push_str(&format!("| Pages failed | {} |\n", run.summary.pages_failed));
    md.push_str(&format!("| Violations | {} |\n", run.summary.violations_total));
    md.push_str(&format!("| Advisories | {} |\n", run.summary.advisories_total));
    for severity in Severity::all() {
        if let Some(count) = run.summary.violations_by_severity.get(&severity) {
            md.push_str(&format!("| {} | {} |\n", severity, count));
        }
    }
    md.push('\n');

    if !run.summary.violations_by_rule.is_empty() {
        md.push_str("## Issues by rule\n\n");
        md.push_str("| Rule | Count |\n");
        md.push_str("|------|-------|\n");
        let mut rules: Vec<(&String, &usize)> = run.summary.violations_by_rule.iter().collect();
        rules.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        for (rule, count) in rules {
            md.push_str(&format!("| {} | {} |\n", rule, count));
        }
        md.push('\n');
    }

    if !run.summary.duplicate_titles.is_empty() {
        md.push_str("## Duplicate titles\n\n");
        for (title, urls) in &run.summary.duplicate_titles {
            md.push_str(&format!("- \"{}\" used by {}\n", title, urls.join(", ")));
        }
        md.push('\n');
    }
    if !run.summary.duplicate_descriptions.is_empty() {
        md.push_str("## Duplicate descriptions\n\n");
        for (desc, urls) in &run.summary.duplicate_descriptions {
            md.push_str(&format!("- \"{}\" used by {}\n", desc, urls.join(", ")));
        }
        md.push('\n');
    }

    if !run.summary.broken_links.is_empty() {
        md.push_str("## Broken links\n\n");
        md.push_str("| Target | Status | Found on |\n");
        md.push_str("|--------|--------|----------|\n");
        for link in &run.summary.broken_links {
            let status = link
                .status
                .map(|s| s.to_string())
                .or_else(|| link.error.clone())
                .unwrap_or_else(|| "-".to_string());
            md.push_str(&format!("| {} | {} | {} |\n", link.url, status, link.found_on));
        }
        md.push('\n');
    }

    if !run.summary.redirects.is_empty() {
        md.push_str("## Redirects\n\n");
        md.push_str("| Target | Status | Redirects to | Found on |\n");
        md.push_str("|--------|--------|--------------|----------|\n");
        for link in &run.summary.redirects {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                link.url,
                link.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                link.redirect_target.as_deref().unwrap_or("-"),
                link.found_on
            ));
        }
        md.push('\n');
    }

    if !run.summary.worst_pages.is_empty() {
        md.push_str("## Performance by page (worst first)\n\n");
        md.push_str("| Page | Performance | Accessibility | Best practices | SEO |\n");
        md.push_str("|------|-------------|---------------|----------------|-----|\n");
        for page in &run.summary.worst_pages {
            let cell = |s: Option<f64>| {
                s.map(|v| format!("{:.2} ({})", v, grade(v))).unwrap_or_else(|| "-".to_string())
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                page.url,
                cell(page.scores.performance),
                cell(page.scores.accessibility),
                cell(page.scores.best_practices),
                cell(page.scores.seo)
            ));
        }
        md.push('\n');
    }

    md.push_str("## Pages\n\n");
    for page in &run.pages {
        let marker = if page.pass { "PASS" } else { "FAIL" };
        md.push_str(&format!("### {} [{}]\n\n", page.url, marker));
        if let Some(error) = &page.fetch_error {
            md.push_str(&format!("Fetch error: {}\n\n", error));
        }
        for violation in &page.violations {
            md.push_str(&format!(
                "- **[{}] {}**: {}\n",
                violation.severity, violation.rule_id, violation.message
            ));
            if let Some(element) = &violation.element {
                md.push_str(&format!("  - Element: `{}`\n", element));
            }
            if let Some(suggestion) = &violation.suggestion {
                md.push_str(&format!("  - Fix: {}\n", suggestion));
            }
        }
        for advisory in &page.advisories {
            md.push_str(&format!(
                "- [{}] {} (advisory): {}\n",
                advisory.severity, advisory.rule_id, advisory.message
            ));
        }
        if page.violations.is_empty() && page.advisories.is_empty() && page.fetch_error.is_none() {
            md.push_str("No issues.\n");
        }
        md.push('\n');
    }

    md
}

/// Render the JSON report.
pub fn render_json(run: &AuditRun) -> String {
    serde_json::to_string_pretty(run).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize run: {}\"}}", e)
    })
}

/// Write the report files under `dir`, creating it if absent. Returns the
/// written paths.
pub fn write_reports(
    run: &AuditRun,
    dir: &Path,
    format: OutputFormat,
) -> crate::error::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    if format == OutputFormat::Markdown {
        let md_path = dir.join(format!("{}-report.md", run.check));
        std::fs::write(&md_path, render_markdown(run))?;
        written.push(md_path);
    }

    let json_path = dir.join(format!("{}-report.json", run.check));
    std::fs::write(&json_path, render_json(run))?;
    written.push(json_path);

    Ok(written)
}

/// One colorized progress line per page, printed as results arrive.
pub fn print_page_progress(page: &PageResult, verbose: bool) {
    let status = if page.pass {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    let counts = if page.violations.is_empty() {
        String::new()
    } else {
        format!(" ({} issues)", page.violations.len())
    };
    println!("  {} {}{}", status, page.path.bright_blue(), counts.dimmed());

    if verbose {
        for violation in &page.violations {
            println!(
                "      {} [{}] {}",
                severity_paint(violation.severity),
                violation.rule_id.dimmed(),
                violation.message
            );
            if let Some(element) = &violation.element {
                println!("        {}", element.dimmed());
            }
        }
    }
}

fn severity_paint(severity: Severity) -> colored::ColoredString {
    let text = severity.to_string();
    match severity {
        Severity::Critical | Severity::Serious => text.red(),
        Severity::Moderate | Severity::Minor => text.yellow(),
        Severity::Info => text.bright_blue(),
    }
}

/// Final colorized console summary: totals, ranked top issues, and grouped
/// remediation advice.
pub fn print_console_summary(run: &AuditRun) {
    println!();
    println!(
        "{} {} {}",
        format!("{} audit:", run.check).bold(),
        run.base_url.bright_blue(),
        if run.passed { "PASS".green().bold() } else { "FAIL".red().bold() }
    );
    println!(
        "  {} pages, {} passed, {} failed, {} violations, {} advisories",
        run.summary.pages_scanned,
        run.summary.pages_passed.to_string().green(),
        run.summary.pages_failed.to_string().red(),
        run.summary.violations_total,
        run.summary.advisories_total
    );

    for severity in Severity::all() {
        if let Some(count) = run.summary.violations_by_severity.get(&severity) {
            println!("    {} {}", severity_paint(severity), count);
        }
    }

    let mut rules: Vec<(&String, &usize)> = run.summary.violations_by_rule.iter().collect();
    rules.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    if !rules.is_empty() {
        println!();
        println!("{}", "Top issues:".bold());
        for (rule, count) in rules.iter().take(TOP_RULES) {
            println!("  {} {} × {}", "•".bright_cyan(), rule, count);
        }
    }

    let mut categories: Vec<&str> = run
        .pages
        .iter()
        .flat_map(|p| p.violations.iter())
        .map(|v| v.category.as_str())
        .filter(|c| !c.is_empty())
        .collect();
    categories.sort_unstable();
    categories.dedup();
    if !categories.is_empty() {
        println!();
        println!("{}", "Recommendations:".bold());
        for category in categories {
            if let Some(advice) = advice_for(category) {
                println!("  {} {}: {}", "→".bright_green(), category.bold(), advice);
            }
        }
    }
}
