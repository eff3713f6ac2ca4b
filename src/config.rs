// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration handling for auditbot
//!
//! Settings come from three layers: built-in defaults, an optional YAML or
//! TOML config file, and CLI flags (applied last by main). The base URL is
//! the only required input.

use crate::error::{AuditError, Result};
use crate::model::WcagLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Base URL of the site under audit
    #[serde(default)]
    pub base_url: String,

    /// Fixed list of page paths to audit instead of crawling
    #[serde(default)]
    pub pages: Vec<String>,

    /// Crawl budget: maximum number of distinct pages visited in one run
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Optional whole-run deadline in seconds; when it passes, the crawler
    /// stops enqueueing and the run reports on whatever was collected
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,

    /// User-agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// WCAG conformance level for accessibility and contrast checks
    #[serde(default = "default_wcag_level")]
    pub wcag_level: WcagLevel,

    /// Device emulation profile for the performance check
    #[serde(default)]
    pub device: DeviceProfile,

    /// Whether the link check also probes external links
    #[serde(default)]
    pub include_external: bool,

    /// Render pages in a headless browser before extraction
    #[serde(default)]
    pub rendered: bool,

    /// Brand name expected in page titles (title check is skipped when unset)
    #[serde(default)]
    pub brand: Option<String>,

    /// Directory reports are written to
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Treat advisories ("needs review" items) as Minor violations
    #[serde(default)]
    pub strict: bool,

    /// Minimum category scores for the performance check
    #[serde(default)]
    pub thresholds: PerfThresholds,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            pages: Vec::new(),
            max_pages: default_max_pages(),
            timeout_secs: default_timeout_secs(),
            run_timeout_secs: None,
            user_agent: default_user_agent(),
            wcag_level: default_wcag_level(),
            device: DeviceProfile::default(),
            include_external: false,
            rendered: false,
            brand: None,
            report_dir: default_report_dir(),
            strict: false,
            thresholds: PerfThresholds::default(),
        }
    }
}

fn default_max_pages() -> usize {
    25
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("auditbot/{}", env!("CARGO_PKG_VERSION"))
}

fn default_wcag_level() -> WcagLevel {
    WcagLevel::AA
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

/// Device emulation profile for page-speed audits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceProfile {
    /// Mobile emulation (default, matches how most visitors browse)
    #[default]
    Mobile,
    /// Desktop emulation
    Desktop,
}

impl std::fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceProfile::Mobile => write!(f, "mobile"),
            DeviceProfile::Desktop => write!(f, "desktop"),
        }
    }
}

/// Minimum category scores (each in [0, 1]) for the performance check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerfThresholds {
    #[serde(default = "default_perf_score")]
    pub performance: f64,
    #[serde(default = "default_other_score")]
    pub accessibility: f64,
    #[serde(default = "default_other_score")]
    pub best_practices: f64,
    #[serde(default = "default_other_score")]
    pub seo: f64,
}

impl Default for PerfThresholds {
    fn default() -> Self {
        Self {
            performance: default_perf_score(),
            accessibility: default_other_score(),
            best_practices: default_other_score(),
            seo: default_other_score(),
        }
    }
}

fn default_perf_score() -> f64 {
    0.8
}

fn default_other_score() -> f64 {
    0.9
}

impl AuditConfig {
    /// Parse and validate the configured base URL.
    pub fn base(&self) -> Result<url::Url> {
        if self.base_url.is_empty() {
            return Err(AuditError::Config(
                "no base URL configured; pass one as an argument or set SITE_BASE_URL".to_string(),
            ));
        }
        let url = url::Url::parse(&self.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AuditError::Config(format!(
                "base URL must be http or https, got {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(AuditError::Config(format!("base URL {} has no host", self.base_url)));
        }
        Ok(url)
    }

    /// Request timeout as a Duration
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Load configuration from a path. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AuditConfig> {
    if !path.exists() {
        debug!("Config file not found at {}, using defaults", path.display());
        return Ok(AuditConfig::default());
    }

    let content = std::fs::read_to_string(path)?;

    let config: AuditConfig = if path.extension().map(|e| e == "toml").unwrap_or(false) {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Default config path relative to the working directory
pub fn default_config_path() -> PathBuf {
    PathBuf::from("auditbot.yml")
}

/// Write default configuration to a file
pub fn write_default_config(path: &Path) -> Result<()> {
    let config = AuditConfig::default();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = if path.extension().map(|e| e == "toml").unwrap_or(false) {
        toml::to_string_pretty(&config).map_err(|e| AuditError::Config(e.to_string()))?
    } else {
        serde_yaml::to_string(&config)?
    };

    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AuditConfig::default();
        assert_eq!(config.max_pages, 25);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.wcag_level, WcagLevel::AA);
        assert_eq!(config.device, DeviceProfile::Mobile);
        assert!(!config.include_external);
        assert!(!config.strict);
        assert_eq!(config.report_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_default_thresholds() {
        let t = PerfThresholds::default();
        assert!((t.performance - 0.8).abs() < f64::EPSILON);
        assert!((t.seo - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_base_url_required() {
        let config = AuditConfig::default();
        assert!(config.base().is_err());
    }

    #[test]
    fn test_base_url_scheme_validated() {
        let config = AuditConfig {
            base_url: "ftp://example.com".to_string(),
            ..AuditConfig::default()
        };
        assert!(config.base().is_err());

        let config = AuditConfig {
            base_url: "https://example.com".to_string(),
            ..AuditConfig::default()
        };
        assert!(config.base().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = "base_url: https://example.com\nmax_pages: 10\nbrand: Acme Septic\n";
        let config: AuditConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.base_url, "https://example.com");
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.brand.as_deref(), Some("Acme Septic"));
        // Unspecified fields fall back to defaults
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_write_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auditbot.yml");
        write_default_config(&path).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.max_pages, AuditConfig::default().max_pages);
    }
}
