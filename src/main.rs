// SPDX-License-Identifier: PMPL-1.0-or-later
//! Auditbot CLI - site auditor for deployed marketing websites

use auditbot::config::{self, AuditConfig, DeviceProfile};
use auditbot::model::WcagLevel;
use auditbot::report::{print_console_summary, write_reports, OutputFormat};
use auditbot::runner;
use auditbot::validators::CheckKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site auditor: accessibility, contrast, meta tags, structured data,
/// links, and performance checks for a deployed website
#[derive(Parser)]
#[command(name = "auditbot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every check
#[derive(Args)]
struct CommonArgs {
    /// Base URL of the site under audit
    #[arg(env = "SITE_BASE_URL")]
    base_url: Option<String>,

    /// Audit these paths instead of crawling (repeatable)
    #[arg(long = "page")]
    pages: Vec<String>,

    /// Maximum number of pages to visit
    #[arg(long)]
    max_pages: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Whole-run deadline in seconds; on expiry the run reports on
    /// whatever was collected
    #[arg(long)]
    run_timeout: Option<u64>,

    /// Config file (YAML or TOML)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory reports are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Persisted report format
    #[arg(long, default_value = "markdown")]
    format: FormatArg,

    /// Render pages in a headless browser before extraction
    #[arg(long)]
    rendered: bool,

    /// Treat advisories ("needs review" items) as Minor violations
    #[arg(long)]
    strict: bool,

    /// Print element-level issues inline
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive-element and ARIA accessibility checks
    Accessibility {
        #[command(flatten)]
        common: CommonArgs,

        /// WCAG conformance level
        #[arg(long, default_value = "aa")]
        level: WcagLevelArg,
    },

    /// WCAG color-contrast checks
    Contrast {
        #[command(flatten)]
        common: CommonArgs,

        /// WCAG conformance level
        #[arg(long, default_value = "aa")]
        level: WcagLevelArg,
    },

    /// Title, description, social-card, canonical, and heading checks
    Meta {
        #[command(flatten)]
        common: CommonArgs,

        /// Brand name expected in every title
        #[arg(long, env = "SITE_BRAND")]
        brand: Option<String>,
    },

    /// schema.org structured-data checks
    Jsonld {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Link and image reachability checks
    Links {
        #[command(flatten)]
        common: CommonArgs,

        /// Also probe external links (never crawled)
        #[arg(long)]
        include_external: bool,
    },

    /// Lighthouse category-score checks
    Performance {
        #[command(flatten)]
        common: CommonArgs,

        /// Device emulation profile
        #[arg(long, default_value = "mobile")]
        device: DeviceArg,

        /// Minimum performance score (0-1)
        #[arg(long)]
        min_performance: Option<f64>,
    },

    /// Run every check in sequence
    All {
        #[command(flatten)]
        common: CommonArgs,

        /// WCAG conformance level
        #[arg(long, default_value = "aa")]
        level: WcagLevelArg,

        /// Brand name expected in every title
        #[arg(long, env = "SITE_BRAND")]
        brand: Option<String>,

        /// Also probe external links (never crawled)
        #[arg(long)]
        include_external: bool,

        /// Device emulation profile
        #[arg(long, default_value = "mobile")]
        device: DeviceArg,
    },

    /// Write a default config file
    Init {
        /// Path to write (YAML by default, TOML by extension)
        #[arg(default_value = "auditbot.yml")]
        path: PathBuf,
    },
}

/// WCAG conformance level CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum WcagLevelArg {
    /// Level A - minimum
    A,
    /// Level AA - standard
    Aa,
    /// Level AAA - enhanced
    Aaa,
}

impl From<WcagLevelArg> for WcagLevel {
    fn from(arg: WcagLevelArg) -> Self {
        match arg {
            WcagLevelArg::A => WcagLevel::A,
            WcagLevelArg::Aa => WcagLevel::AA,
            WcagLevelArg::Aaa => WcagLevel::AAA,
        }
    }
}

/// Device profile CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeviceArg {
    Mobile,
    Desktop,
}

impl From<DeviceArg> for DeviceProfile {
    fn from(arg: DeviceArg) -> Self {
        match arg {
            DeviceArg::Mobile => DeviceProfile::Mobile,
            DeviceArg::Desktop => DeviceProfile::Desktop,
        }
    }
}

/// Persisted report format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Markdown report plus JSON sidecar
    Markdown,
    /// JSON only
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("auditbot=debug")
        } else {
            EnvFilter::new("auditbot=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Layer CLI flags over the config file and defaults.
fn build_config(common: &CommonArgs) -> anyhow::Result<AuditConfig> {
    let path = common
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let mut cfg = config::load_config(&path)?;

    if let Some(base_url) = &common.base_url {
        cfg.base_url = base_url.clone();
    }
    if !common.pages.is_empty() {
        cfg.pages = common.pages.clone();
    }
    if let Some(max_pages) = common.max_pages {
        cfg.max_pages = max_pages;
    }
    if let Some(timeout) = common.timeout {
        cfg.timeout_secs = timeout;
    }
    if common.run_timeout.is_some() {
        cfg.run_timeout_secs = common.run_timeout;
    }
    if let Some(output_dir) = &common.output_dir {
        cfg.report_dir = output_dir.clone();
    }
    if common.rendered {
        cfg.rendered = true;
    }
    if common.strict {
        cfg.strict = true;
    }

    Ok(cfg)
}

/// Run one check, write its reports, and return whether it passed.
async fn run_and_report(
    kind: CheckKind,
    config: AuditConfig,
    format: OutputFormat,
    verbose: bool,
) -> anyhow::Result<bool> {
    let run = runner::run_check(kind, config.clone(), verbose).await?;

    let written = write_reports(&run, &config.report_dir, format)?;
    print_console_summary(&run);
    for path in written {
        eprintln!("Report written to {}", path.display());
    }

    Ok(run.passed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let passed = match cli.command {
        Commands::Accessibility { common, level } => {
            init_logging(common.verbose);
            let mut config = build_config(&common)?;
            config.wcag_level = level.into();
            run_and_report(CheckKind::Accessibility, config, common.format.into(), common.verbose)
                .await?
        }

        Commands::Contrast { common, level } => {
            init_logging(common.verbose);
            let mut config = build_config(&common)?;
            config.wcag_level = level.into();
            run_and_report(CheckKind::Contrast, config, common.format.into(), common.verbose)
                .await?
        }

        Commands::Meta { common, brand } => {
            init_logging(common.verbose);
            let mut config = build_config(&common)?;
            if brand.is_some() {
                config.brand = brand;
            }
            run_and_report(CheckKind::Meta, config, common.format.into(), common.verbose).await?
        }

        Commands::Jsonld { common } => {
            init_logging(common.verbose);
            let config = build_config(&common)?;
            run_and_report(CheckKind::JsonLd, config, common.format.into(), common.verbose).await?
        }

        Commands::Links { common, include_external } => {
            init_logging(common.verbose);
            let mut config = build_config(&common)?;
            config.include_external = include_external;
            run_and_report(CheckKind::Links, config, common.format.into(), common.verbose).await?
        }

        Commands::Performance { common, device, min_performance } => {
            init_logging(common.verbose);
            let mut config = build_config(&common)?;
            config.device = device.into();
            if let Some(min) = min_performance {
                config.thresholds.performance = min;
            }
            run_and_report(CheckKind::Performance, config, common.format.into(), common.verbose)
                .await?
        }

        Commands::All { common, level, brand, include_external, device } => {
            init_logging(common.verbose);
            let mut config = build_config(&common)?;
            config.wcag_level = level.into();
            config.include_external = include_external;
            config.device = device.into();
            if brand.is_some() {
                config.brand = brand;
            }

            let mut all_passed = true;
            for kind in CheckKind::all() {
                let passed = run_and_report(
                    kind,
                    config.clone(),
                    common.format.into(),
                    common.verbose,
                )
                .await?;
                all_passed &= passed;
            }
            all_passed
        }

        Commands::Init { path } => {
            config::write_default_config(&path)?;
            eprintln!("Wrote default config to {}", path.display());
            true
        }
    };

    if !passed {
        std::process::exit(1);
    }

    Ok(())
}
