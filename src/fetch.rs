// SPDX-License-Identifier: PMPL-1.0-or-later
//! HTTP fetching for pages and reachability probes.
//!
//! Two clients: the page client follows redirects and returns document
//! bodies; the probe client never follows redirects so 3xx responses can be
//! classified and their `Location` target captured. Both enforce the
//! configured timeout and user-agent.

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use reqwest::header::LOCATION;
use reqwest::Client;
use tracing::debug;
use url::Url;

/// How a page body is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Raw HTTP GET
    Static,
    /// Headless browser, script executed, final DOM serialized
    Rendered,
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after any redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

/// Outcome of a lightweight reachability probe against one link or image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 2xx response
    Reachable { status: u16 },
    /// 3xx response; target captured from the Location header when present
    Redirect { status: u16, location: Option<String> },
    /// 4xx/5xx response or a network-level failure
    Broken { status: Option<u16>, error: Option<String> },
}

/// HTTP fetcher shared by every checker
pub struct Fetcher {
    pages: Client,
    probes: Client,
}

impl Fetcher {
    /// Build a fetcher from the run configuration.
    pub fn new(config: &AuditConfig) -> Result<Self> {
        let pages = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AuditError::Config(format!("failed to build HTTP client: {}", e)))?;

        let probes = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuditError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { pages, probes })
    }

    /// Fetch a page body over raw HTTP. Non-2xx responses are typed fetch
    /// errors, recoverable at page scope.
    pub async fn fetch_page(&self, url: &Url) -> Result<FetchedPage> {
        debug!("GET {}", url);
        let response = self
            .pages
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AuditError::from_fetch(url.as_str(), e))?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();

        if !response.status().is_success() {
            return Err(AuditError::HttpStatus { url: url.to_string(), status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuditError::from_fetch(url.as_str(), e))?;

        Ok(FetchedPage { final_url, status, body })
    }

    /// Probe a link or image with a HEAD request, falling back to GET when
    /// the server rejects HEAD (405/501). Redirects are not followed so the
    /// 3xx class and its target survive classification.
    pub async fn probe(&self, url: &Url) -> ProbeOutcome {
        match self.probe_with(reqwest::Method::HEAD, url).await {
            ProbeOutcome::Broken { status: Some(405) | Some(501), .. } => {
                debug!("HEAD rejected for {}, retrying with GET", url);
                self.probe_with(reqwest::Method::GET, url).await
            }
            outcome => outcome,
        }
    }

    async fn probe_with(&self, method: reqwest::Method, url: &Url) -> ProbeOutcome {
        let response = match self.probes.request(method, url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                return ProbeOutcome::Broken {
                    status: None,
                    error: Some(AuditError::from_fetch(url.as_str(), e).to_string()),
                }
            }
        };

        let status = response.status().as_u16();
        if response.status().is_success() {
            ProbeOutcome::Reachable { status }
        } else if response.status().is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            ProbeOutcome::Redirect { status, location }
        } else {
            ProbeOutcome::Broken { status: Some(status), error: None }
        }
    }
}
