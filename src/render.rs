// SPDX-License-Identifier: PMPL-1.0-or-later
//! Headless-browser rendering for pages that build their DOM client-side.
//!
//! The renderer drives a system Chromium binary as a scoped child process:
//! spawn with piped output, wait under the run timeout, and kill the child
//! on expiry so the browser is released on every exit path. When no binary
//! can be detected the run aborts with a configuration error before any
//! page is visited (fail-safe).

use crate::error::{AuditError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};
use url::Url;

/// Chromium binary names probed in order
const BROWSER_BINARIES: &[&str] = &["chromium", "chromium-browser", "google-chrome", "chrome"];

/// Extra headroom past the page timeout before the child is killed
const KILL_GRACE: Duration = Duration::from_secs(5);

/// Headless browser renderer
pub struct Renderer {
    binary: String,
    timeout: Duration,
}

impl Renderer {
    /// Detect an available Chromium binary and build a renderer, or fail
    /// with a configuration error.
    pub async fn detect(timeout: Duration) -> Result<Self> {
        for binary in BROWSER_BINARIES {
            if Self::check_binary(binary).await {
                info!("Using {} for rendered fetches", binary);
                return Ok(Self { binary: binary.to_string(), timeout });
            }
        }
        Err(AuditError::Config(format!(
            "rendered mode requires a headless browser; none of {} found on PATH",
            BROWSER_BINARIES.join(", ")
        )))
    }

    /// Check whether a browser binary is available and functional
    async fn check_binary(binary: &str) -> bool {
        Command::new(binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Binary the renderer resolved to
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Load a URL, execute its scripts, and return the serialized final DOM.
    ///
    /// The child process is killed if it outlives the timeout; a page that
    /// never settles is a timeout failure, not a hang.
    pub async fn render(&self, url: &Url) -> Result<String> {
        debug!("Rendering {} with {}", url, self.binary);

        let mut child = Command::new(&self.binary)
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg(format!("--virtual-time-budget={}", self.timeout.as_millis().min(10_000)))
            .arg("--dump-dom")
            .arg(url.as_str())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AuditError::Config(format!("failed to launch {}: {}", self.binary, e)))?;

        let stdout = child.stdout.take();

        let wait = tokio::time::timeout(self.timeout + KILL_GRACE, async {
            let mut body = String::new();
            if let Some(mut out) = stdout {
                use tokio::io::AsyncReadExt;
                out.read_to_string(&mut body).await?;
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, body))
        })
        .await;

        match wait {
            Ok(Ok((status, body))) => {
                if !status.success() {
                    return Err(AuditError::Parse {
                        url: url.to_string(),
                        message: format!("browser exited with {:?}", status.code()),
                    });
                }
                if body.trim().is_empty() {
                    return Err(AuditError::Parse {
                        url: url.to_string(),
                        message: "browser produced an empty DOM".to_string(),
                    });
                }
                Ok(body)
            }
            Ok(Err(e)) => Err(AuditError::Io(e)),
            Err(_) => {
                warn!("Render of {} timed out after {}s, killing browser", url, self.timeout.as_secs());
                // kill_on_drop is the backstop; kill explicitly so the
                // browser is gone before we move to the next page
                let _ = child.kill().await;
                Err(AuditError::Timeout { url: url.to_string() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_probe_fails() {
        assert!(!Renderer::check_binary("auditbot-nonexistent-browser").await);
    }

    #[tokio::test]
    async fn test_detect_fails_safe_without_browser() {
        // On hosts without a browser this is the fail-safe path; on hosts
        // with one, detection must name a probed binary.
        match Renderer::detect(Duration::from_secs(5)).await {
            Ok(renderer) => assert!(BROWSER_BINARIES.contains(&renderer.binary())),
            Err(err) => assert!(err.to_string().contains("headless browser")),
        }
    }
}
