//! Headless Chromium renderer for pages that need script execution

use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::detection::{DetectionOptions, default_executable};
use futures::StreamExt;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use super::FetchError;
use crate::model::FetcherConfig;

/// Locate the Chromium binary used for dynamic pages.
///
/// An explicitly configured path must exist; otherwise the usual install
/// locations are searched.
pub fn resolve_browser_executable(configured: Option<&Path>) -> Result<PathBuf, String> {
    match configured {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => Err(format!(
            "configured browser executable not found: {}",
            path.display()
        )),
        None => default_executable(DetectionOptions::default()),
    }
}

/// Renders pages in a fresh headless browser per request
pub struct BrowserRenderer {
    executable: Option<PathBuf>,
    user_agent: String,
    settle_delay: Duration,
    render_timeout: Duration,
}

impl BrowserRenderer {
    pub fn new(config: &FetcherConfig) -> Self {
        let executable = match resolve_browser_executable(config.chrome_executable.as_deref()) {
            Ok(path) => {
                tracing::info!(executable = %path.display(), "Headless browser available");
                Some(path)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Headless browser unavailable, dynamic pages will fail");
                None
            }
        };

        Self {
            executable,
            user_agent: config.user_agent.clone(),
            settle_delay: config.settle_delay(),
            render_timeout: config.render_timeout(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.executable.is_some()
    }

    /// Render a page and return its HTML after the settle delay.
    ///
    /// The browser is shut down on every path out of this function.
    pub async fn render(&self, url: &Url) -> Result<String, FetchError> {
        let executable = self.executable.as_deref().ok_or_else(|| {
            FetchError::BrowserUnavailable(
                "no Chromium executable found; set CHROME or fetcher.chrome_executable".to_string(),
            )
        })?;

        tracing::debug!(url = %url, settle_delay_ms = self.settle_delay.as_millis(), "Rendering dynamic page");

        let session = BrowserSession::launch(executable, &self.user_agent).await?;

        let result =
            match tokio::time::timeout(self.render_timeout, session.capture(url, self.settle_delay))
                .await
            {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(url = %url, timeout_secs = self.render_timeout.as_secs(), "Render timed out");
                    Err(FetchError::RenderTimeout(self.render_timeout))
                }
            };

        session.shutdown().await;
        result
    }
}

/// One launched browser process with its private profile directory.
///
/// `shutdown` closes the browser and removes the profile. A session dropped
/// without it (a cancelled request) stops the CDP handler and removes the
/// profile in `Drop`; the browser process itself is killed by `chromiumoxide`.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
    profile_removed: bool,
}

impl BrowserSession {
    async fn launch(executable: &Path, user_agent: &str) -> Result<Self, FetchError> {
        let profile_dir = std::env::temp_dir().join(format!("claim-scraper-{}", Uuid::new_v4()));

        let config = BrowserConfig::builder()
            .chrome_executable(executable)
            .user_data_dir(&profile_dir)
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={user_agent}"))
            .build()
            .map_err(FetchError::BrowserLaunch)?;

        let (browser, mut handler) = match Browser::launch(config).await {
            Ok(launched) => launched,
            Err(e) => {
                remove_profile_dir(&profile_dir).await;
                return Err(FetchError::BrowserLaunch(e.to_string()));
            }
        };

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Self {
            browser,
            handler,
            profile_dir,
            profile_removed: false,
        })
    }

    async fn capture(&self, url: &Url, settle_delay: Duration) -> Result<String, FetchError> {
        let page = self
            .browser
            .new_page(url.as_str())
            .await
            .map_err(|e| FetchError::Navigation(format!("{url}: {e}")))?;

        // Fixed wait; slower pages yield whatever has rendered so far
        tokio::time::sleep(settle_delay).await;

        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Navigation(format!("{url}: {e}")))?;

        if let Err(e) = page.close().await {
            tracing::debug!(url = %url, error = %e, "Failed to close page");
        }

        Ok(html)
    }

    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!(error = %e, "Failed to close browser");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!(error = %e, "Failed waiting for browser exit");
        }
        self.handler.abort();
        self.profile_removed = remove_profile_dir(&self.profile_dir).await;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
        if self.profile_removed {
            return;
        }
        // Only reached when the request was cancelled mid-render
        if let Err(e) = std::fs::remove_dir_all(&self.profile_dir) {
            tracing::debug!(path = %self.profile_dir.display(), error = %e, "Failed to remove browser profile");
        }
    }
}

/// Remove a browser profile directory; a missing directory counts as removed
async fn remove_profile_dir(path: &Path) -> bool {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Failed to remove browser profile");
            false
        }
    }
}
