//! Page retrievers turning a claim page URL into visible plain text

mod browser;
mod static_page;
mod text;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::model::FetcherConfig;

pub use browser::BrowserRenderer;
pub use static_page::StaticPageRetriever;
pub use text::html_to_text;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP {status}: {url}")]
    Status { status: u16, url: String },

    #[error("Headless browser unavailable: {0}")]
    BrowserUnavailable(String),

    #[error("Failed to launch headless browser: {0}")]
    BrowserLaunch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Render timed out after {0:?}")]
    RenderTimeout(Duration),
}

/// How a page has to be fetched to see its content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Content is present in the initial HTML response
    Static,
    /// Content needs script execution in a browser
    Dynamic,
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageKind::Static => write!(f, "static"),
            PageKind::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// Trait for anything that can produce the visible text of a page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page and return its visible text, one element per line
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError>;

    /// Whether the dynamic path can currently be served
    fn browser_available(&self) -> bool;
}

/// Parse and validate a target URL; only http(s) pages are fetched
pub fn parse_target_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{other}'"
        ))),
    }
}

/// Fetcher that classifies each page and takes the static or headless path
pub struct WebPageFetcher {
    static_page: StaticPageRetriever,
    browser: BrowserRenderer,
}

impl WebPageFetcher {
    pub fn new(config: &FetcherConfig) -> Self {
        tracing::info!(
            probe_timeout_secs = config.probe_timeout_secs,
            settle_delay_ms = config.settle_delay_ms,
            render_timeout_secs = config.render_timeout_secs,
            "Page fetcher configured"
        );

        Self {
            static_page: StaticPageRetriever::new(config),
            browser: BrowserRenderer::new(config),
        }
    }
}

#[async_trait]
impl PageFetcher for WebPageFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let kind = self.static_page.classify(url).await;
        tracing::debug!(url = %url, kind = %kind, "Classified page");

        let html = match kind {
            PageKind::Static => self.static_page.fetch_html(url).await?,
            PageKind::Dynamic => self.browser.render(url).await?,
        };

        let text = html_to_text(&html);
        tracing::info!(
            url = %url,
            kind = %kind,
            html_length = html.len(),
            text_length = text.len(),
            "Fetched page text"
        );

        Ok(text)
    }

    fn browser_available(&self) -> bool {
        self.browser.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_target_url_accepts_http() {
        let url = parse_target_url(" https://example.com/settlement ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/settlement");
    }

    #[test]
    fn test_parse_target_url_rejects_garbage() {
        let result = parse_target_url("not a url");
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_target_url_rejects_other_schemes() {
        let result = parse_target_url("file:///etc/passwd");
        assert!(matches!(result, Err(FetchError::InvalidUrl(msg)) if msg.contains("file")));
    }

    #[tokio::test]
    async fn test_unreachable_page_takes_dynamic_path() {
        let config = FetcherConfig {
            probe_timeout_secs: 1,
            chrome_executable: Some(PathBuf::from("/nonexistent/chromium-claim")),
            ..Default::default()
        };
        let fetcher = WebPageFetcher::new(&config);
        assert!(!fetcher.browser_available());

        // The probe fails, so the page is rendered; the probe error itself never surfaces
        let url = Url::parse("http://127.0.0.1:1/settlement").unwrap();
        let result = fetcher.fetch_text(&url).await;
        assert!(matches!(result, Err(FetchError::BrowserUnavailable(_))));
    }
}
