//! Plain HTTP retriever for pages whose content is in the initial response

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use url::Url;

use super::{FetchError, PageKind};
use crate::model::FetcherConfig;

/// Retriever for static HTML pages
pub struct StaticPageRetriever {
    client: Client,
    probe_timeout: Duration,
}

impl StaticPageRetriever {
    pub fn new(config: &FetcherConfig) -> Self {
        Self {
            client: Client::builder()
                .user_agent(config.user_agent.as_str())
                .build()
                .unwrap_or_else(|_| Client::new()),
            probe_timeout: config.probe_timeout(),
        }
    }

    /// Decide whether the page can be read without a browser.
    ///
    /// Any failure here resolves to [`PageKind::Dynamic`]; the probe error is
    /// only logged.
    pub async fn classify(&self, url: &Url) -> PageKind {
        let response = match self
            .client
            .get(url.as_str())
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Classification probe failed, assuming dynamic page");
                return PageKind::Dynamic;
            }
        };

        let kind = classify_response(response.status().is_success(), response.headers());
        if kind == PageKind::Dynamic {
            tracing::debug!(
                url = %url,
                status = response.status().as_u16(),
                content_type = content_type(response.headers()).unwrap_or("<none>"),
                "Probe response is not a successful HTML page, assuming dynamic page"
            );
        }
        kind
    }

    /// Fetch the raw HTML of a page
    pub async fn fetch_html(&self, url: &Url) -> Result<String, FetchError> {
        tracing::debug!(url = %url, "Fetching static page");

        let response = self.client.get(url.as_str()).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

/// A successful response declaring HTML is static, everything else dynamic
fn classify_response(success: bool, headers: &HeaderMap) -> PageKind {
    let is_html = content_type(headers)
        .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false);

    if success && is_html {
        PageKind::Static
    } else {
        PageKind::Dynamic
    }
}
