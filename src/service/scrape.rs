//! Scrape pipeline: fetch page text, optionally condense it, extract claim details

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::model::ClaimRecord;
use crate::retriever::{FetchError, PageFetcher, parse_target_url};
use crate::service::extraction::ClaimExtractor;
use crate::service::summarize::Condenser;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Fetching page timed out after {0:?}")]
    Timeout(Duration),
}

/// Service turning a claim page URL into a [`ClaimRecord`]
pub struct ScrapeService {
    fetcher: Arc<dyn PageFetcher>,
    condenser: Option<Condenser>,
    extractor: ClaimExtractor,
    request_timeout: Duration,
}

impl ScrapeService {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        condenser: Option<Condenser>,
        extractor: ClaimExtractor,
        request_timeout: Duration,
    ) -> Self {
        tracing::info!(
            summarization = condenser.is_some(),
            request_timeout_secs = request_timeout.as_secs(),
            "Scrape service initialized"
        );
        Self {
            fetcher,
            condenser,
            extractor,
            request_timeout,
        }
    }

    /// Whether dynamic pages can be rendered
    pub fn browser_available(&self) -> bool {
        self.fetcher.browser_available()
    }

    pub fn summarization_enabled(&self) -> bool {
        self.condenser.is_some()
    }

    /// Run the whole pipeline for one URL; either a full record or an error
    pub async fn scrape(&self, raw_url: &str) -> Result<ClaimRecord, ScrapeError> {
        let url = parse_target_url(raw_url)?;
        let start_time = Instant::now();

        tracing::info!(url = %url, "Scraping claim page");

        let text = tokio::time::timeout(self.request_timeout, self.fetcher.fetch_text(&url))
            .await
            .map_err(|_| ScrapeError::Timeout(self.request_timeout))??;

        let text = match &self.condenser {
            Some(condenser) => condenser.condense(&text).await,
            None => text,
        };

        let record = self.extractor.extract(&text);

        tracing::info!(
            url = %url,
            elapsed_ms = start_time.elapsed().as_millis(),
            text_length = text.len(),
            populated_fields = record.populated_fields(),
            "Scrape complete"
        );

        Ok(record)
    }
}
