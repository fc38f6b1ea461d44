//! Application state and service initialization
//!
//! This module centralizes service construction so handlers only ever see
//! fully built, read-only services.

use std::sync::Arc;

use crate::model::Config;
use crate::retriever::{PageFetcher, WebPageFetcher};
use crate::service::{ClaimExtractor, Condenser, OpenAiSummarizer, ScrapeService};

/// Application state shared by all workers
pub struct AppState {
    pub scrape_service: Arc<ScrapeService>,
}

impl AppState {
    /// Build application state from configuration
    ///
    /// This performs:
    /// 1. Page fetcher construction (including browser detection)
    /// 2. OpenAI summarizer initialization when summarization is enabled
    /// 3. Extraction rule table construction
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(WebPageFetcher::new(&config.fetcher));
        let condenser = Self::build_condenser(config)?;

        let extractor = ClaimExtractor::from_config(&config.extractor, condenser.is_some());

        let scrape_service = ScrapeService::new(
            fetcher,
            condenser,
            extractor,
            config.fetcher.request_timeout(),
        );

        Ok(Self {
            scrape_service: Arc::new(scrape_service),
        })
    }

    /// Build the summarization assist, if configured
    fn build_condenser(config: &Config) -> Result<Option<Condenser>, AppError> {
        if !config.summarization_enabled() {
            tracing::info!(
                enabled = config.summarizer.enabled,
                api_key_present = config.openai_api_key.is_some(),
                "Summarization assist disabled"
            );
            return Ok(None);
        }

        let api_key = config
            .openai_api_key
            .as_deref()
            .ok_or(AppError::MissingConfig("OPENAI_API_KEY"))?;

        let summarizer = OpenAiSummarizer::new(api_key, config.summarizer.model.clone())
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to build summarizer");
                AppError::InvalidConfig("Invalid OPENAI_API_KEY")
            })?;

        Ok(Some(Condenser::new(Arc::new(summarizer), &config.summarizer)))
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}
