//! Summarization assist that condenses long pages before extraction
//!
//! Page text is split into fixed-size word windows, each window is summarized
//! independently, and the summaries are joined in order. Any failure falls
//! back to a prefix of the raw text; nothing here is ever surfaced to callers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;

use crate::model::SummarizerConfig;

/// System prompt for chunk summarization
pub const SUMMARY_PREAMBLE: &str = r#"You condense class-action settlement notices.

Keep, using the original wording wherever possible:
- the total settlement fund amount
- the maximum payment per person or per claimant
- what proof a claimant has to submit, or that no proof is required
- payment tiers and who is eligible for each
- the deadline to file a claim, including the full date

Write one fact per line. Do not add facts that are not in the text.
If the text contains none of these facts, summarize it in one short line."#;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SummarizationError {
    #[error("Failed to create OpenAI client: {0}")]
    ClientInit(String),

    #[error("Summarization request failed: {0}")]
    RequestFailed(String),

    #[error("Summarization timed out after {0:?}")]
    Timeout(Duration),

    #[error("Summarizer returned an empty summary")]
    EmptySummary,
}

/// Text summarization capability
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize one chunk of page text
    async fn summarize(&self, chunk: &str) -> Result<String, SummarizationError>;
}

/// Build the user prompt for one chunk
pub fn build_summary_prompt(chunk: &str) -> String {
    format!(
        r#"Summarize the key claim facts in this excerpt of a settlement web page.

## Excerpt

{chunk}"#
    )
}

/// Summarizer backed by an OpenAI chat model
pub struct OpenAiSummarizer {
    client: openai::Client,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: &str, model: impl Into<String>) -> Result<Self, SummarizationError> {
        let client = openai::Client::new(api_key)
            .map_err(|e| SummarizationError::ClientInit(e.to_string()))?;

        let model = model.into();
        tracing::info!(model = %model, "Summarizer initialized");
        Ok(Self { client, model })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, chunk: &str) -> Result<String, SummarizationError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(SUMMARY_PREAMBLE)
            .temperature(0.0)
            .build();

        let prompt = build_summary_prompt(chunk);
        let start_time = Instant::now();

        let summary = agent.prompt(prompt.as_str()).await.map_err(|e| {
            tracing::warn!(
                model = %self.model,
                elapsed_ms = start_time.elapsed().as_millis(),
                prompt_length = prompt.len(),
                error = %e,
                "OpenAI summarization call failed"
            );
            SummarizationError::RequestFailed(e.to_string())
        })?;

        tracing::debug!(
            model = %self.model,
            elapsed_ms = start_time.elapsed().as_millis(),
            chunk_length = chunk.len(),
            summary_length = summary.len(),
            "OpenAI summarization call completed"
        );

        if summary.trim().is_empty() {
            return Err(SummarizationError::EmptySummary);
        }

        Ok(summary)
    }
}

/// Condenses page text through a [`Summarizer`]
pub struct Condenser {
    summarizer: Arc<dyn Summarizer>,
    chunk_words: usize,
    fallback_chars: usize,
    chunk_timeout: Duration,
}

impl Condenser {
    pub fn new(summarizer: Arc<dyn Summarizer>, config: &SummarizerConfig) -> Self {
        Self {
            summarizer,
            chunk_words: config.chunk_words.max(1),
            fallback_chars: config.fallback_chars,
            chunk_timeout: config.chunk_timeout(),
        }
    }

    /// Replace raw page text with concatenated chunk summaries.
    ///
    /// Each chunk call is bounded by `chunk_timeout`. On any summarization
    /// failure, a timeout included, the first `fallback_chars` characters of
    /// the raw text are returned instead. No retries.
    pub async fn condense(&self, text: &str) -> String {
        let chunks = chunk_words(text, self.chunk_words);
        if chunks.is_empty() {
            return String::new();
        }

        let mut summaries = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            match self.summarize_chunk(chunk).await {
                Ok(summary) if !summary.trim().is_empty() => summaries.push(summary.trim().to_string()),
                Ok(_) => {
                    tracing::warn!(chunk = index, "Empty summary, falling back to raw text prefix");
                    return truncate_chars(text, self.fallback_chars).to_string();
                }
                Err(e) => {
                    tracing::warn!(
                        chunk = index,
                        chunks = chunks.len(),
                        error = %e,
                        "Summarization failed, falling back to raw text prefix"
                    );
                    return truncate_chars(text, self.fallback_chars).to_string();
                }
            }
        }

        tracing::debug!(
            chunks = chunks.len(),
            raw_length = text.len(),
            "Page text condensed"
        );

        summaries.join("\n")
    }

    async fn summarize_chunk(&self, chunk: &str) -> Result<String, SummarizationError> {
        tokio::time::timeout(self.chunk_timeout, self.summarizer.summarize(chunk))
            .await
            .map_err(|_| SummarizationError::Timeout(self.chunk_timeout))?
    }
}

/// Split text into windows of at most `size` whitespace-separated words
pub fn chunk_words(text: &str, size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(size.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// Prefix of at most `max` characters, cut on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns the first three words of each chunk and records what it saw
    #[derive(Default)]
    struct RecordingSummarizer {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(&self, chunk: &str) -> Result<String, SummarizationError> {
            self.seen.lock().unwrap().push(chunk.to_string());
            Ok(chunk.split_whitespace().take(3).collect::<Vec<_>>().join(" "))
        }
    }

    struct FailingSummarizer;

    #[async_trait]
    impl Summarizer for FailingSummarizer {
        async fn summarize(&self, _chunk: &str) -> Result<String, SummarizationError> {
            Err(SummarizationError::RequestFailed("service unavailable".to_string()))
        }
    }

    /// Never answers
    struct HangingSummarizer;

    #[async_trait]
    impl Summarizer for HangingSummarizer {
        async fn summarize(&self, _chunk: &str) -> Result<String, SummarizationError> {
            futures::future::pending().await
        }
    }

    struct BlankSummarizer;

    #[async_trait]
    impl Summarizer for BlankSummarizer {
        async fn summarize(&self, _chunk: &str) -> Result<String, SummarizationError> {
            Ok("   ".to_string())
        }
    }

    fn config(chunk_words: usize, fallback_chars: usize) -> SummarizerConfig {
        SummarizerConfig {
            chunk_words,
            fallback_chars,
            ..Default::default()
        }
    }

    #[test]
    fn test_chunk_words() {
        let chunks = chunk_words("a b c\n d  e", 2);
        assert_eq!(chunks, vec!["a b", "c d", "e"]);
        assert!(chunk_words("   ", 800).is_empty());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 1000), "short");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[tokio::test]
    async fn test_condense_joins_summaries_in_order() {
        let summarizer = Arc::new(RecordingSummarizer::default());
        let condenser = Condenser::new(summarizer.clone(), &config(4, 1000));

        let text = "one two three four five six seven eight nine";
        let condensed = condenser.condense(text).await;

        assert_eq!(condensed, "one two three\nfive six seven\nnine");
        let seen = summarizer.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                "one two three four".to_string(),
                "five six seven eight".to_string(),
                "nine".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_condense_falls_back_on_failure() {
        let condenser = Condenser::new(Arc::new(FailingSummarizer), &config(800, 10));
        let condensed = condenser.condense("Settlement Fund: $1,200,000 total").await;
        assert_eq!(condensed, "Settlement");
    }

    #[tokio::test(start_paused = true)]
    async fn test_condense_falls_back_on_chunk_timeout() {
        let condenser = Condenser::new(Arc::new(HangingSummarizer), &config(800, 10));
        let started = tokio::time::Instant::now();

        let condensed = condenser.condense("Settlement Fund: $1,200,000 total").await;

        assert_eq!(condensed, "Settlement");
        assert!(started.elapsed() >= SummarizerConfig::default().chunk_timeout());
    }

    #[test]
    fn test_openai_summarizer_builds_with_key() {
        assert!(OpenAiSummarizer::new("sk-test", "gpt-4o-mini").is_ok());
    }

    #[tokio::test]
    async fn test_condense_falls_back_on_blank_summary() {
        let condenser = Condenser::new(Arc::new(BlankSummarizer), &config(800, 1000));
        let text = "Maximum payout per person: $450";
        assert_eq!(condenser.condense(text).await, text);
    }

    #[tokio::test]
    async fn test_condense_empty_text_skips_summarizer() {
        let summarizer = Arc::new(RecordingSummarizer::default());
        let condenser = Condenser::new(summarizer.clone(), &config(800, 1000));

        assert_eq!(condenser.condense(" \n ").await, "");
        assert!(summarizer.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_prompt_contains_chunk() {
        let prompt = build_summary_prompt("Settlement Fund: $1,200,000");
        assert!(prompt.contains("Settlement Fund: $1,200,000"));
    }
}
