pub mod extraction;
pub mod scrape;
pub mod summarize;

pub use extraction::ClaimExtractor;
pub use scrape::{ScrapeError, ScrapeService};
pub use summarize::{Condenser, OpenAiSummarizer};
