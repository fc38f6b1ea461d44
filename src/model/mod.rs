pub mod claims;
pub mod config;

pub use claims::{ClaimRecord, ScrapeRequest};
pub use config::{
    CannedProofConfig, Config, ExtractorConfig, FetcherConfig, SummarizerConfig,
};
