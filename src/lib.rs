//! Shiori - web novel crawler.
//!
//! This library provides functionality for:
//! - Describing novel sites declaratively (search URL and CSS selectors)
//! - Searching a site, listing a novel's chapters, and extracting chapter text
//! - Crawling a whole novel with paced requests and saving it as plain text

pub mod config;
pub mod console;
pub mod crawler;
pub mod error;
pub mod scrapers;
pub mod site;
pub mod utils;
pub mod writer;

// Re-export commonly used types
pub use config::Config;
pub use console::Console;
pub use crawler::{AbortReason, CrawlOutcome, CrawlReport, CrawlState, Crawler, Pacer, RandomPacer};
pub use error::{ConfigError, ExtractionError, FetchError, ParseError, SiteError, WriteError};
pub use scrapers::{
    ChapterContent, ChapterRef, Fetcher, HttpFetcher, Manuscript, ProfileScraper, Scraper,
    SearchHit,
};
pub use site::{SiteProfile, SiteRegistry};
pub use writer::{NovelWriter, TextFileWriter};
