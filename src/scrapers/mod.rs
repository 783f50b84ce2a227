//! Scraper trait and common types for novel sites.
//!
//! A [`Scraper`] answers the three questions a crawl asks of a site:
//! which novels match a title, which chapters a novel has, and what a
//! chapter says. [`ProfileScraper`] answers them from a declarative
//! [`SiteProfile`](crate::site::SiteProfile).

pub mod document;
mod fetcher;
mod profile;

pub use fetcher::{Fetcher, HttpFetcher};
pub use profile::ProfileScraper;

use crate::error::ExtractionError;
use async_trait::async_trait;

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Novel title as shown on the search page.
    pub title: String,

    /// Link to the novel's landing page, exactly as the site emitted it.
    pub url: String,
}

/// A chapter link from a novel's landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    /// Chapter title as shown in the table of contents.
    pub title: String,

    /// Link to the chapter page, exactly as the site emitted it.
    pub url: String,
}

/// The extracted text of one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterContent {
    /// Title taken from the chapter page itself.
    pub title: String,

    /// Body paragraphs joined by newlines.
    pub body: String,
}

impl ChapterContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Successfully extracted chapters of one novel, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manuscript {
    chapters: Vec<ChapterContent>,
}

impl Manuscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chapter. The manuscript only ever grows.
    pub fn push(&mut self, chapter: ChapterContent) {
        self.chapters.push(chapter);
    }

    pub fn chapters(&self) -> &[ChapterContent] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

impl FromIterator<ChapterContent> for Manuscript {
    fn from_iter<I: IntoIterator<Item = ChapterContent>>(iter: I) -> Self {
        Self {
            chapters: iter.into_iter().collect(),
        }
    }
}

/// Trait for novel site scrapers.
///
/// Search and chapter listing never fail outright: a network failure is
/// logged and reported as an empty list. Chapter downloads report why
/// they failed so the caller can log and skip.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Returns the site id this scraper serves.
    fn id(&self) -> &str;

    /// Returns the site's home page, used to resolve links when the page
    /// they came from has no usable URL.
    fn base_url(&self) -> &str;

    /// Returns the URL a search for `query` is sent to.
    fn search_url(&self, query: &str) -> String;

    /// Searches the site for a novel title.
    async fn search(&self, query: &str) -> Vec<SearchHit>;

    /// Fetches the ordered chapter list from a novel's landing page.
    async fn get_chapter_list(&self, novel_url: &str) -> Vec<ChapterRef>;

    /// Downloads and extracts a single chapter.
    async fn download_chapter(&self, chapter_url: &str) -> Result<ChapterContent, ExtractionError>;
}
