//! Scraper driven entirely by a [`SiteProfile`].

use super::document::Document;
use super::{ChapterContent, ChapterRef, Fetcher, Scraper, SearchHit};
use crate::error::{ExtractionError, ParseError, SiteError};
use crate::site::{SiteProfile, SiteRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Generic scraper for any site described by a profile.
pub struct ProfileScraper {
    profile: SiteProfile,
    fetcher: Arc<dyn Fetcher>,
}

impl ProfileScraper {
    pub fn new(profile: SiteProfile, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { profile, fetcher }
    }

    /// Looks up `site_id` in the registry.
    ///
    /// Unknown ids fail here, before any request is made.
    pub fn for_site(
        registry: &SiteRegistry,
        site_id: &str,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, SiteError> {
        let profile = registry.get(site_id)?.clone();
        Ok(Self::new(profile, fetcher))
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Fetches `url` and collects (text, href) pairs for `selector`.
    ///
    /// Fetch failures are logged and yield an empty list.
    async fn fetch_links(&self, url: &str, selector: &str, what: &str) -> Vec<(String, String)> {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(site = %self.profile.id, url, error = %e, "{what} fetch failed, treating as empty");
                return Vec::new();
            }
        };

        match extract_links(&html, selector) {
            Ok(links) => links,
            Err(e) => {
                warn!(site = %self.profile.id, url, error = %e, "{what} parse failed, treating as empty");
                Vec::new()
            }
        }
    }
}

/// Collects the text and href of each element matching `selector`.
///
/// Matches without an href are skipped and logged.
fn extract_links(html: &str, selector: &str) -> Result<Vec<(String, String)>, ParseError> {
    let elements = Document::parse(html).select(selector)?;

    let links = elements
        .into_iter()
        .filter_map(|elem| match elem.href() {
            Some(href) => Some((elem.text.clone(), href.to_string())),
            None => {
                let missing = ParseError::MissingAttribute {
                    selector: selector.to_string(),
                    attribute: "href".to_string(),
                };
                warn!(text = %elem.text, "skipping link: {missing}");
                None
            }
        })
        .collect();

    Ok(links)
}

/// Extracts a chapter's title and body from its page.
fn extract_chapter(html: &str, profile: &SiteProfile) -> Result<ChapterContent, ExtractionError> {
    let doc = Document::parse(html);

    let title = doc.select_one(&profile.title_selector)?.text;
    if title.is_empty() {
        return Err(ExtractionError::MissingElement(format!(
            "{} (empty)",
            profile.title_selector
        )));
    }

    let blocks = doc.text_blocks(&profile.content_selector)?;
    if blocks.is_empty() {
        return Err(ExtractionError::MissingElement(
            profile.content_selector.clone(),
        ));
    }

    Ok(ChapterContent {
        title,
        body: blocks.join("\n"),
    })
}

#[async_trait]
impl Scraper for ProfileScraper {
    fn id(&self) -> &str {
        &self.profile.id
    }

    fn base_url(&self) -> &str {
        &self.profile.base_url
    }

    fn search_url(&self, query: &str) -> String {
        self.profile.search_url(query)
    }

    async fn search(&self, query: &str) -> Vec<SearchHit> {
        let url = self.search_url(query);
        debug!(site = %self.profile.id, query, url = %url, "searching");

        self.fetch_links(&url, &self.profile.list_selector, "search")
            .await
            .into_iter()
            .map(|(title, url)| SearchHit { title, url })
            .collect()
    }

    async fn get_chapter_list(&self, novel_url: &str) -> Vec<ChapterRef> {
        self.fetch_links(novel_url, &self.profile.chapter_selector, "chapter list")
            .await
            .into_iter()
            .map(|(title, url)| ChapterRef { title, url })
            .collect()
    }

    async fn download_chapter(
        &self,
        chapter_url: &str,
    ) -> Result<ChapterContent, ExtractionError> {
        let html = self.fetcher.fetch(chapter_url).await?;
        extract_chapter(&html, &self.profile)
    }
}
