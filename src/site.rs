//! Site profiles: how to search, list, and read one source site.
//!
//! A profile is plain data. Selectors are opaque CSS selector strings,
//! interpreted by [`crate::scrapers::document`].

use crate::error::SiteError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Substitution slot for the query term in a search URL template.
pub const QUERY_SLOT: &str = "{}";

/// Default selector for a chapter page's title.
pub const DEFAULT_TITLE_SELECTOR: &str = "h1";

/// Declarative description of one source site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Registry key. Filled in from the config table name.
    #[serde(skip)]
    pub id: String,

    /// Site home page. Links are resolved against it when the page they
    /// came from has no absolute URL.
    pub base_url: String,

    /// Search URL with one [`QUERY_SLOT`] for the query term.
    pub search_url_template: String,

    /// Selects result links on the search page.
    pub list_selector: String,

    /// Selects chapter links on a novel's landing page.
    pub chapter_selector: String,

    /// Selects the body paragraphs on a chapter page.
    pub content_selector: String,

    /// Selects the chapter title on a chapter page.
    #[serde(default = "default_title_selector")]
    pub title_selector: String,
}

fn default_title_selector() -> String {
    DEFAULT_TITLE_SELECTOR.to_string()
}

impl SiteProfile {
    /// Builds the search URL for `query`.
    ///
    /// The query is form-urlencoded before substitution, so spaces,
    /// ampersands, and non-ASCII titles all produce a usable URL.
    pub fn search_url(&self, query: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        self.search_url_template.replacen(QUERY_SLOT, &encoded, 1)
    }

    /// The selectors of this profile, paired with their config key names.
    pub fn selectors(&self) -> [(&'static str, &str); 4] {
        [
            ("list_selector", &self.list_selector),
            ("chapter_selector", &self.chapter_selector),
            ("content_selector", &self.content_selector),
            ("title_selector", &self.title_selector),
        ]
    }
}

/// Immutable mapping from site id to profile, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: BTreeMap<String, SiteProfile>,
}

impl SiteRegistry {
    /// Creates a registry, stamping each profile with its key.
    pub fn new(sites: BTreeMap<String, SiteProfile>) -> Self {
        let sites = sites
            .into_iter()
            .map(|(id, mut profile)| {
                profile.id = id.clone();
                (id, profile)
            })
            .collect();

        Self { sites }
    }

    /// Looks up a profile by id.
    pub fn get(&self, id: &str) -> Result<&SiteProfile, SiteError> {
        self.sites
            .get(id)
            .ok_or_else(|| SiteError::UnknownSite(id.to_string()))
    }

    /// Returns the supported site ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sites.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Profiles for the sites supported out of the box.
pub fn default_sites() -> BTreeMap<String, SiteProfile> {
    let mut sites = BTreeMap::new();

    sites.insert(
        "hongxiu".to_string(),
        SiteProfile {
            id: "hongxiu".to_string(),
            base_url: "https://www.hongxiu.com/".to_string(),
            search_url_template: "https://www.hongxiu.com/search?kw={}".to_string(),
            list_selector: ".book-list a".to_string(),
            chapter_selector: ".volume-list a".to_string(),
            content_selector: ".read-content".to_string(),
            title_selector: default_title_selector(),
        },
    );

    sites.insert(
        "zongheng".to_string(),
        SiteProfile {
            id: "zongheng".to_string(),
            base_url: "http://www.zongheng.com/".to_string(),
            search_url_template: "http://search.zongheng.com/s?keyword={}".to_string(),
            list_selector: ".search-tab a".to_string(),
            chapter_selector: ".chapter-list a".to_string(),
            content_selector: ".content".to_string(),
            title_selector: default_title_selector(),
        },
    );

    sites
}
