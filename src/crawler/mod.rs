//! End-to-end crawl of one novel.
//!
//! The crawl moves through a fixed sequence of states:
//!
//! ```text
//! Idle -> Resolving -> Enumerating -> FetchingChapters -> Persisting -> Done
//!             |             |                |                |
//!             +-------------+----------------+----------------+--> Aborted
//! ```
//!
//! Chapters are fetched one at a time with a pacing delay between them.
//! A failed chapter is logged and skipped; only an empty search, an empty
//! chapter list, an empty manuscript, or cancellation abort the crawl.

mod pacing;

pub use pacing::{Pacer, RandomPacer};

use crate::console::Console;
use crate::error::{ExtractionError, WriteError};
use crate::scrapers::{ChapterRef, Manuscript, Scraper};
use crate::utils::resolve_url_or;
use crate::writer::NovelWriter;
use std::fmt;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where a crawl currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Resolving,
    Enumerating,
    FetchingChapters,
    Persisting,
    Done,
    Aborted,
}

/// Why a crawl stopped without producing a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The search returned no results.
    NovelNotFound,
    /// The novel page listed no chapters.
    NoChapters,
    /// Every chapter failed to extract.
    NoContent,
    /// The crawl was cancelled between chapters.
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            AbortReason::NovelNotFound => "novel not found",
            AbortReason::NoChapters => "no chapters",
            AbortReason::NoContent => "no content extracted",
            AbortReason::Cancelled => "cancelled",
        };
        f.write_str(reason)
    }
}

/// A chapter that was attempted and left out of the manuscript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChapter {
    pub chapter: ChapterRef,
    pub error: ExtractionError,
}

/// Summary of a crawl that wrote its output.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Title of the first search hit, used to name the output.
    pub novel_title: String,
    /// Resolved landing page of the novel.
    pub novel_url: String,
    /// Where the manuscript was written.
    pub path: PathBuf,
    /// Number of chapters listed on the landing page.
    pub chapters_attempted: usize,
    /// Number of chapters in the written manuscript.
    pub chapters_saved: usize,
    /// Chapters that failed, in reading order.
    pub skipped: Vec<SkippedChapter>,
}

/// How a crawl ended.
#[derive(Debug)]
pub enum CrawlOutcome {
    Done(CrawlReport),
    Aborted(AbortReason),
    /// The manuscript was complete but could not be persisted.
    WriteFailed {
        novel_title: String,
        error: WriteError,
    },
}

impl CrawlOutcome {
    /// The terminal state this outcome corresponds to.
    pub fn state(&self) -> CrawlState {
        match self {
            CrawlOutcome::Done(_) => CrawlState::Done,
            CrawlOutcome::Aborted(_) | CrawlOutcome::WriteFailed { .. } => CrawlState::Aborted,
        }
    }
}

/// Drives search, chapter listing, chapter download, and persistence.
pub struct Crawler<'a> {
    scraper: &'a dyn Scraper,
    pacer: &'a dyn Pacer,
    writer: &'a dyn NovelWriter,
    cancel: CancellationToken,
    console: Console,
}

impl<'a> Crawler<'a> {
    pub fn new(scraper: &'a dyn Scraper, pacer: &'a dyn Pacer, writer: &'a dyn NovelWriter) -> Self {
        Self {
            scraper,
            pacer,
            writer,
            cancel: CancellationToken::new(),
            console: Console::new(),
        }
    }

    /// Uses `cancel` to stop the crawl between chapters.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    fn transition(&self, state: &mut CrawlState, next: CrawlState) {
        debug!(site = self.scraper.id(), from = ?*state, to = ?next, "crawl state");
        *state = next;
    }

    fn abort(&self, state: &mut CrawlState, reason: AbortReason) -> CrawlOutcome {
        self.transition(state, CrawlState::Aborted);
        info!(site = self.scraper.id(), %reason, "crawl aborted");
        CrawlOutcome::Aborted(reason)
    }

    /// Crawls the novel best matching `query`.
    ///
    /// The first search hit is taken as the novel. Sites that return
    /// several matches are not disambiguated.
    pub async fn crawl(&self, query: &str) -> CrawlOutcome {
        let mut state = CrawlState::Idle;

        self.transition(&mut state, CrawlState::Resolving);
        self.console.searching(query);
        let hits = self.scraper.search(query).await;
        let hit_count = hits.len();
        let Some(hit) = hits.into_iter().next() else {
            return self.abort(&mut state, AbortReason::NovelNotFound);
        };
        if hit_count > 1 {
            info!(hits = hit_count, chosen = %hit.title, "several search hits, using the first");
        }
        let novel_url = resolve_url_or(
            &self.scraper.search_url(query),
            self.scraper.base_url(),
            &hit.url,
        );
        self.console.found_novel(&hit.title, hit_count);

        self.transition(&mut state, CrawlState::Enumerating);
        let chapters = self.scraper.get_chapter_list(&novel_url).await;
        if chapters.is_empty() {
            return self.abort(&mut state, AbortReason::NoChapters);
        }
        self.console.found_chapters(chapters.len());

        self.transition(&mut state, CrawlState::FetchingChapters);
        let Some((manuscript, skipped)) = self.fetch_chapters(&novel_url, &chapters).await else {
            return self.abort(&mut state, AbortReason::Cancelled);
        };

        self.transition(&mut state, CrawlState::Persisting);
        if manuscript.is_empty() {
            return self.abort(&mut state, AbortReason::NoContent);
        }

        match self.writer.write(&hit.title, &manuscript) {
            Ok(path) => {
                self.transition(&mut state, CrawlState::Done);
                CrawlOutcome::Done(CrawlReport {
                    novel_title: hit.title,
                    novel_url,
                    path,
                    chapters_attempted: chapters.len(),
                    chapters_saved: manuscript.len(),
                    skipped,
                })
            }
            Err(error) => {
                self.transition(&mut state, CrawlState::Aborted);
                warn!(novel = %hit.title, %error, "failed to write manuscript");
                CrawlOutcome::WriteFailed {
                    novel_title: hit.title,
                    error,
                }
            }
        }
    }

    /// Downloads chapters in order, pacing between them.
    ///
    /// Returns `None` if cancelled.
    async fn fetch_chapters(
        &self,
        novel_url: &str,
        chapters: &[ChapterRef],
    ) -> Option<(Manuscript, Vec<SkippedChapter>)> {
        let mut manuscript = Manuscript::new();
        let mut skipped = Vec::new();
        let total = chapters.len();

        for (idx, chapter) in chapters.iter().enumerate() {
            if idx > 0 {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return None,
                    _ = self.pacer.pause() => {}
                }
            }
            if self.cancel.is_cancelled() {
                return None;
            }

            self.console.chapter_progress(idx + 1, total, &chapter.title);

            let url = resolve_url_or(novel_url, self.scraper.base_url(), &chapter.url);
            match self.scraper.download_chapter(&url).await {
                Ok(content) => manuscript.push(content),
                Err(error) => {
                    warn!(chapter = %chapter.title, url = %url, %error, "skipping chapter");
                    self.console
                        .chapter_skipped(idx + 1, total, &chapter.title, &error);
                    skipped.push(SkippedChapter {
                        chapter: chapter.clone(),
                        error,
                    });
                }
            }
        }
        self.console.end_progress();

        Some((manuscript, skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::scrapers::{ChapterContent, SearchHit};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeScraper {
        hits: Vec<SearchHit>,
        chapters: Vec<ChapterRef>,
        broken: HashSet<String>,
        search_url_override: Option<String>,
        searches: AtomicUsize,
        listings: Mutex<Vec<String>>,
        downloads: Mutex<Vec<String>>,
    }

    impl FakeScraper {
        fn novel(chapter_count: usize) -> Self {
            Self {
                hits: vec![
                    SearchHit {
                        title: "斗破苍穹".to_string(),
                        url: "/book/1".to_string(),
                    },
                    SearchHit {
                        title: "斗破苍穹外传".to_string(),
                        url: "/book/2".to_string(),
                    },
                ],
                chapters: (1..=chapter_count)
                    .map(|i| ChapterRef {
                        title: format!("Chapter {i}"),
                        url: format!("c/{i}"),
                    })
                    .collect(),
                ..Self::default()
            }
        }

        fn breaking(mut self, urls: &[&str]) -> Self {
            self.broken = urls.iter().map(|u| u.to_string()).collect();
            self
        }
    }

    #[async_trait]
    impl Scraper for FakeScraper {
        fn id(&self) -> &str {
            "fake"
        }

        fn base_url(&self) -> &str {
            "https://novels.test/"
        }

        fn search_url(&self, query: &str) -> String {
            match &self.search_url_override {
                Some(url) => url.clone(),
                None => format!("https://novels.test/search?q={query}"),
            }
        }

        async fn search(&self, _query: &str) -> Vec<SearchHit> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            self.hits.clone()
        }

        async fn get_chapter_list(&self, novel_url: &str) -> Vec<ChapterRef> {
            self.listings.lock().unwrap().push(novel_url.to_string());
            self.chapters.clone()
        }

        async fn download_chapter(
            &self,
            chapter_url: &str,
        ) -> Result<ChapterContent, ExtractionError> {
            self.downloads.lock().unwrap().push(chapter_url.to_string());
            if self.broken.contains(chapter_url) {
                return Err(ExtractionError::Network(FetchError::Timeout(
                    chapter_url.to_string(),
                )));
            }
            let n = chapter_url.rsplit('/').next().unwrap_or_default();
            Ok(ChapterContent::new(format!("第{n}章"), format!("body {n}")))
        }
    }

    /// Records draws from a real pacer without sleeping.
    #[derive(Default)]
    struct RecordingPacer {
        inner: RandomPacer,
        delays: Mutex<Vec<Duration>>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    #[async_trait]
    impl Pacer for RecordingPacer {
        async fn pause(&self) {
            let count = {
                let mut delays = self.delays.lock().unwrap();
                delays.push(self.inner.next_delay());
                delays.len()
            };
            if let Some((after, token)) = &self.cancel_after
                && count >= *after
            {
                token.cancel();
            }
        }
    }

    #[derive(Default)]
    struct MemoryWriter {
        written: Mutex<Vec<(String, Manuscript)>>,
        fail: bool,
    }

    impl NovelWriter for MemoryWriter {
        fn write(&self, novel_title: &str, manuscript: &Manuscript) -> Result<PathBuf, WriteError> {
            if self.fail {
                return Err(WriteError::Io {
                    path: format!("{novel_title}.txt"),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.written
                .lock()
                .unwrap()
                .push((novel_title.to_string(), manuscript.clone()));
            Ok(PathBuf::from(format!("{novel_title}.txt")))
        }
    }

    fn crawler<'a>(
        scraper: &'a FakeScraper,
        pacer: &'a RecordingPacer,
        writer: &'a MemoryWriter,
    ) -> Crawler<'a> {
        Crawler::new(scraper, pacer, writer).with_console(Console::plain())
    }

    #[tokio::test]
    async fn test_crawl_happy_path() {
        let scraper = FakeScraper::novel(3);
        let pacer = RecordingPacer::default();
        let writer = MemoryWriter::default();

        let outcome = crawler(&scraper, &pacer, &writer).crawl("斗破").await;

        let report = match outcome {
            CrawlOutcome::Done(report) => report,
            other => panic!("expected Done, got {other:?}"),
        };
        assert_eq!(report.novel_title, "斗破苍穹");
        assert_eq!(report.novel_url, "https://novels.test/book/1");
        assert_eq!(report.chapters_attempted, 3);
        assert_eq!(report.chapters_saved, 3);
        assert!(report.skipped.is_empty());

        assert_eq!(
            *scraper.listings.lock().unwrap(),
            vec!["https://novels.test/book/1"]
        );
        assert_eq!(
            *scraper.downloads.lock().unwrap(),
            vec![
                "https://novels.test/book/c/1",
                "https://novels.test/book/c/2",
                "https://novels.test/book/c/3",
            ]
        );

        let written = writer.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, "斗破苍穹");
        let titles: Vec<&str> = written[0]
            .1
            .chapters()
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, vec!["第1章", "第2章", "第3章"]);
    }

    #[tokio::test]
    async fn test_links_resolve_against_site_base_when_search_url_is_unusable() {
        let scraper = FakeScraper {
            search_url_override: Some("search?q=relative".to_string()),
            ..FakeScraper::novel(1)
        };
        let pacer = RecordingPacer::default();
        let writer = MemoryWriter::default();

        let outcome = crawler(&scraper, &pacer, &writer).crawl("斗破").await;

        let report = match outcome {
            CrawlOutcome::Done(report) => report,
            other => panic!("expected Done, got {other:?}"),
        };
        assert_eq!(report.novel_url, "https://novels.test/book/1");
        assert_eq!(
            *scraper.downloads.lock().unwrap(),
            vec!["https://novels.test/book/c/1"]
        );
    }

    #[tokio::test]
    async fn test_no_search_hits_aborts_before_enumeration() {
        let scraper = FakeScraper {
            hits: Vec::new(),
            ..FakeScraper::novel(3)
        };
        let pacer = RecordingPacer::default();
        let writer = MemoryWriter::default();

        let outcome = crawler(&scraper, &pacer, &writer).crawl("missing").await;

        assert!(matches!(
            outcome,
            CrawlOutcome::Aborted(AbortReason::NovelNotFound)
        ));
        assert_eq!(outcome.state(), CrawlState::Aborted);
        assert_eq!(scraper.searches.load(Ordering::SeqCst), 1);
        assert!(scraper.listings.lock().unwrap().is_empty());
        assert!(scraper.downloads.lock().unwrap().is_empty());
        assert!(writer.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_chapters_aborts() {
        let scraper = FakeScraper::novel(0);
        let pacer = RecordingPacer::default();
        let writer = MemoryWriter::default();

        let outcome = crawler(&scraper, &pacer, &writer).crawl("斗破").await;

        assert!(matches!(
            outcome,
            CrawlOutcome::Aborted(AbortReason::NoChapters)
        ));
        assert!(scraper.downloads.lock().unwrap().is_empty());
        assert!(pacer.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_chapters_are_skipped() {
        let scraper = FakeScraper::novel(5).breaking(&[
            "https://novels.test/book/c/2",
            "https://novels.test/book/c/4",
        ]);
        let pacer = RecordingPacer::default();
        let writer = MemoryWriter::default();

        let outcome = crawler(&scraper, &pacer, &writer).crawl("斗破").await;

        let report = match outcome {
            CrawlOutcome::Done(report) => report,
            other => panic!("expected Done, got {other:?}"),
        };
        assert_eq!(report.chapters_attempted, 5);
        assert_eq!(report.chapters_saved, 3);
        assert_eq!(
            report
                .skipped
                .iter()
                .map(|s| s.chapter.title.as_str())
                .collect::<Vec<_>>(),
            vec!["Chapter 2", "Chapter 4"]
        );
        assert_eq!(scraper.downloads.lock().unwrap().len(), 5);

        let written = writer.written.lock().unwrap();
        let bodies: Vec<&str> = written[0]
            .1
            .chapters()
            .iter()
            .map(|c| c.body.as_str())
            .collect();
        assert_eq!(bodies, vec!["body 1", "body 3", "body 5"]);
    }

    #[tokio::test]
    async fn test_all_chapters_failing_aborts_without_writing() {
        let scraper = FakeScraper::novel(2).breaking(&[
            "https://novels.test/book/c/1",
            "https://novels.test/book/c/2",
        ]);
        let pacer = RecordingPacer::default();
        let writer = MemoryWriter::default();

        let outcome = crawler(&scraper, &pacer, &writer).crawl("斗破").await;

        assert!(matches!(
            outcome,
            CrawlOutcome::Aborted(AbortReason::NoContent)
        ));
        assert!(writer.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pacing_between_chapters_only() {
        let scraper = FakeScraper::novel(5);
        let pacer = RecordingPacer::default();
        let writer = MemoryWriter::default();

        crawler(&scraper, &pacer, &writer).crawl("斗破").await;

        let delays = pacer.delays.lock().unwrap();
        assert_eq!(delays.len(), 4);
        for delay in delays.iter() {
            assert!(*delay >= Duration::from_secs(1));
            assert!(*delay < Duration::from_secs(3));
        }
    }

    #[tokio::test]
    async fn test_single_chapter_has_no_pacing() {
        let scraper = FakeScraper::novel(1);
        let pacer = RecordingPacer::default();
        let writer = MemoryWriter::default();

        crawler(&scraper, &pacer, &writer).crawl("斗破").await;

        assert!(pacer.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_between_chapters() {
        let token = CancellationToken::new();
        let scraper = FakeScraper::novel(5);
        let pacer = RecordingPacer {
            cancel_after: Some((2, token.clone())),
            ..RecordingPacer::default()
        };
        let writer = MemoryWriter::default();

        let outcome = crawler(&scraper, &pacer, &writer)
            .with_cancellation(token)
            .crawl("斗破")
            .await;

        assert!(matches!(
            outcome,
            CrawlOutcome::Aborted(AbortReason::Cancelled)
        ));
        assert_eq!(scraper.downloads.lock().unwrap().len(), 2);
        assert!(writer.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let scraper = FakeScraper::novel(3);
        let pacer = RecordingPacer::default();
        let writer = MemoryWriter::default();

        let outcome = crawler(&scraper, &pacer, &writer)
            .with_cancellation(token)
            .crawl("斗破")
            .await;

        assert!(matches!(
            outcome,
            CrawlOutcome::Aborted(AbortReason::Cancelled)
        ));
        assert!(scraper.downloads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let scraper = FakeScraper::novel(2);
        let pacer = RecordingPacer::default();
        let writer = MemoryWriter {
            fail: true,
            ..MemoryWriter::default()
        };

        let outcome = crawler(&scraper, &pacer, &writer).crawl("斗破").await;

        let (novel_title, error) = match outcome {
            CrawlOutcome::WriteFailed { novel_title, error } => (novel_title, error),
            other => panic!("expected WriteFailed, got {other:?}"),
        };
        assert_eq!(novel_title, "斗破苍穹");
        assert!(error.to_string().contains("disk full"));
    }

    #[test]
    fn test_abort_reason_messages() {
        assert_eq!(AbortReason::NovelNotFound.to_string(), "novel not found");
        assert_eq!(AbortReason::NoChapters.to_string(), "no chapters");
        assert_eq!(AbortReason::NoContent.to_string(), "no content extracted");
    }
}
