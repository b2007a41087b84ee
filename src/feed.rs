//! Feed pagination state and fetch scheduling.
//!
//! [`FeedStore`] owns the accumulated item list, the page counter, the
//! server-reported total, and the loading flag. It lives on the UI thread;
//! page fetches run as spawned tasks that report back over the event
//! channel, and the results are applied here by the main loop. That keeps
//! every mutation on a single logical thread, which is the only
//! serialization the feed needs.
//!
//! Paging policy: a fetch for the next page is issued when an item within
//! [`LOOKAHEAD`] positions of the end of the loaded list becomes visible,
//! provided the server holds more items and no fetch is already in flight.
//! The page counter commits only when a page lands, so a failed fetch
//! leaves the same page eligible for retry on the next trigger.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::api::{NewsApi, NewsItem};
use crate::error::Error;
use crate::events::AppEvent;

/// How close to the end of the loaded list a visible item must be before
/// the next page is requested. Triggering early hides fetch latency behind
/// the user's remaining scrolling.
pub const LOOKAHEAD: usize = 5;

pub struct FeedStore {
    api: Arc<dyn NewsApi>,
    runtime: Handle,
    tx: UnboundedSender<AppEvent>,
    /// Items accumulated across pages, in fetch order. Append-only within
    /// a reload generation; never re-sorted.
    items: Vec<NewsItem>,
    /// Last page fetched successfully; 0 until the first page lands.
    page: u32,
    /// Server-side total across all pages, refreshed from each envelope.
    total: u32,
    /// True while one page fetch is in flight.
    loading: bool,
    /// Reload generation. Completions carry the epoch they were issued
    /// under; applying drops anything from an earlier generation, so a
    /// reload during an in-flight fetch cannot resurrect stale items.
    epoch: u64,
}

impl FeedStore {
    pub fn new(api: Arc<dyn NewsApi>, runtime: Handle, tx: UnboundedSender<AppEvent>) -> Self {
        Self {
            api,
            runtime,
            tx,
            items: Vec::new(),
            page: 0,
            total: 0,
            loading: false,
            epoch: 0,
        }
    }

    // -- accessors -----------------------------------------------------------

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Last successfully fetched page (0 before the first page lands).
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the server holds items beyond what is loaded.
    pub fn has_more(&self) -> bool {
        (self.items.len() as u32) < self.total
    }

    // -- triggers ------------------------------------------------------------

    /// Drop everything and start over from page 1.
    ///
    /// This is an explicit user action, so it is allowed even while a fetch
    /// is in flight; bumping the epoch makes the old completion a no-op.
    pub fn reload(&mut self) {
        self.epoch += 1;
        self.items.clear();
        self.page = 0;
        self.total = 0;
        self.loading = false;
        self.fetch(1);
    }

    /// Called when the item at `index` becomes visible.
    ///
    /// Issues the next page fetch iff the index is within [`LOOKAHEAD`] of
    /// the end of the loaded list, the server holds more items, and no
    /// fetch is in flight. A pure no-op otherwise.
    pub fn notify_visible(&mut self, index: usize) {
        if self.loading || !self.has_more() {
            return;
        }
        if index + LOOKAHEAD < self.items.len() {
            return;
        }
        self.fetch(self.page + 1);
    }

    fn fetch(&mut self, page: u32) {
        self.loading = true;
        debug!(page, "requesting feed page");

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let epoch = self.epoch;
        self.runtime.spawn(async move {
            let event = match api.fetch_page(page).await {
                Ok(p) => AppEvent::PageLoaded {
                    epoch,
                    page,
                    news: p.news,
                    total: p.total_count,
                },
                Err(error) => AppEvent::PageFailed { epoch, page, error },
            };
            // The receiver is gone only when the UI has shut down.
            let _ = tx.send(event);
        });
    }

    // -- event application (UI thread) ---------------------------------------

    /// Apply a successful page fetch. Returns the newly appended items so
    /// the caller can hand them to the thumbnail prefetcher, or `None` if
    /// the completion belonged to an earlier reload generation.
    pub fn apply_page(
        &mut self,
        epoch: u64,
        page: u32,
        news: Vec<NewsItem>,
        total: u32,
    ) -> Option<&[NewsItem]> {
        if epoch != self.epoch {
            debug!(page, "dropping page from a previous reload");
            return None;
        }

        self.loading = false;
        self.page = page;
        self.total = total;

        let start = self.items.len();
        self.items.extend(news);
        info!(
            page,
            loaded = self.items.len(),
            total = self.total,
            "feed page applied"
        );
        Some(&self.items[start..])
    }

    /// Apply a failed page fetch: clear the loading flag, change nothing
    /// else. Returns false if the failure belonged to an earlier reload
    /// generation (in which case even the loading flag is left alone; it
    /// tracks the current generation's fetch).
    pub fn apply_failure(&mut self, epoch: u64, page: u32, error: &Error) -> bool {
        if epoch != self.epoch {
            debug!(page, "dropping failure from a previous reload");
            return false;
        }

        self.loading = false;
        warn!(page, %error, "feed page fetch failed");
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
