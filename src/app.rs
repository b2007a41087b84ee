use std::sync::Arc;

use image::RgbaImage;
use ratatui::widgets::ListState;
use reqwest::Client;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::{NewsApi, NewsItem};
use crate::events::AppEvent;
use crate::feed::FeedStore;
use crate::images::{ImageCache, ImageLoader};
use crate::reader::{self, OpenMode, Reader};

/// Thumbnail slot of the preview pane.
///
/// Selecting an item binds the slot to that item's thumbnail URL. A
/// finished download is applied only while the binding still matches, so a
/// fetch completing after the user has moved on can never paint the wrong
/// picture next to an item.
pub struct ThumbPanel {
    bound_url: Option<String>,
    image: Option<Arc<RgbaImage>>,
}

impl ThumbPanel {
    fn new() -> Self {
        Self {
            bound_url: None,
            image: None,
        }
    }

    pub fn bound_url(&self) -> Option<&str> {
        self.bound_url.as_deref()
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_deref()
    }

    /// Point the slot at `url` (or at nothing). The previous image is
    /// cleared synchronously; whatever the cache already holds for the new
    /// URL is applied in the same step.
    fn bind(&mut self, url: Option<&str>, cache: &ImageCache) {
        self.image = None;
        self.bound_url = url.map(str::to_owned);
        if let Some(url) = url {
            self.image = cache.get(url);
        }
    }

    /// A download finished; take it only if the slot still points there.
    fn on_image_ready(&mut self, url: &str, cache: &ImageCache) {
        if self.bound_url.as_deref() == Some(url) {
            self.image = cache.get(url);
        }
    }
}

pub struct App {
    /// Paginated feed state; all fetch results funnel through [`App::apply`].
    pub feed: FeedStore,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Thumbnail slot shown in the preview pane.
    pub thumb: ThumbPanel,
    /// The article view, when one is open. Covers the list while present.
    pub reader: Option<Reader>,
    /// Where Enter sends the selected article.
    pub open_mode: OpenMode,
    /// Last status message.
    pub status: String,
    /// Whether the user has requested to quit.
    pub quit: bool,
    loader: ImageLoader,
    cache: ImageCache,
    client: Client,
    runtime: Handle,
    tx: UnboundedSender<AppEvent>,
    /// Bottom row index reported by the last draw; used to notify the feed
    /// once per row scrolled into view rather than once per frame.
    last_visible_row: Option<usize>,
}

impl App {
    pub fn new(
        api: Arc<dyn NewsApi>,
        cache: ImageCache,
        client: Client,
        runtime: Handle,
        tx: UnboundedSender<AppEvent>,
    ) -> Self {
        let feed = FeedStore::new(api, runtime.clone(), tx.clone());
        let loader = ImageLoader::new(cache.clone(), client.clone(), runtime.clone(), tx.clone());
        Self {
            feed,
            list_state: ListState::default(),
            thumb: ThumbPanel::new(),
            reader: None,
            open_mode: OpenMode::Embedded,
            status: "Starting…".into(),
            quit: false,
            loader,
            cache,
            client,
            runtime,
            tx,
            last_visible_row: None,
        }
    }

    // -- event application ---------------------------------------------------

    /// Apply one background-task event. Called by the main loop for every
    /// queued event before each draw.
    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::PageLoaded {
                epoch,
                page,
                news,
                total,
            } => {
                let Some(added) = self.feed.apply_page(epoch, page, news, total) else {
                    return;
                };
                self.loader.prefetch(added);
                self.status = format!(
                    "Page {}: {} of {} items",
                    self.feed.page(),
                    self.feed.len(),
                    self.feed.total()
                );
                if self.list_state.selected().is_none() {
                    self.select_first();
                }
            }
            AppEvent::PageFailed { epoch, page, error } => {
                if self.feed.apply_failure(epoch, page, &error) {
                    self.status = format!("Error: {error}");
                }
            }
            AppEvent::ImageReady { url } => self.thumb.on_image_ready(&url, &self.cache),
            AppEvent::ArticleLoaded { id, paragraphs } => {
                if let Some(reader) = &mut self.reader {
                    reader.apply_loaded(id, paragraphs);
                }
            }
            AppEvent::ArticleFailed { id, error } => {
                if let Some(reader) = &mut self.reader {
                    reader.apply_failed(id, &error);
                }
            }
        }
    }

    // -- feed actions --------------------------------------------------------

    /// Drop the loaded feed and fetch page 1 again.
    pub fn reload(&mut self) {
        self.feed.reload();
        self.list_state.select(None);
        self.thumb.bind(None, &self.cache);
        self.last_visible_row = None;
        self.status = "Loading feed…".into();
    }

    /// Called by the renderer with the index of the bottom row on screen.
    /// Forwarded to the feed only when it changes, mirroring a list that
    /// notifies once per row as it scrolls into view. Without this, a
    /// window taller than the first page would never pull the second one.
    pub fn note_visible_bottom(&mut self, index: usize) {
        if self.last_visible_row == Some(index) {
            return;
        }
        self.last_visible_row = Some(index);
        self.feed.notify_visible(index);
    }

    /// The item under the selection cursor, if any.
    pub fn selected_item(&self) -> Option<&NewsItem> {
        self.list_state
            .selected()
            .and_then(|i| self.feed.items().get(i))
    }

    /// Whether the bound thumbnail is still being downloaded.
    pub fn is_thumb_fetching(&self) -> bool {
        self.thumb
            .bound_url()
            .is_some_and(|url| self.loader.is_fetching(url))
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.feed.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.feed.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.after_selection_change();
    }

    pub fn select_previous(&mut self) {
        if self.feed.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.after_selection_change();
    }

    pub fn select_first(&mut self) {
        if !self.feed.is_empty() {
            self.list_state.select(Some(0));
            self.after_selection_change();
        }
    }

    pub fn select_last(&mut self) {
        if !self.feed.is_empty() {
            self.list_state.select(Some(self.feed.len() - 1));
            self.after_selection_change();
        }
    }

    /// Runs after every cursor move: tells the feed what is on screen (that
    /// drives the next-page trigger) and rebinds the thumbnail slot.
    fn after_selection_change(&mut self) {
        let Some(index) = self.list_state.selected() else {
            return;
        };
        self.feed.notify_visible(index);

        let url = self
            .feed
            .items()
            .get(index)
            .and_then(|item| item.thumbnail_url())
            .map(str::to_owned);
        self.thumb.bind(url.as_deref(), &self.cache);
        if let Some(url) = url {
            if self.thumb.image().is_none() {
                self.loader.request(url);
            }
        }
    }

    // -- article actions -----------------------------------------------------

    /// Open the selected article according to the current [`OpenMode`].
    pub fn open_selected(&mut self) {
        let Some(index) = self.list_state.selected() else {
            return;
        };
        let Some(item) = self.feed.items().get(index) else {
            return;
        };

        match self.open_mode {
            OpenMode::Browser => {
                self.status = if reader::open_external(&item.full_url) {
                    format!("Opened in browser: {}", item.title)
                } else {
                    "Could not launch a browser".into()
                };
            }
            OpenMode::Embedded => {
                self.reader = Some(Reader::open_embedded(
                    &self.runtime,
                    self.client.clone(),
                    self.tx.clone(),
                    item.id,
                    item.title.clone(),
                    item.full_url.clone(),
                ));
            }
        }
    }

    pub fn toggle_open_mode(&mut self) {
        self.open_mode = self.open_mode.toggled();
        self.status = format!("Open mode: {}", self.open_mode.label());
    }

    pub fn close_reader(&mut self) {
        self.reader = None;
    }

    pub fn reader_scroll_down(&mut self) {
        if let Some(reader) = &mut self.reader {
            reader.scroll_down();
        }
    }

    pub fn reader_scroll_up(&mut self) {
        if let Some(reader) = &mut self.reader {
            reader.scroll_up();
        }
    }

    pub fn reader_page_down(&mut self) {
        if let Some(reader) = &mut self.reader {
            reader.page_down();
        }
    }

    pub fn reader_page_up(&mut self) {
        if let Some(reader) = &mut self.reader {
            reader.page_up();
        }
    }
}
