//! Article detail: the in-app reading view and the external-browser
//! hand-off.
//!
//! Opening an article in embedded mode fetches its page, strips it down to
//! paragraph text, and shows the result in a scrollable overlay. The fetch
//! runs as a spawned task reporting back over the event channel; results
//! carry the article id so a reply for an article the user has already
//! navigated away from is dropped instead of overwriting the current view.
//!
//! ## For contributors
//!
//! * Text extraction is a pure function ([`extract_paragraphs`]) so it can
//!   be tested against HTML fixtures without any networking.
//! * The overlay itself is drawn in [`crate::ui`]; this module only owns
//!   the state machine.

use reqwest::Client;
use scraper::{Html, Selector};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::events::AppEvent;

/// Lines jumped by a page scroll in the reading view.
const PAGE_JUMP: i16 = 10;

/// Where opening the selected article sends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Fetch the article and show its text inside the app.
    Embedded,
    /// Hand the URL to the system browser.
    Browser,
}

impl OpenMode {
    pub fn toggled(self) -> Self {
        match self {
            OpenMode::Embedded => OpenMode::Browser,
            OpenMode::Browser => OpenMode::Embedded,
        }
    }

    /// Short name for the status bar.
    pub fn label(self) -> &'static str {
        match self {
            OpenMode::Embedded => "embedded",
            OpenMode::Browser => "browser",
        }
    }
}

pub enum ReaderState {
    /// The article body is still being fetched.
    Loading,
    Ready { paragraphs: Vec<String>, scroll: u16 },
    Failed { message: String },
}

/// An open article view.
pub struct Reader {
    /// Id of the article this view belongs to; completions for any other
    /// id are ignored.
    pub item_id: i64,
    pub title: String,
    pub url: String,
    pub state: ReaderState,
}

impl Reader {
    /// Open `url` in the embedded view and start fetching its body. The
    /// result arrives on the event channel as [`AppEvent::ArticleLoaded`]
    /// or [`AppEvent::ArticleFailed`].
    pub fn open_embedded(
        runtime: &Handle,
        client: Client,
        tx: UnboundedSender<AppEvent>,
        id: i64,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        let url = url.into();
        debug!(id, %url, "fetching article body");

        let fetch_url = url.clone();
        runtime.spawn(async move {
            let event = match fetch_article(&client, &fetch_url).await {
                Ok(paragraphs) => AppEvent::ArticleLoaded { id, paragraphs },
                Err(error) => AppEvent::ArticleFailed { id, error },
            };
            let _ = tx.send(event);
        });

        Self {
            item_id: id,
            title: title.into(),
            url,
            state: ReaderState::Loading,
        }
    }

    /// Apply a completed body fetch, unless it belongs to a different
    /// article than the one on screen.
    pub fn apply_loaded(&mut self, id: i64, paragraphs: Vec<String>) {
        if id != self.item_id {
            debug!(id, current = self.item_id, "dropping body for a closed article");
            return;
        }
        self.state = ReaderState::Ready {
            paragraphs,
            scroll: 0,
        };
    }

    /// Apply a failed body fetch, with the same id guard.
    pub fn apply_failed(&mut self, id: i64, error: &Error) {
        if id != self.item_id {
            return;
        }
        self.state = ReaderState::Failed {
            message: error.to_string(),
        };
    }

    // -- scrolling -----------------------------------------------------------

    pub fn scroll_down(&mut self) {
        self.scroll_by(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_by(-1);
    }

    pub fn page_down(&mut self) {
        self.scroll_by(PAGE_JUMP);
    }

    pub fn page_up(&mut self) {
        self.scroll_by(-PAGE_JUMP);
    }

    fn scroll_by(&mut self, delta: i16) {
        if let ReaderState::Ready { scroll, .. } = &mut self.state {
            *scroll = scroll.saturating_add_signed(delta);
        }
    }
}

/// Launch the system browser on `url`. Returns false (after logging) when
/// the launch fails, so the caller can put a note in the status bar.
pub fn open_external(url: &str) -> bool {
    match webbrowser::open(url) {
        Ok(()) => true,
        Err(error) => {
            warn!(%url, %error, "browser launch failed");
            false
        }
    }
}

async fn fetch_article(client: &Client, url: &str) -> Result<Vec<String>> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    // Parsing happens after the last await: scraper's DOM is not Send, so
    // it must never be held across one.
    let paragraphs = extract_paragraphs(&body);
    if paragraphs.is_empty() {
        return Err(Error::EmptyArticle);
    }
    Ok(paragraphs)
}

/// Pull readable text out of an article page.
///
/// Prefers paragraphs inside an `<article>` element, which on news sites
/// fences off the story from navigation and boilerplate; falls back to
/// every paragraph on the page when there is none. Whitespace is collapsed
/// and empty paragraphs dropped.
pub fn extract_paragraphs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    // Static selectors, known valid.
    let scoped = Selector::parse("article p").unwrap();
    let any = Selector::parse("p").unwrap();

    let collect = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .map(|paragraph| {
                let text: String = paragraph.text().collect();
                text.split_whitespace().collect::<Vec<_>>().join(" ")
            })
            .filter(|text| !text.is_empty())
            .collect()
    };

    let paragraphs = collect(&scoped);
    if paragraphs.is_empty() {
        collect(&any)
    } else {
        paragraphs
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    // -- extraction ----------------------------------------------------------

    #[test]
    fn extraction_prefers_paragraphs_inside_article() {
        let html = r#"
            <html><body>
                <p>cookie banner</p>
                <article><p>First.</p><p>Second.</p></article>
                <footer><p>contact us</p></footer>
            </body></html>
        "#;
        assert_eq!(extract_paragraphs(html), vec!["First.", "Second."]);
    }

    #[test]
    fn extraction_falls_back_to_all_paragraphs() {
        let html = "<html><body><div><p>One.</p></div><p>Two.</p></body></html>";
        assert_eq!(extract_paragraphs(html), vec!["One.", "Two."]);
    }

    #[test]
    fn extraction_collapses_whitespace_and_drops_empty_paragraphs() {
        let html = "<article><p>  spaced \n\t out  </p><p>   </p></article>";
        assert_eq!(extract_paragraphs(html), vec!["spaced out"]);
    }

    #[test]
    fn extraction_keeps_text_of_inline_markup() {
        let html = "<article><p>Hello <b>wor</b>ld, <a href=\"#\">link</a>.</p></article>";
        assert_eq!(extract_paragraphs(html), vec!["Hello world, link."]);
    }

    #[test]
    fn extraction_of_paragraphless_page_is_empty() {
        assert!(extract_paragraphs("<html><body><h1>Title</h1></body></html>").is_empty());
    }

    // -- reader state machine ------------------------------------------------

    fn ready_reader(paragraphs: Vec<&str>) -> Reader {
        Reader {
            item_id: 1,
            title: "Title".into(),
            url: "https://example.com/a".into(),
            state: ReaderState::Ready {
                paragraphs: paragraphs.into_iter().map(str::to_owned).collect(),
                scroll: 0,
            },
        }
    }

    fn loading_reader(id: i64) -> Reader {
        Reader {
            item_id: id,
            title: "Title".into(),
            url: "https://example.com/a".into(),
            state: ReaderState::Loading,
        }
    }

    #[test]
    fn loaded_body_for_another_article_is_ignored() {
        let mut reader = loading_reader(1);
        reader.apply_loaded(2, vec!["stale".into()]);
        assert!(matches!(reader.state, ReaderState::Loading));

        reader.apply_loaded(1, vec!["fresh".into()]);
        match &reader.state {
            ReaderState::Ready { paragraphs, scroll } => {
                assert_eq!(paragraphs, &["fresh"]);
                assert_eq!(*scroll, 0);
            }
            _ => panic!("expected the ready state"),
        }
    }

    #[test]
    fn failure_for_another_article_is_ignored() {
        let mut reader = loading_reader(1);
        reader.apply_failed(9, &Error::EmptyArticle);
        assert!(matches!(reader.state, ReaderState::Loading));

        reader.apply_failed(1, &Error::EmptyArticle);
        match &reader.state {
            ReaderState::Failed { message } => {
                assert_eq!(message, "article page contained no readable text");
            }
            _ => panic!("expected the failed state"),
        }
    }

    #[test]
    fn scrolling_only_moves_a_ready_view() {
        let mut reader = loading_reader(1);
        reader.scroll_down();
        assert!(matches!(reader.state, ReaderState::Loading));

        let mut reader = ready_reader(vec!["a", "b"]);
        reader.scroll_down();
        reader.page_down();
        match reader.state {
            ReaderState::Ready { scroll, .. } => assert_eq!(scroll, 11),
            _ => panic!("expected the ready state"),
        }
    }

    #[test]
    fn scrolling_up_stops_at_the_top() {
        let mut reader = ready_reader(vec!["a"]);
        reader.scroll_up();
        reader.page_up();
        match reader.state {
            ReaderState::Ready { scroll, .. } => assert_eq!(scroll, 0),
            _ => panic!("expected the ready state"),
        }
    }

    #[test]
    fn open_mode_toggles_between_the_two_targets() {
        assert_eq!(OpenMode::Embedded.toggled(), OpenMode::Browser);
        assert_eq!(OpenMode::Browser.toggled(), OpenMode::Embedded);
        assert_eq!(OpenMode::Embedded.label(), "embedded");
        assert_eq!(OpenMode::Browser.label(), "browser");
    }

    // -- body fetching -------------------------------------------------------

    #[tokio::test]
    async fn fetched_article_arrives_as_paragraphs() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/story")
            .with_status(200)
            .with_body("<article><p>Lead.</p><p>Rest.</p></article>")
            .create_async()
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader = Reader::open_embedded(
            &Handle::current(),
            Client::new(),
            tx,
            7,
            "Story",
            format!("{}/story", server.url()),
        );
        assert!(matches!(reader.state, ReaderState::Loading));

        match rx.recv().await.expect("an article event") {
            AppEvent::ArticleLoaded { id, paragraphs } => {
                assert_eq!(id, 7);
                assert_eq!(paragraphs, vec!["Lead.", "Rest."]);
            }
            _ => panic!("unexpected event kind"),
        }
    }

    #[tokio::test]
    async fn textless_article_fails_with_a_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/empty")
            .with_status(200)
            .with_body("<html><body><h1>Only a headline</h1></body></html>")
            .create_async()
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _reader = Reader::open_embedded(
            &Handle::current(),
            Client::new(),
            tx,
            7,
            "Story",
            format!("{}/empty", server.url()),
        );

        match rx.recv().await.expect("an article event") {
            AppEvent::ArticleFailed { id, error } => {
                assert_eq!(id, 7);
                assert!(matches!(error, Error::EmptyArticle));
            }
            _ => panic!("unexpected event kind"),
        }
    }

    #[tokio::test]
    async fn http_error_fails_the_fetch() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone")
            .with_status(500)
            .create_async()
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _reader = Reader::open_embedded(
            &Handle::current(),
            Client::new(),
            tx,
            7,
            "Story",
            format!("{}/gone", server.url()),
        );

        match rx.recv().await.expect("an article event") {
            AppEvent::ArticleFailed { id, error } => {
                assert_eq!(id, 7);
                assert!(matches!(error, Error::Http(_)));
            }
            _ => panic!("unexpected event kind"),
        }
    }
}
