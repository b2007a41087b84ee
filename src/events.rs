//! Messages sent from background tasks to the UI thread.
//!
//! All mutation of feed and view state happens on the UI thread: fetch
//! tasks never touch `App` directly, they push an [`AppEvent`] onto an
//! unbounded channel which the main loop drains before every draw. That
//! gives the ordering contract between fetch completion and UI refresh:
//! a completion is always applied before the next frame renders, and state
//! is never mutated from two threads.

use crate::api::NewsItem;
use crate::error::Error;

pub enum AppEvent {
    /// A page fetch succeeded. `epoch` identifies the reload generation
    /// the fetch belonged to; stale generations are dropped on apply.
    PageLoaded {
        epoch: u64,
        page: u32,
        news: Vec<NewsItem>,
        total: u32,
    },

    /// A page fetch failed. The feed state is left as it was, apart from
    /// the loading flag.
    PageFailed {
        epoch: u64,
        page: u32,
        error: Error,
    },

    /// A thumbnail was fetched, decoded, and inserted into the image
    /// cache. The preview pane re-checks its binding before applying.
    ImageReady { url: String },

    /// The embedded reader finished extracting an article body.
    ArticleLoaded { id: i64, paragraphs: Vec<String> },

    /// The embedded reader could not load an article body.
    ArticleFailed { id: i64, error: Error },
}
