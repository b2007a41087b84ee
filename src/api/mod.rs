//! Remote feed abstraction layer.
//!
//! This module defines the [`NewsApi`] trait, the wire types in [`types`],
//! and the concrete HTTP implementation in [`http`].
//!
//! ## For contributors — pointing at a different backend
//!
//! 1. Create a new file in this directory (e.g. `file.rs` for a fixture
//!    backend).
//! 2. Define a struct and implement [`NewsApi`] for it.
//! 3. Add `mod file;` below and re-export your struct in the `pub use`
//!    block.
//! 4. Construct an instance in `main.rs` and hand it to the feed store.
//!
//! The feed store, prefetching, and UI are all backend-agnostic; the test
//! suites drive the store through exactly this seam.

mod http;
mod types;

// Re-export the public API of this module so callers can write
// `use crate::api::{NewsApi, NewsItem, NewsPage, HttpNewsApi};`.
pub use http::HttpNewsApi;
pub use types::{NewsItem, NewsPage};

use async_trait::async_trait;

use crate::error::Result;

/// Number of items the server returns per page. Fixed by the endpoint
/// contract; the near-end trigger and the paging math both assume it.
pub const PAGE_SIZE: u32 = 15;

/// Trait every feed backend must implement.
///
/// Page fetches run inside spawned tasks, so implementations must be
/// `Send + Sync`.
///
/// ## Implementing a new backend
///
/// ```ignore
/// pub struct MyApi { /* config fields */ }
///
/// #[async_trait]
/// impl NewsApi for MyApi {
///     async fn fetch_page(&self, page: u32) -> Result<NewsPage> {
///         // Perform HTTP / IO, then decode into a NewsPage.
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait NewsApi: Send + Sync {
    /// Fetch one page of the feed (1-based, [`PAGE_SIZE`] items per page).
    ///
    /// Errors are never propagated past the feed store; they surface as a
    /// status message and a log line.
    async fn fetch_page(&self, page: u32) -> Result<NewsPage>;
}
