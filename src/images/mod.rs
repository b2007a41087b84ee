//! Thumbnail pipeline: a bounded cache of decoded images plus the
//! background loader that fills it.
//!
//! ## For contributors
//!
//! - Changing how much pixel data is retained: `cache.rs`.
//! - Changing download concurrency or failure handling: `loader.rs`.

mod cache;
mod loader;

pub use cache::ImageCache;
pub use loader::ImageLoader;
