//! Bounded in-memory cache for decoded thumbnails.
//!
//! Keys are image URLs, values are decoded RGBA bitmaps. The cache is
//! weighted by decoded size so a page of small thumbnails and a handful of
//! oversized hero images are charged what they actually cost. Handles are
//! cheap to clone and safe to share across threads; the loader writes from
//! worker tasks while the UI thread reads.

use std::sync::Arc;

use image::RgbaImage;
use moka::sync::Cache;

/// Retained decoded-pixel budget. RGBA8 thumbnails at feed sizes run a few
/// hundred KiB each, so this holds several hundred screens of scrollback.
const MAX_WEIGHT_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct ImageCache {
    inner: Cache<String, Arc<RgbaImage>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::with_capacity(MAX_WEIGHT_BYTES)
    }

    /// Cache bounded to roughly `max_bytes` of decoded RGBA pixel data.
    pub fn with_capacity(max_bytes: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_bytes)
            .weigher(|_url: &String, image: &Arc<RgbaImage>| {
                // Four bytes per pixel, clamped to the weigher's range.
                let (w, h) = image.dimensions();
                (u64::from(w) * u64::from(h) * 4).min(u64::from(u32::MAX)) as u32
            })
            .build();
        Self { inner }
    }

    pub fn get(&self, url: &str) -> Option<Arc<RgbaImage>> {
        self.inner.get(url)
    }

    pub fn insert(&self, url: impl Into<String>, image: RgbaImage) {
        self.inner.insert(url.into(), Arc::new(image));
    }

    pub fn contains(&self, url: &str) -> bool {
        self.inner.contains_key(url)
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use pretty_assertions::assert_eq;

    fn solid(width: u32, height: u32, level: u8) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([level, level, level, 255]))
    }

    #[test]
    fn miss_then_hit() {
        let cache = ImageCache::new();
        assert!(cache.get("https://img.example/a.png").is_none());
        assert!(!cache.contains("https://img.example/a.png"));

        cache.insert("https://img.example/a.png", solid(4, 4, 7));

        let hit = cache.get("https://img.example/a.png").expect("cached image");
        assert_eq!(hit.dimensions(), (4, 4));
        assert_eq!(hit.get_pixel(0, 0).0, [7, 7, 7, 255]);
        assert!(cache.contains("https://img.example/a.png"));
    }

    #[test]
    fn last_write_wins_for_a_repeated_key() {
        let cache = ImageCache::new();
        cache.insert("k", solid(4, 4, 1));
        cache.insert("k", solid(8, 8, 2));

        let hit = cache.get("k").expect("cached image");
        assert_eq!(hit.dimensions(), (8, 8));
    }

    #[test]
    fn concurrent_writers_settle_on_one_entry() {
        let cache = ImageCache::new();

        let writers: Vec<_> = (0..8)
            .map(|level| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    cache.insert("shared", solid(4, 4, level));
                })
            })
            .collect();
        for writer in writers {
            writer.join().expect("writer thread");
        }

        cache.inner.run_pending_tasks();
        assert_eq!(cache.entry_count(), 1);
        assert!(cache.get("shared").is_some());
    }

    #[test]
    fn weight_bound_is_respected() {
        // Room for two 4x4 RGBA images (64 bytes each).
        let cache = ImageCache::with_capacity(128);

        for i in 0..6 {
            cache.insert(format!("img-{i}"), solid(4, 4, i));
        }
        cache.inner.run_pending_tasks();

        assert!(
            cache.inner.weighted_size() <= 128,
            "weighted size {} exceeds the configured bound",
            cache.inner.weighted_size()
        );
        assert!(cache.entry_count() <= 2);
    }
}
