//! Background thumbnail fetching and decoding.
//!
//! [`ImageLoader`] turns thumbnail URLs into cache entries. Each request
//! spawns one worker task; a semaphore keeps the number of simultaneous
//! downloads bounded, and an in-flight set makes a burst of requests for
//! one URL cost one download. Workers announce success over the event
//! channel with an [`AppEvent::ImageReady`]; failures are logged and
//! otherwise silent, since a list cell without a thumbnail is already the
//! placeholder state.
//!
//! Dropping the loader aborts every outstanding worker, so quitting the
//! app does not wait on image downloads.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use image::RgbaImage;
use reqwest::Client;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::api::NewsItem;
use crate::error::Result;
use crate::events::AppEvent;
use crate::images::ImageCache;

/// Cap on simultaneous thumbnail downloads. Keeps a fast scroll from
/// opening a connection per row.
const MAX_CONCURRENT_FETCHES: usize = 6;

pub struct ImageLoader {
    cache: ImageCache,
    client: Client,
    runtime: Handle,
    tx: UnboundedSender<AppEvent>,
    limit: Arc<Semaphore>,
    /// URLs with a worker currently assigned. Checked before spawning;
    /// a URL is removed once it is in the cache or has failed.
    in_flight: Arc<Mutex<HashSet<String>>>,
    tasks: JoinSet<()>,
}

impl ImageLoader {
    pub fn new(
        cache: ImageCache,
        client: Client,
        runtime: Handle,
        tx: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            cache,
            client,
            runtime,
            tx,
            limit: Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            tasks: JoinSet::new(),
        }
    }

    /// Queue every thumbnail in `items` for fetching. Items without a
    /// thumbnail URL are skipped.
    pub fn prefetch(&mut self, items: &[NewsItem]) {
        for item in items {
            if let Some(url) = item.thumbnail_url() {
                let url = url.to_owned();
                self.request(url);
            }
        }
    }

    /// Fetch and decode `url` into the cache unless it is already there or
    /// already being fetched.
    pub fn request(&mut self, url: String) {
        // Reap finished workers so the set does not accumulate handles.
        while self.tasks.try_join_next().is_some() {}

        if self.cache.contains(&url) {
            return;
        }
        if !self.in_flight.lock().unwrap().insert(url.clone()) {
            return;
        }
        debug!(%url, "fetching thumbnail");

        let cache = self.cache.clone();
        let client = self.client.clone();
        let limit = Arc::clone(&self.limit);
        let in_flight = Arc::clone(&self.in_flight);
        let tx = self.tx.clone();

        self.tasks.spawn_on(
            async move {
                let Ok(_permit) = limit.acquire_owned().await else {
                    // Semaphore closed: the loader is shutting down.
                    in_flight.lock().unwrap().remove(&url);
                    return;
                };

                match fetch_and_decode(&client, &url).await {
                    Ok(image) => {
                        // Insert before clearing in-flight so a concurrent
                        // request always sees the URL in one of the two.
                        cache.insert(url.clone(), image);
                        in_flight.lock().unwrap().remove(&url);
                        let _ = tx.send(AppEvent::ImageReady { url });
                    }
                    Err(error) => {
                        in_flight.lock().unwrap().remove(&url);
                        warn!(%url, %error, "thumbnail fetch failed");
                    }
                }
            },
            &self.runtime,
        );
    }

    /// Whether a worker is currently assigned to `url`. The preview pane
    /// uses this to show a fetching hint instead of a blank placeholder.
    pub fn is_fetching(&self, url: &str) -> bool {
        self.in_flight.lock().unwrap().contains(url)
    }
}

async fn fetch_and_decode(client: &Client, url: &str) -> Result<RgbaImage> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;
    use std::time::Duration;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn make_item(id: i64, thumbnail: Option<&str>) -> NewsItem {
        NewsItem {
            id,
            title: format!("Item {id}"),
            description: None,
            published: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            url: format!("news/{id}"),
            full_url: format!("https://example.com/news/{id}"),
            title_image_url: thumbnail.map(str::to_owned),
            category_type: None,
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, ImageFormat::Png)
            .expect("png encode");
        buf.into_inner()
    }

    fn loader_with_cache(cache: ImageCache) -> (ImageLoader, UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let loader = ImageLoader::new(cache, Client::new(), Handle::current(), tx);
        (loader, rx)
    }

    async fn recv_ready(rx: &mut UnboundedReceiver<AppEvent>) -> String {
        match rx.recv().await.expect("an image event") {
            AppEvent::ImageReady { url } => url,
            _ => panic!("unexpected event kind"),
        }
    }

    /// Wait for the worker assigned to `url` to finish, however it ends.
    async fn settle(loader: &ImageLoader, url: &str) {
        while loader.is_fetching(url) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn fetched_image_lands_in_the_cache_and_announces_itself() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/thumb.png")
            .with_status(200)
            .with_body(png_bytes(6, 4))
            .create_async()
            .await;

        let cache = ImageCache::new();
        let (mut loader, mut rx) = loader_with_cache(cache.clone());
        let url = format!("{}/thumb.png", server.url());

        loader.request(url.clone());
        assert!(loader.is_fetching(&url));

        assert_eq!(recv_ready(&mut rx).await, url);
        let image = cache.get(&url).expect("decoded image in cache");
        assert_eq!(image.dimensions(), (6, 4));
        assert!(!loader.is_fetching(&url));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn duplicate_requests_share_one_download() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/thumb.png")
            .with_status(200)
            .with_body(png_bytes(4, 4))
            .expect(1)
            .create_async()
            .await;

        let cache = ImageCache::new();
        let (mut loader, mut rx) = loader_with_cache(cache.clone());
        let url = format!("{}/thumb.png", server.url());

        // No await between these, so the first worker cannot have finished:
        // the second and third must be folded into it.
        loader.request(url.clone());
        loader.request(url.clone());
        loader.request(url.clone());

        assert_eq!(recv_ready(&mut rx).await, url);
        assert!(rx.try_recv().is_err(), "one announcement per download");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn cached_url_is_not_refetched() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/thumb.png")
            .expect(0)
            .create_async()
            .await;

        let cache = ImageCache::new();
        let url = format!("{}/thumb.png", server.url());
        cache.insert(url.clone(), RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])));

        let (mut loader, mut rx) = loader_with_cache(cache);
        loader.request(url.clone());

        assert!(!loader.is_fetching(&url));
        assert!(rx.try_recv().is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_failure_is_silent() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let cache = ImageCache::new();
        let (mut loader, mut rx) = loader_with_cache(cache.clone());
        let url = format!("{}/missing.png", server.url());

        loader.request(url.clone());
        settle(&loader, &url).await;

        assert!(cache.get(&url).is_none());
        assert!(rx.try_recv().is_err(), "failures emit no event");
    }

    #[tokio::test]
    async fn undecodable_body_is_silent() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken.png")
            .with_status(200)
            .with_body("not an image")
            .create_async()
            .await;

        let cache = ImageCache::new();
        let (mut loader, mut rx) = loader_with_cache(cache.clone());
        let url = format!("{}/broken.png", server.url());

        loader.request(url.clone());
        settle(&loader, &url).await;

        assert!(cache.get(&url).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn prefetch_skips_items_without_a_thumbnail() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/only.png")
            .with_status(200)
            .with_body(png_bytes(4, 4))
            .expect(1)
            .create_async()
            .await;

        let cache = ImageCache::new();
        let (mut loader, mut rx) = loader_with_cache(cache.clone());
        let url = format!("{}/only.png", server.url());

        loader.prefetch(&[make_item(1, Some(&url)), make_item(2, None)]);

        assert_eq!(recv_ready(&mut rx).await, url);
        assert!(cache.contains(&url));
        mock.assert_async().await;
    }
}
