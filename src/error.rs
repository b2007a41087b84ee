//! Failure taxonomy shared by the feed, image, and reader paths.
//!
//! Every variant is handled the same way at the application boundary: log,
//! abandon the operation, leave prior state untouched (feed fetches also
//! clear their loading flag), and show at most a status-bar message.
//! Nothing here is fatal to the process and nothing is retried
//! automatically.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The request failed, timed out, or came back with an error status.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not valid JSON for the feed schema.
    #[error("response did not match the feed schema: {0}")]
    Decode(#[from] serde_json::Error),

    /// A stored URL string does not parse.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Thumbnail bytes could not be decoded into an image.
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    /// The article page yielded no readable paragraph text.
    #[error("article page contained no readable text")]
    EmptyArticle,
}

pub type Result<T> = std::result::Result<T, Error>;
