//! `urlfetch` is a small configurable HTTP fetch client: one call downloads a
//! URL's response body as text.
//!
//! The resilience knobs live on [`FetchConfig`]:
//! - randomized pre-request delay
//! - bounded sequential retries
//! - per-attempt timeout
//! - TLS verification toggle
//! - HTTP Basic authentication
//! - custom headers and POST form payloads

mod client;
mod config;
mod downloader;
mod error;

pub use client::HttpDownloader;
pub use config::{BasicAuth, FetchConfig};
pub use downloader::{Downloader, DownloaderHandle};
pub use error::NetworkError;

pub type Result<T> = std::result::Result<T, NetworkError>;
