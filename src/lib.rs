//! # facebook_scraper
//!
//! Scrape public posts from Facebook pages and groups through the mobile web
//! interface, without an API key.
//!
//! ## Architecture
//!
//! 1. **Patterns** ([`patterns`]): literal regex rules and text repair
//! 2. **Extraction** ([`extractor`]): one [`Post`] per `<article>` node
//! 3. **Cursors** ([`cursor`]): the "see more" link in its three encodings
//! 4. **Walking** ([`walker`]): fetch, extract, follow the cursor, repeat,
//!    as a lazy [`futures::Stream`]
//!
//! Enrichment ([`enrich`]) and login ([`login`]) are optional extras on top of
//! the same [`FacebookScraper`] session.
//!
//! ## Usage
//!
//! ```ignore
//! use facebook_scraper::{CrawlOptions, FacebookScraper, ScraperConfig};
//! use futures::StreamExt;
//!
//! let scraper = FacebookScraper::new(ScraperConfig::default())?;
//! let posts = scraper.get_posts("nintendo", CrawlOptions::default());
//! futures::pin_mut!(posts);
//! while let Some(post) = posts.next().await {
//!     let post = post?;
//!     println!("{:?} {:?}", post.time, post.post_text);
//! }
//! ```

pub mod config;
pub mod cursor;
pub mod enrich;
pub mod error;
pub mod extractor;
pub mod facebook;
pub mod http;
pub mod login;
pub mod models;
pub mod patterns;
pub mod utils;
pub mod walker;

#[cfg(test)]
mod testing;

pub use config::ScraperConfig;
pub use cursor::resolve_cursor;
pub use error::ScrapeError;
pub use facebook::FacebookScraper;
pub use http::{HttpClient, PageResponse, ReqwestClient, RequestOptions};
pub use models::{CrawlOptions, Post};
pub use patterns::{decode_css_background_url, extract_prefetched_payloads, parse_count, repair_inline_json};
