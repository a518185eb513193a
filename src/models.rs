//! Data models for scraped posts and crawl options.
//!
//! - [`Post`]: One structured record per `<article>` on a timeline page
//! - [`CrawlOptions`]: Caller-controlled bounds for a single crawl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of pages fetched per crawl.
pub const DEFAULT_PAGES: usize = 10;

/// A single post as read from the mobile timeline.
///
/// Every field the page may omit is an `Option`. Engagement counts that the
/// footer does not show stay `None` instead of defaulting to zero, so
/// "unknown" and "zero" remain distinguishable.
///
/// The enrichment fields (`reactions`, `w3_fb_url`, `fetched_time`) are only
/// filled by [`crate::FacebookScraper::fetch_share_and_reactions`] and are
/// omitted from JSON output otherwise.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Post {
    /// Site-assigned story key taken from the article's `data-ft` blob.
    pub post_id: Option<String>,
    /// `post_text` and `shared_text` joined by a newline.
    pub text: Option<String>,
    /// The author's own content.
    pub post_text: Option<String>,
    /// Quoted or shared content shown below a header separator.
    pub shared_text: Option<String>,
    /// Publish time, from `page_insights.*.post_context.publish_time`.
    pub time: Option<DateTime<Utc>>,
    /// Full-size image if resolvable, otherwise the inline low-quality one.
    pub image: Option<String>,
    pub likes: Option<u64>,
    pub comments: Option<u64>,
    pub shares: Option<u64>,
    /// Canonical permalink (`story_fbid` and `id` query parameters only).
    pub post_url: Option<String>,
    /// Outbound link, unwrapped from the redirect service.
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<BTreeMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w3_fb_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_time: Option<DateTime<Utc>>,
}

/// Bounds and switches for one crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum number of listing pages to fetch (secondary fetches excluded).
    pub pages: usize,
    /// Expand truncated text and fetch the reaction/share breakdown per post.
    pub extra_info: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            pages: DEFAULT_PAGES,
            extra_info: false,
        }
    }
}

impl CrawlOptions {
    pub fn with_pages(pages: usize) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }
}
