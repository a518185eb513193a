//! Page walker: the crawl loop behind `get_posts` and `get_group_posts`.
//!
//! The walk is a small state machine driven from inside a lazy stream:
//!
//! ```text
//! Seed ──► Fetching ──► Extracting ──► Done
//!              ▲             │
//!              └── cursor ◄──┘
//! ```
//!
//! Nothing is fetched until the caller polls, and dropping the stream stops
//! the crawl. A page is either a full HTML document (first timeline page,
//! group feeds) or a JSON envelope whose `replace` action holds the article
//! fragment and whose `script` action holds the next cursor.

use async_stream::try_stream;
use futures::Stream;
use scraper::Html;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::cursor::resolve_cursor;
use crate::error::ScrapeError;
use crate::extractor::{ExtractedPost, extract_all, parse_expanded_text, parse_full_size_image};
use crate::facebook::FacebookScraper;
use crate::http::{HttpClient, PageResponse};
use crate::models::{CrawlOptions, Post};
use crate::utils::{strip_html_comments, truncate_for_log};

/// Prefix the site puts in front of JSON responses to stop script inclusion.
const ANTI_HIJACK_PREFIX: &str = "for (;;);";

/// What a crawl starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A page or user timeline, by username or numeric id.
    Account(String),
    /// A group feed, by group id or slug.
    Group(String),
}

impl Target {
    /// Initial listing URL for this target.
    pub fn seed_url(&self, base_url: &Url) -> Result<Url, ScrapeError> {
        let path = match self {
            Target::Account(account) => format!("/{}/posts", account.trim_matches('/')),
            Target::Group(group) => format!("/groups/{}/", group.trim_matches('/')),
        };
        Ok(base_url.join(&path)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    Html,
    Envelope,
}

/// One fetched page, reduced to its posts and the next cursor.
#[derive(Debug)]
pub struct ParsedPage {
    pub shape: PageShape,
    pub posts: Vec<ExtractedPost>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    payload: Payload,
}

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
struct Action {
    cmd: String,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Split a response body into posts and a cursor.
///
/// HTML pages have their comment delimiters removed before parsing, and the
/// whole (uncommented) page is searched for the cursor. Envelopes are
/// parsed for their `replace` fragment and `script` code; the cursor only
/// comes from the script.
///
/// # Arguments
///
/// * `body` - The raw response text of a listing page
/// * `base_url` - Mobile site root that relative links resolve against
///
/// # Returns
///
/// The detected [`PageShape`], the page's posts in document order, and the
/// next cursor if there is one.
///
/// # Errors
///
/// Returns [`ScrapeError::Envelope`] if a body shaped like an envelope is not
/// valid JSON.
pub fn parse_page(body: &str, base_url: &Url) -> Result<ParsedPage, ScrapeError> {
    let trimmed = body.trim_start();
    let envelope = trimmed
        .strip_prefix(ANTI_HIJACK_PREFIX)
        .or_else(|| trimmed.starts_with('{').then_some(trimmed));

    match envelope {
        Some(json) => parse_envelope(json, base_url),
        None => {
            let html = strip_html_comments(body);
            let document = Html::parse_document(&html);
            Ok(ParsedPage {
                shape: PageShape::Html,
                posts: extract_all(&document, base_url),
                cursor: resolve_cursor(&html),
            })
        }
    }
}

fn parse_envelope(json: &str, base_url: &Url) -> Result<ParsedPage, ScrapeError> {
    let envelope: Envelope = serde_json::from_str(json).map_err(|e| {
        warn!(body = %truncate_for_log(json, 300), "Unreadable pagination envelope");
        ScrapeError::Envelope(e)
    })?;

    let mut fragment = None;
    let mut script = None;
    for action in envelope.payload.actions {
        match action.cmd.as_str() {
            "replace" => fragment = action.html.or(fragment),
            "script" => script = action.code.or(script),
            other => debug!(cmd = other, "Ignoring envelope action"),
        }
    }

    let posts = match fragment {
        Some(fragment) => {
            let document = Html::parse_fragment(&strip_html_comments(&fragment));
            extract_all(&document, base_url)
        }
        None => {
            debug!("Envelope has no replace action");
            Vec::new()
        }
    };

    Ok(ParsedPage {
        shape: PageShape::Envelope,
        posts,
        cursor: script.as_deref().and_then(resolve_cursor),
    })
}

pub(crate) fn ensure_success(response: &PageResponse) -> Result<(), ScrapeError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(ScrapeError::Status {
            url: response.url.clone(),
            status: response.status,
        })
    }
}

enum WalkState {
    Seed,
    Fetching(Url),
    Extracting(ParsedPage),
    Done,
}

impl<C: HttpClient> FacebookScraper<C> {
    /// Lazily crawl `target`, yielding each post as soon as it is complete.
    ///
    /// At most `options.pages` listing pages are fetched. The first error ends
    /// the stream; posts already yielded stay valid.
    pub(crate) fn walk(
        &self,
        target: Target,
        options: CrawlOptions,
    ) -> impl Stream<Item = Result<Post, ScrapeError>> + '_ {
        try_stream! {
            let mut state = WalkState::Seed;
            let mut remaining = options.pages;
            let mut page_no = 0usize;

            loop {
                state = match state {
                    WalkState::Seed => {
                        if remaining == 0 {
                            info!("Page budget is zero; nothing to fetch");
                            WalkState::Done
                        } else {
                            WalkState::Fetching(target.seed_url(&self.config().base_url)?)
                        }
                    }
                    WalkState::Fetching(url) => {
                        page_no += 1;
                        info!(%url, page = page_no, remaining, "Fetching listing page");
                        let response = self.client().get(&url).await?;
                        remaining -= 1;
                        ensure_success(&response)?;

                        let page = parse_page(&response.text, &self.config().base_url)?;
                        info!(
                            page = page_no,
                            shape = ?page.shape,
                            posts = page.posts.len(),
                            has_cursor = page.cursor.is_some(),
                            "Parsed listing page"
                        );
                        WalkState::Extracting(page)
                    }
                    WalkState::Extracting(page) => {
                        for extracted in page.posts {
                            yield self.complete_post(extracted, options).await;
                        }

                        match page.cursor {
                            None => {
                                info!(pages = page_no, "No cursor; listing exhausted");
                                WalkState::Done
                            }
                            Some(_) if remaining == 0 => {
                                info!(pages = page_no, "Page budget exhausted");
                                WalkState::Done
                            }
                            Some(cursor) => {
                                debug!(%cursor, "Following cursor");
                                WalkState::Fetching(self.config().base_url.join(&cursor)?)
                            }
                        }
                    }
                    WalkState::Done => break,
                };
            }
        }
    }

    /// Spend secondary requests on one post. Failures here only cost the
    /// improvement they were after.
    async fn complete_post(&self, extracted: ExtractedPost, options: CrawlOptions) -> Post {
        let ExtractedPost {
            mut post,
            photo_url,
            more_url,
        } = extracted;

        if self.config().full_size_images {
            if let Some(url) = photo_url {
                match self.fetch_full_size_image(&url).await {
                    Ok(Some(image)) => post.image = Some(image),
                    Ok(None) => debug!(%url, "Photo page has no full-size link"),
                    Err(e) => warn!(%url, error = %e, "Full-size image lookup failed; keeping inline image"),
                }
            }
        }

        if options.extra_info {
            if let Some(url) = more_url {
                match self.fetch_expanded_text(&url).await {
                    Ok(Some((text, post_text, shared_text))) => {
                        post.text = text;
                        post.post_text = post_text;
                        post.shared_text = shared_text;
                    }
                    Ok(None) => debug!(%url, "Story page has no story container"),
                    Err(e) => warn!(%url, error = %e, "Could not expand truncated text"),
                }
            }

            match self.fetch_share_and_reactions(&post).await {
                Ok(enriched) => post = enriched,
                Err(e) => warn!(
                    post_id = ?post.post_id,
                    error = %e,
                    "Reaction lookup failed; yielding post without it"
                ),
            }
        }

        post
    }

    async fn fetch_full_size_image(&self, url: &Url) -> Result<Option<String>, ScrapeError> {
        let response = self.client().get(url).await?;
        ensure_success(&response)?;
        Ok(parse_full_size_image(&response.text, &self.config().base_url))
    }

    async fn fetch_expanded_text(
        &self,
        url: &Url,
    ) -> Result<Option<crate::extractor::TextParts>, ScrapeError> {
        let response = self.client().get(url).await?;
        ensure_success(&response)?;
        Ok(parse_expanded_text(&strip_html_comments(&response.text)))
    }
}
