//! The public scraper object.
//!
//! A [`FacebookScraper`] owns one HTTP session (cookies included) and the
//! configuration it was built with. It holds no other state, so one instance
//! can run any number of crawls one after another, and a login performed
//! through it applies to all of them.

use futures::Stream;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::http::{HttpClient, ReqwestClient};
use crate::models::{CrawlOptions, Post};
use crate::walker::Target;

/// Scraper for the mobile site, generic over its HTTP collaborator.
#[derive(Debug, Clone)]
pub struct FacebookScraper<C = ReqwestClient> {
    client: C,
    config: ScraperConfig,
}

impl FacebookScraper<ReqwestClient> {
    /// Build a scraper with a fresh `reqwest` session.
    pub fn new(config: ScraperConfig) -> Result<Self, ScrapeError> {
        let client = ReqwestClient::new(&config)?;
        Ok(Self { client, config })
    }
}

impl<C: HttpClient> FacebookScraper<C> {
    /// Build a scraper around an existing client, e.g. one already logged in.
    pub fn with_client(client: C, config: ScraperConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Posts from a page or user timeline, newest first.
    ///
    /// The stream is lazy: pages are fetched only as posts are pulled, and
    /// dropping it stops the crawl.
    ///
    /// # Arguments
    ///
    /// * `account` - Page or user name as it appears in the profile URL
    /// * `options` - Page budget and whether to spend extra requests per post
    ///
    /// # Returns
    ///
    /// A stream of posts, newest first. The first `Err` is also the last item.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let scraper = FacebookScraper::new(ScraperConfig::default())?;
    /// let posts = scraper.get_posts("nintendo", CrawlOptions::with_pages(2));
    /// futures::pin_mut!(posts);
    /// while let Some(post) = posts.next().await {
    ///     println!("{:?}", post?.post_text);
    /// }
    /// ```
    pub fn get_posts<'a>(
        &'a self,
        account: &str,
        options: CrawlOptions,
    ) -> impl Stream<Item = Result<Post, ScrapeError>> + use<'a, C> {
        self.walk(Target::Account(account.to_string()), options)
    }

    /// Posts from a group feed. Same laziness as [`Self::get_posts`].
    pub fn get_group_posts<'a>(
        &'a self,
        group: &str,
        options: CrawlOptions,
    ) -> impl Stream<Item = Result<Post, ScrapeError>> + use<'a, C> {
        self.walk(Target::Group(group.to_string()), options)
    }
}
