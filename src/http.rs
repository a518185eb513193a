//! HTTP collaborator used by the walker, the enrichment call and login.
//!
//! The scraper only needs three things from a client: GET a URL (optionally
//! with extra headers), POST a form, and tell whether a cookie is set. The
//! [`HttpClient`] trait captures that, and [`ReqwestClient`] implements it on
//! top of `reqwest` with a shared cookie jar so a login carries over to later
//! requests.
//!
//! No retries: a transport failure ends the crawl that triggered it.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;

/// A fetched response. DOM parsing is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    pub text: String,
}

impl PageResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Per-call overrides on top of the client's defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

/// Minimal client contract the scraper is written against.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// GET `url` with per-call overrides.
    async fn get_with(
        &self,
        url: &Url,
        options: &RequestOptions,
    ) -> Result<PageResponse, ScrapeError>;

    /// POST `fields` as `application/x-www-form-urlencoded`.
    async fn post_form(
        &self,
        url: &Url,
        fields: &[(String, String)],
    ) -> Result<PageResponse, ScrapeError>;

    /// Whether the session holds a cookie called `name` for `url`.
    fn has_cookie(&self, url: &Url, name: &str) -> bool;

    /// GET `url` with the client defaults.
    async fn get(&self, url: &Url) -> Result<PageResponse, ScrapeError> {
        self.get_with(url, &RequestOptions::default()).await
    }
}

/// [`HttpClient`] backed by `reqwest` with a persistent cookie jar.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    http: reqwest::Client,
    jar: Arc<Jar>,
}

impl ReqwestClient {
    /// Build a client with the configured user agent, language and locale
    /// cookie.
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let jar = Arc::new(Jar::default());
        for base in [&config.base_url, &config.desktop_base_url] {
            jar.add_cookie_str(&format!("locale={}", config.locale), base);
        }

        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&config.accept_language) {
            Ok(value) => {
                headers.insert(ACCEPT_LANGUAGE, value);
            }
            Err(e) => warn!(error = %e, "Ignoring invalid accept_language"),
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, jar })
    }

    async fn into_page(response: reqwest::Response) -> Result<PageResponse, ScrapeError> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let text = response.text().await?;
        Ok(PageResponse { status, url, text })
    }
}

impl HttpClient for ReqwestClient {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get_with(
        &self,
        url: &Url,
        options: &RequestOptions,
    ) -> Result<PageResponse, ScrapeError> {
        let t0 = Instant::now();
        let mut request = self.http.get(url.clone());
        for (name, value) in &options.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => request = request.header(name, value),
                _ => warn!(header = %name, "Skipping invalid header override"),
            }
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let page = Self::into_page(request.send().await?).await?;
        debug!(
            status = page.status,
            bytes = page.text.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(page)
    }

    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn post_form(
        &self,
        url: &Url,
        fields: &[(String, String)],
    ) -> Result<PageResponse, ScrapeError> {
        let response = self.http.post(url.clone()).form(fields).send().await?;
        let page = Self::into_page(response).await?;
        debug!(status = page.status, "Posted form");
        Ok(page)
    }

    fn has_cookie(&self, url: &Url, name: &str) -> bool {
        let Some(header) = self.jar.cookies(url) else {
            return false;
        };
        let Ok(header) = header.to_str() else {
            return false;
        };
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(key, _)| key == name)
    }
}
