//! In-memory [`HttpClient`] for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use url::Url;

use crate::error::ScrapeError;
use crate::http::{HttpClient, PageResponse, RequestOptions};

/// Serves canned bodies by exact URL and records every request.
///
/// Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct FakeClient {
    pages: HashMap<String, String>,
    cookies_after_post: HashSet<String>,
    cookies: RefCell<HashSet<String>>,
    requests: RefCell<Vec<String>>,
    posted: RefCell<Vec<(String, Vec<(String, String)>)>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    /// Cookie that appears once any form has been posted.
    pub fn with_cookie_after_post(mut self, name: &str) -> Self {
        self.cookies_after_post.insert(name.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn posted(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.posted.borrow().clone()
    }

    fn respond(&self, url: &Url) -> PageResponse {
        self.requests.borrow_mut().push(url.to_string());
        match self.pages.get(url.as_str()) {
            Some(body) => PageResponse {
                status: 200,
                url: url.to_string(),
                text: body.clone(),
            },
            None => PageResponse {
                status: 404,
                url: url.to_string(),
                text: String::new(),
            },
        }
    }
}

impl HttpClient for FakeClient {
    async fn get_with(
        &self,
        url: &Url,
        _options: &RequestOptions,
    ) -> Result<PageResponse, ScrapeError> {
        Ok(self.respond(url))
    }

    async fn post_form(
        &self,
        url: &Url,
        fields: &[(String, String)],
    ) -> Result<PageResponse, ScrapeError> {
        self.posted
            .borrow_mut()
            .push((url.to_string(), fields.to_vec()));
        self.cookies
            .borrow_mut()
            .extend(self.cookies_after_post.iter().cloned());
        Ok(self.respond(url))
    }

    fn has_cookie(&self, _url: &Url, name: &str) -> bool {
        self.cookies.borrow().contains(name)
    }
}
