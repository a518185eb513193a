//! Post extraction from a single `<article>` node.
//!
//! Extraction is pure: it reads the DOM and raw markup of one article and
//! never fetches. Two follow-up targets are reported alongside the post so
//! the walker can decide whether to spend extra requests on them:
//!
//! - `photo_url`: photo page carrying a "View Full Size" link
//! - `more_url`: story page holding the untruncated text

use chrono::{DateTime, Utc};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::models::Post;
use crate::patterns::{
    COMMENTS_RE, FULL_SIZE_IMAGE_RE, IMAGE_LQ_RE, LIKES_RE, LINK_RE, MORE_URL_RE, PHOTO_LINK_RE,
    POST_URL_RE, SHARES_RE, decode_css_background_url, find_count,
};
use crate::utils::filter_query_params;

/// Query parameters that identify a story; everything else is tracking noise.
const PERMALINK_PARAMS: &[&str] = &["story_fbid", "id"];

static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static TEXT_NODES: Lazy<Selector> = Lazy::new(|| Selector::parse("p, header").unwrap());
static FOOTER: Lazy<Selector> = Lazy::new(|| Selector::parse("footer").unwrap());
static HEADER_LINKS: Lazy<Selector> = Lazy::new(|| Selector::parse("header a").unwrap());
static STORY_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.story_body_container").unwrap());
static IMG_CLASS: Lazy<Selector> = Lazy::new(|| Selector::parse(".img").unwrap());

/// `(text, post_text, shared_text)`
pub type TextParts = (Option<String>, Option<String>, Option<String>);

/// A post plus the secondary pages that could improve it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPost {
    pub post: Post,
    pub photo_url: Option<Url>,
    pub more_url: Option<Url>,
}

/// Build a [`Post`] from one article node.
pub fn extract(article: ElementRef<'_>, base_url: &Url) -> Post {
    extract_with_targets(article, base_url).post
}

/// Build a [`Post`] and collect its follow-up targets.
pub fn extract_with_targets(article: ElementRef<'_>, base_url: &Url) -> ExtractedPost {
    let html = article.html();
    let data_ft = parse_data_ft(article);

    let (text, post_text, shared_text) = extract_text(article);

    let footer_html = article.select(&FOOTER).next().map(|f| f.html());
    let footer = footer_html.as_deref();

    let post = Post {
        post_id: data_ft.as_ref().and_then(extract_post_id),
        text,
        post_text,
        shared_text,
        time: data_ft.as_ref().and_then(extract_time),
        image: extract_image_lq(article),
        likes: footer.and_then(|h| find_count(h, &LIKES_RE)),
        comments: footer.and_then(|h| find_count(h, &COMMENTS_RE)),
        shares: footer.and_then(|h| find_count(h, &SHARES_RE)),
        post_url: extract_post_url(article, base_url),
        link: extract_link(&html),
        ..Post::default()
    };

    ExtractedPost {
        post,
        photo_url: capture_url(&PHOTO_LINK_RE, &html, base_url),
        more_url: capture_url(&MORE_URL_RE, &html, base_url),
    }
}

/// Run [`extract_with_targets`] over every article in `document`, in order.
pub fn extract_all(document: &Html, base_url: &Url) -> Vec<ExtractedPost> {
    document
        .select(&ARTICLE)
        .map(|article| extract_with_targets(article, base_url))
        .collect()
}

fn parse_data_ft(article: ElementRef<'_>) -> Option<Value> {
    let Some(raw) = article.value().attr("data-ft") else {
        warn!("Article has no data-ft metadata; post_id and time unavailable");
        return None;
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "Malformed data-ft metadata; post_id and time unavailable");
            None
        }
    }
}

fn extract_post_id(data_ft: &Value) -> Option<String> {
    match data_ft.get("mf_story_key") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => {
            warn!("data-ft metadata has no mf_story_key");
            None
        }
    }
}

/// First `post_context.publish_time` across `page_insights`, in document order.
fn extract_time(data_ft: &Value) -> Option<DateTime<Utc>> {
    let insights = data_ft.get("page_insights")?.as_object()?;
    insights.values().find_map(|page| {
        let publish_time = page.get("post_context")?.get("publish_time")?;
        let secs = publish_time
            .as_i64()
            .or_else(|| publish_time.as_f64().map(|f| f as i64))?;
        DateTime::from_timestamp(secs, 0)
    })
}

/// Split an article's paragraphs into the author's text and shared text.
///
/// A leading `<header>` is the author line and is dropped. After that, every
/// node up to the next `<header>` is the author's own text, and everything
/// from that header onwards belongs to the shared post.
///
/// Paragraphs cut short by the site end in `… More`; the control and its
/// ellipsis are stripped.
pub fn extract_text(container: ElementRef<'_>) -> TextParts {
    let nodes: Vec<ElementRef<'_>> = container.select(&TEXT_NODES).collect();
    let Some(first) = nodes.first() else {
        return (None, None, None);
    };
    let skip = usize::from(first.value().name() == "header");

    let mut post_text = Vec::new();
    let mut shared_text = Vec::new();
    let mut in_shared = false;

    for node in nodes.iter().skip(skip) {
        let is_header = node.value().name() == "header";
        if is_header {
            in_shared = true;
        }
        let raw = node.text().collect::<String>();
        let text = if is_header {
            raw.trim().to_string()
        } else {
            strip_truncation_marker(raw.trim()).to_string()
        };

        if in_shared {
            shared_text.push(text);
        } else {
            post_text.push(text);
        }
    }

    let text = post_text.iter().chain(shared_text.iter()).join("\n");
    (
        Some(text),
        Some(post_text.join("\n")),
        Some(shared_text.join("\n")),
    )
}

fn strip_truncation_marker(text: &str) -> &str {
    if let Some(rest) = text.strip_suffix("More") {
        if let Some(rest) = rest.trim_end().strip_suffix('…') {
            return rest.trim_end();
        }
    }
    text
}

/// Low-quality image from the inline `background-image` style.
///
/// Only `div.story_body_container > div > div` containers are considered,
/// which keeps profile thumbnails out.
fn extract_image_lq(article: ElementRef<'_>) -> Option<String> {
    let story = article.select(&STORY_CONTAINER).next()?;

    story
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "div")
        .flat_map(|el| el.children().filter_map(ElementRef::wrap))
        .filter(|el| el.value().name() == "div")
        .find_map(|container| {
            let image = container.select(&IMG_CLASS).next()?;
            let style = image.value().attr("style").unwrap_or("");
            let caps = IMAGE_LQ_RE.captures(style)?;
            Some(decode_css_background_url(&caps[1]))
        })
}

fn extract_link(html: &str) -> Option<String> {
    let caps = LINK_RE.captures(html)?;
    match urlencoding::decode(&caps[1]) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(e) => {
            debug!(error = %e, "Outbound link is not valid UTF-8 once decoded");
            None
        }
    }
}

fn extract_post_url(article: ElementRef<'_>, base_url: &Url) -> Option<String> {
    article
        .select(&HEADER_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| POST_URL_RE.is_match(href))
        .and_then(|href| base_url.join(href).ok())
        .map(|url| filter_query_params(&url, PERMALINK_PARAMS).to_string())
}

fn capture_url(pattern: &Regex, html: &str, base_url: &Url) -> Option<Url> {
    let caps = pattern.captures(html)?;
    base_url.join(&html_escape::decode_html_entities(&caps[1])).ok()
}

/// The "View Full Size" target on a photo page, resolved against `base_url`.
pub fn parse_full_size_image(body: &str, base_url: &Url) -> Option<String> {
    capture_url(&FULL_SIZE_IMAGE_RE, body, base_url).map(|url| url.to_string())
}

/// Re-run text resolution over the story container of a full post page.
pub fn parse_expanded_text(body: &str) -> Option<TextParts> {
    let document = Html::parse_document(body);
    let container = document.select(&STORY_CONTAINER).next()?;
    Some(extract_text(container))
}
