//! Reaction and share breakdown from the desktop permalink page.
//!
//! The desktop page embeds the post's feedback object in
//! `bigPipe.onPageletArrive(...)` calls whose object literals use bare keys.
//! Those payloads are repaired, parsed, and searched for the `feedback`
//! object that belongs to the post.

use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::ScrapeError;
use crate::facebook::FacebookScraper;
use crate::http::HttpClient;
use crate::models::Post;
use crate::patterns::{extract_prefetched_payloads, repair_inline_json};
use crate::walker::ensure_success;

/// Map a mobile permalink onto the desktop site, keeping path and query.
pub fn desktop_url(post_url: &str, desktop_base_url: &Url) -> Result<Url, ScrapeError> {
    let mobile = Url::parse(post_url)?;
    let mut url = desktop_base_url.join(mobile.path())?;
    url.set_query(mobile.query());
    Ok(url)
}

/// Repair and parse every prefetched payload on a desktop page.
///
/// The first payload that is still not JSON after key repair is an error.
pub fn parse_share_and_reactions(html: &str) -> Result<Vec<Value>, ScrapeError> {
    extract_prefetched_payloads(html)
        .iter()
        .map(|raw| serde_json::from_str(&repair_inline_json(raw)).map_err(ScrapeError::InlineJson))
        .collect()
}

/// Depth-first search for the `feedback` object of `post_id`.
///
/// Without a `post_id`, the first feedback object carrying a
/// `subscription_target_id` is accepted.
pub fn find_feedback<'a>(value: &'a Value, post_id: Option<&str>) -> Option<&'a Value> {
    match value {
        Value::Object(map) => {
            if let Some(feedback) = map.get("feedback") {
                if feedback_matches(feedback, post_id) {
                    return Some(feedback);
                }
            }
            map.values().find_map(|v| find_feedback(v, post_id))
        }
        Value::Array(items) => items.iter().find_map(|v| find_feedback(v, post_id)),
        _ => None,
    }
}

fn feedback_matches(feedback: &Value, post_id: Option<&str>) -> bool {
    let target = feedback.get("subscription_target_id");
    match (target, post_id) {
        (Some(Value::String(s)), Some(id)) => s == id,
        (Some(Value::Number(n)), Some(id)) => n.to_string() == id,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Copy counts, reactions and the desktop URL from `feedback` onto a copy of
/// `post`. Counts the feedback lacks keep their listing-page values.
pub fn apply_feedback(post: &Post, feedback: &Value) -> Post {
    let count = |pointer: &str| feedback.pointer(pointer).and_then(Value::as_u64);

    let reactions: BTreeMap<String, u64> = feedback
        .pointer("/top_reactions/edges")
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| {
                    let kind = edge.pointer("/node/reaction_type")?.as_str()?;
                    let n = edge.get("reaction_count")?.as_u64()?;
                    Some((kind.to_lowercase(), n))
                })
                .collect()
        })
        .unwrap_or_default();

    Post {
        likes: count("/reactors/count").or(post.likes),
        comments: count("/comment_count/total_count").or(post.comments),
        shares: count("/share_count/count").or(post.shares),
        reactions: Some(reactions),
        w3_fb_url: feedback
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string),
        fetched_time: Some(Utc::now()),
        ..post.clone()
    }
}

impl<C: HttpClient> FacebookScraper<C> {
    /// Fetch the reaction and share breakdown for `post`.
    ///
    /// Returns the post unchanged when it has no permalink or the page has no
    /// matching feedback object. Transport failures and unparseable payloads
    /// are returned to the caller.
    #[instrument(level = "info", skip_all, fields(post_id = ?post.post_id))]
    pub async fn fetch_share_and_reactions(&self, post: &Post) -> Result<Post, ScrapeError> {
        let Some(post_url) = post.post_url.as_deref() else {
            debug!("Post has no permalink; skipping reaction lookup");
            return Ok(post.clone());
        };

        let url = desktop_url(post_url, &self.config().desktop_base_url)?;
        let response = self.client().get(&url).await?;
        ensure_success(&response)?;

        let payloads = parse_share_and_reactions(&response.text)?;
        debug!(payloads = payloads.len(), "Parsed prefetched payloads");

        match payloads
            .iter()
            .find_map(|payload| find_feedback(payload, post.post_id.as_deref()))
        {
            Some(feedback) => {
                info!(%url, "Fetched reactions");
                Ok(apply_feedback(post, feedback))
            }
            None => {
                debug!(%url, "No feedback object for post");
                Ok(post.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use crate::testing::FakeClient;

    const DESKTOP_PAGE: &str = concat!(
        "<html><body>\n",
        r#"<script>bigPipe.onPageletArrive({allResources:["a"],jsmods:{pre_display_requires:[["RelayPrefetchedStreamCache","next",[],["adp_x",{__bbox:{result:{data:{feedback:{subscription_target_id:"123",url:"https://www.facebook.com/acme/posts/123",reactors:{count:42},comment_count:{total_count:7},share_count:{count:3},top_reactions:{edges:[{reaction_count:40,node:{reaction_type:"LIKE"}},{reaction_count:2,node:{reaction_type:"LOVE"}}]}}}}}}]]]}});</script>"#,
        "\n</body></html>"
    );

    fn scraper(client: FakeClient) -> FacebookScraper<FakeClient> {
        FacebookScraper::with_client(client, ScraperConfig::default())
    }

    fn post() -> Post {
        Post {
            post_id: Some("123".to_string()),
            post_url: Some("https://m.facebook.com/story.php?story_fbid=123&id=9".to_string()),
            likes: Some(40),
            comments: None,
            ..Post::default()
        }
    }

    #[test]
    fn test_desktop_url() {
        let desktop = Url::parse("https://www.facebook.com/").unwrap();
        let url = desktop_url("https://m.facebook.com/story.php?story_fbid=1&id=2", &desktop).unwrap();
        assert_eq!(url.as_str(), "https://www.facebook.com/story.php?story_fbid=1&id=2");
    }

    #[test]
    fn test_parse_and_find_feedback() {
        let payloads = parse_share_and_reactions(DESKTOP_PAGE).unwrap();
        assert_eq!(payloads.len(), 1);
        let feedback = find_feedback(&payloads[0], Some("123")).unwrap();
        assert_eq!(feedback["reactors"]["count"], 42);
        assert!(find_feedback(&payloads[0], Some("999")).is_none());
        assert!(find_feedback(&payloads[0], None).is_some());
    }

    #[test]
    fn test_apply_feedback() {
        let payloads = parse_share_and_reactions(DESKTOP_PAGE).unwrap();
        let feedback = find_feedback(&payloads[0], Some("123")).unwrap();
        let enriched = apply_feedback(&post(), feedback);

        assert_eq!(enriched.likes, Some(42));
        assert_eq!(enriched.comments, Some(7));
        assert_eq!(enriched.shares, Some(3));
        let reactions = enriched.reactions.unwrap();
        assert_eq!(reactions["like"], 40);
        assert_eq!(reactions["love"], 2);
        assert_eq!(enriched.w3_fb_url.as_deref(), Some("https://www.facebook.com/acme/posts/123"));
        assert!(enriched.fetched_time.is_some());
        assert_eq!(enriched.post_id.as_deref(), Some("123"));
    }

    #[test]
    fn test_unparseable_payload_is_error() {
        let html = "<script>bigPipe.onPageletArrive({a:RelayPrefetchedStreamCache});</script>";
        assert!(matches!(
            parse_share_and_reactions(html),
            Err(ScrapeError::InlineJson(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_share_and_reactions() {
        let client = FakeClient::new().with_page(
            "https://www.facebook.com/story.php?story_fbid=123&id=9",
            DESKTOP_PAGE,
        );
        let scraper = scraper(client);

        let enriched = scraper.fetch_share_and_reactions(&post()).await.unwrap();
        assert_eq!(enriched.shares, Some(3));
        assert_eq!(enriched.reactions.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_without_permalink_is_noop() {
        let scraper = scraper(FakeClient::new());
        let bare = Post::default();
        assert_eq!(scraper.fetch_share_and_reactions(&bare).await.unwrap(), bare);
        assert!(scraper.client().requests().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_without_matching_feedback_is_unchanged() {
        let client = FakeClient::new().with_page(
            "https://www.facebook.com/story.php?story_fbid=123&id=9",
            "<html><body>nothing prefetched</body></html>",
        );
        let scraper = scraper(client);
        assert_eq!(scraper.fetch_share_and_reactions(&post()).await.unwrap(), post());
    }

    #[tokio::test]
    async fn test_fetch_surfaces_http_errors() {
        let scraper = scraper(FakeClient::new());
        let result = scraper.fetch_share_and_reactions(&post()).await;
        assert!(matches!(result, Err(ScrapeError::Status { status: 404, .. })));
    }
}
