//! Integration tests: full crawls against a mock site through the real
//! `reqwest` client.

use facebook_scraper::{
    CrawlOptions, FacebookScraper, HttpClient, Post, RequestOptions, ScrapeError, ScraperConfig,
};
use futures::{StreamExt, pin_mut};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scraper_for(server: &MockServer) -> FacebookScraper {
    let base = Url::parse(&format!("{}/", server.uri())).expect("mock server uri");
    let config = ScraperConfig {
        full_size_images: false,
        ..ScraperConfig::with_base_url(base)
    };
    FacebookScraper::new(config).expect("Failed to build scraper")
}

async fn collect_posts(
    scraper: &FacebookScraper,
    account: &str,
    options: CrawlOptions,
) -> Vec<Result<Post, ScrapeError>> {
    let stream = scraper.get_posts(account, options);
    pin_mut!(stream);
    let mut out = Vec::new();
    while let Some(item) = stream.next().await {
        out.push(item);
    }
    out
}

fn html(status: u16, body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body.into())
}

const FIRST_PAGE: &str = r#"<html><body>
<div id="recent">
<article data-ft='{"mf_story_key":"1","page_insights":{"9":{"post_context":{"publish_time":1600000000}}}}'>
  <header><a href="/story.php?story_fbid=1&amp;id=9&amp;refid=17">Acme</a></header>
  <p>First post</p>
  <footer><span class="like_def">12</span><span class="cmt_def">3</span></footer>
</article>
</div>
<script>new SeeMore({href:"/page_content_list_view/more/?page_id=9&cursor=abc&num_to_fetch=4",text:"See More"});</script>
</body></html>"#;

/// Second page as the JSON envelope the "see more" endpoint returns.
fn second_page(cursor: Option<&str>) -> String {
    let mut actions = vec![serde_json::json!({
        "cmd": "replace",
        "target": "u_0_0",
        "html": r#"<article data-ft='{"mf_story_key":"2"}'><p>Second post</p><footer><span>1,500 Shares</span></footer></article>"#,
    })];
    if let Some(cursor) = cursor {
        actions.push(serde_json::json!({
            "cmd": "script",
            "code": format!(r#"require("SeeMore").add({{"href":"{}"}});"#, cursor.replace('/', "\\/")),
        }));
    }
    format!(
        "for (;;);{}",
        serde_json::json!({"__ar": 1, "payload": {"actions": actions}})
    )
}

#[tokio::test]
async fn test_crawl_two_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acme/posts"))
        .and(header("cookie", "locale=en_US"))
        .respond_with(html(200, FIRST_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page_content_list_view/more/"))
        .and(query_param("cursor", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(second_page(None)))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let posts: Vec<Post> = collect_posts(&scraper, "acme", CrawlOptions::default())
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .expect("crawl should succeed");

    assert_eq!(posts.len(), 2);

    let first = &posts[0];
    assert_eq!(first.post_id.as_deref(), Some("1"));
    assert_eq!(first.post_text.as_deref(), Some("First post"));
    assert_eq!(first.time.map(|t| t.timestamp()), Some(1_600_000_000));
    assert_eq!(first.likes, Some(12));
    assert_eq!(first.comments, Some(3));
    assert_eq!(first.shares, None);
    let post_url = first.post_url.as_deref().expect("permalink");
    assert!(post_url.ends_with("/story.php?story_fbid=1&id=9"));

    let second = &posts[1];
    assert_eq!(second.post_id.as_deref(), Some("2"));
    assert_eq!(second.shares, Some(1500));
}

#[tokio::test]
async fn test_page_budget_stops_before_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acme/posts"))
        .respond_with(html(200, FIRST_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page_content_list_view/more/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(second_page(None)))
        .expect(0)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let results = collect_posts(&scraper, "acme", CrawlOptions::with_pages(1)).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
}

#[tokio::test]
async fn test_commented_out_articles_are_found() {
    let server = MockServer::start().await;

    let body = r#"<html><body><div class="hidden_elem"><code id="u_0_1"><!--<article data-ft='{"mf_story_key":"77"}'><p>Hidden from naive parsers</p></article>--></code></div></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/acme/posts"))
        .respond_with(html(200, body))
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let results = collect_posts(&scraper, "acme", CrawlOptions::default()).await;
    assert_eq!(results.len(), 1);
    let post = results.into_iter().next().unwrap().unwrap();
    assert_eq!(post.post_id.as_deref(), Some("77"));
    assert_eq!(post.post_text.as_deref(), Some("Hidden from naive parsers"));
}

#[tokio::test]
async fn test_server_error_ends_stream_after_partial_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acme/posts"))
        .respond_with(html(200, FIRST_PAGE))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page_content_list_view/more/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let results = collect_posts(&scraper, "acme", CrawlOptions::default()).await;
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ScrapeError::Status { status: 500, .. })));
}

#[tokio::test]
async fn test_group_crawl() {
    let server = MockServer::start().await;

    let first = r#"<html><body><section><article data-ft='{"mf_story_key":"g1"}'><p>Group hello</p></article></section>
<div id="m_more_item"><a href="/groups/4242?bac=MTYw&amp;multi_permalinks"><span>See More Posts</span></a></div></body></html>"#;
    let second = r#"<html><body><section><article data-ft='{"mf_story_key":"g2"}'><p>Older</p></article></section></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/groups/4242/"))
        .respond_with(html(200, first))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/groups/4242"))
        .and(query_param("bac", "MTYw"))
        .respond_with(html(200, second))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let stream = scraper.get_group_posts("4242", CrawlOptions::default());
    pin_mut!(stream);
    let mut ids = Vec::new();
    while let Some(post) = stream.next().await {
        ids.push(post.expect("group crawl").post_id.unwrap());
    }
    assert_eq!(ids, ["g1", "g2"]);
}

#[tokio::test]
async fn test_extra_info_enriches_posts() {
    let server = MockServer::start().await;

    let seed = r#"<html><body><article data-ft='{"mf_story_key":"1"}'>
<header><a href="/story.php?story_fbid=1&amp;id=9">Acme</a></header><p>Post</p></article></body></html>"#;
    let desktop = concat!(
        "<html><body>\n",
        r#"<script>bigPipe.onPageletArrive({jsmods:{pre_display_requires:[["RelayPrefetchedStreamCache","next",[],["x",{__bbox:{result:{data:{feedback:{subscription_target_id:"1",url:"https://www.facebook.com/acme/posts/1",reactors:{count:9},comment_count:{total_count:4},share_count:{count:2},top_reactions:{edges:[{reaction_count:8,node:{reaction_type:"LIKE"}},{reaction_count:1,node:{reaction_type:"HAHA"}}]}}}}}}]]]}});</script>"#,
        "\n</body></html>"
    );

    Mock::given(method("GET"))
        .and(path("/acme/posts"))
        .respond_with(html(200, seed))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/story.php"))
        .and(query_param("story_fbid", "1"))
        .respond_with(html(200, desktop))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let options = CrawlOptions {
        extra_info: true,
        ..CrawlOptions::default()
    };
    let results = collect_posts(&scraper, "acme", options).await;
    assert_eq!(results.len(), 1);

    let post = results.into_iter().next().unwrap().unwrap();
    assert_eq!(post.likes, Some(9));
    assert_eq!(post.comments, Some(4));
    assert_eq!(post.shares, Some(2));
    let reactions = post.reactions.expect("reactions");
    assert_eq!(reactions.get("haha"), Some(&1));
    assert_eq!(post.w3_fb_url.as_deref(), Some("https://www.facebook.com/acme/posts/1"));
    assert!(post.fetched_time.is_some());
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let server = MockServer::start().await;

    let login_page = r#"<html><body><form method="post" action="/login/device-based/regular/login/" id="login_form">
<input type="hidden" name="lsd" value="tok"><input name="email"><input name="pass" type="password"></form></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(200, login_page))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login/device-based/regular/login/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "c_user=100001; Path=/")
                .set_body_string("<html>home</html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    assert!(scraper.login("me@example.com", "secret").await.expect("login request"));
    let base = Url::parse(&server.uri()).unwrap();
    assert!(scraper.client().has_cookie(&base, "c_user"));
}

#[tokio::test]
async fn test_login_page_error_is_not_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    assert!(!scraper.login("me@example.com", "secret").await.expect("login is best effort"));
}

#[tokio::test]
async fn test_get_with_sends_header_overrides() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acme/posts"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(html(200, "<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let url = Url::parse(&format!("{}/acme/posts", server.uri())).unwrap();
    let options = RequestOptions {
        headers: vec![("X-Requested-With".to_string(), "XMLHttpRequest".to_string())],
        timeout: None,
    };
    let page = scraper.client().get_with(&url, &options).await.unwrap();
    assert_eq!(page.status, 200);
}

#[tokio::test]
async fn test_get_with_skips_invalid_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/acme/posts"))
        .and(header("x-fb-lsd", "AVq1"))
        .respond_with(html(200, "<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let url = Url::parse(&format!("{}/acme/posts", server.uri())).unwrap();
    let options = RequestOptions {
        headers: vec![
            ("not a header".to_string(), "x".to_string()),
            ("x-bad-value".to_string(), "line\nbreak".to_string()),
            ("x-fb-lsd".to_string(), "AVq1".to_string()),
        ],
        timeout: None,
    };
    let page = scraper.client().get_with(&url, &options).await.unwrap();
    assert!(page.is_success());
}

#[tokio::test]
async fn test_get_with_per_call_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(200, "<html></html>").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let scraper = scraper_for(&server);
    let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
    let options = RequestOptions {
        timeout: Some(Duration::from_millis(100)),
        ..RequestOptions::default()
    };
    let result = scraper.client().get_with(&url, &options).await;
    assert!(matches!(result, Err(ScrapeError::Request(_))));
}
