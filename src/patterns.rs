//! Literal pattern rules for the mobile site's markup.
//!
//! Every rule the extractor relies on is a named regex here, so a change in
//! one part of the site's format can be patched without touching the others.
//! The functions are pure text transforms; none of them touch the network.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ScrapeError;
use crate::utils::unescape_unicode;

// ── Engagement counts (matched against footer markup) ───────────────────────

pub static LIKES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"like_def[^>]*>([0-9,.]+)").unwrap());

pub static COMMENTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"cmt_def[^>]*>([0-9,.]+)").unwrap());

pub static SHARES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([0-9,.]+)\s+Shares").unwrap());

// ── Links ───────────────────────────────────────────────────────────────────

/// Outbound links go through the `lm.` redirect wrapper.
pub static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="https://lm\.facebook\.com/l\.php\?u=(.+?)&amp;h="#).unwrap()
});

pub static POST_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:https?://[^/]+)?/story\.php\?story_fbid=").unwrap());

/// The "More" control that follows a truncated paragraph.
pub static MORE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"…\s*<a href="([^"]+)""#).unwrap());

// ── Images ──────────────────────────────────────────────────────────────────

pub static PHOTO_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="(/[^"]+/photos/[^"]+?)""#).unwrap());

pub static FULL_SIZE_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<a href="([^"]+?)" target="_blank" class="sec">View Full Size</a>"#).unwrap()
});

pub static IMAGE_LQ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"background-image: url\('(.+)'\)").unwrap());

static CSS_HEX_ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(..) ").unwrap());

// ── Inline JSON payloads ────────────────────────────────────────────────────

static PREFETCHED_PAYLOAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<script>.*bigPipe\.onPageletArrive\((?P<data>\{.*RelayPrefetchedStreamCache.*\})\);.*</script>",
    )
    .unwrap()
});

static BARE_JSON_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<prefix>[{,])(?P<key>\w+):").unwrap());

/// Parse a human-formatted count such as `"1,234 Shares"`.
///
/// Every non-digit character is dropped before parsing. Text with no digits
/// at all is an error rather than zero; callers should only pass text a
/// count pattern actually matched.
pub fn parse_count(raw: &str) -> Result<u64, ScrapeError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<u64>()
        .map_err(|_| ScrapeError::InvalidCount(raw.to_string()))
}

/// Search `html` with a count pattern and parse the first capture.
///
/// Absent matches and digit-less captures both yield `None`.
pub fn find_count(html: &str, pattern: &Regex) -> Option<u64> {
    let raw = pattern.captures(html)?.get(1)?.as_str();
    parse_count(raw).ok()
}

/// Decode a `background-image` URL taken from an inline `style` attribute.
///
/// CSS writes escaped bytes as `\XX ` (two hex digits and a space). Those are
/// rewritten to `\xXX` and then the whole string goes through a unicode
/// unescape.
pub fn decode_css_background_url(raw: &str) -> String {
    let rewritten = CSS_HEX_ESCAPE_RE.replace_all(raw, r"\x${1}");
    unescape_unicode(&rewritten)
}

/// Quote bare-word object keys: `{foo:1,bar:2}` becomes `{"foo":1,"bar":2}`.
///
/// Purely lexical. Keys that are already quoted are left alone, so running
/// it over its own output changes nothing. String values are not skipped:
/// a value containing `,word:` or `{word:` gets quotes inserted too, which
/// breaks it. The prefetched payloads have not been seen to contain such
/// values.
pub fn repair_inline_json(blob: &str) -> String {
    BARE_JSON_KEY_RE
        .replace_all(blob, r#"${prefix}"${key}":"#)
        .into_owned()
}

/// Collect the object text of every `bigPipe.onPageletArrive({...})` call
/// that carries a `RelayPrefetchedStreamCache` payload.
pub fn extract_prefetched_payloads(html: &str) -> Vec<String> {
    PREFETCHED_PAYLOAD_RE
        .captures_iter(html)
        .filter_map(|caps| caps.name("data").map(|m| m.as_str().to_string()))
        .collect()
}
