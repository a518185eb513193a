//! Continuation cursor resolution.
//!
//! The "see more" link that leads to the next page shows up in three
//! encodings, tried in a fixed order:
//!
//! | # | Where | Example | Treatment |
//! |---|-------|---------|-----------|
//! | 1 | first timeline page, inline JS | `href:"/page_content_list_view/more/?..."` | verbatim |
//! | 2 | AJAX `script` action | `href":"\/page_content_list_view\/more\/?..."` | unescape, `\/` → `/` |
//! | 3 | group feed | `href="/groups/123?bac=...&amp;multi_permalinks"` | unescape, `\/` → `/`, HTML entities decoded |

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::utils::unescape_unicode;

static CURSOR_INLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href:"(/page_content[^"]+)""#).unwrap());

static CURSOR_ESCAPED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href":"(\\/page_content[^"]+)""#).unwrap());

static CURSOR_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="(/groups/[^"]*bac=[^"]+)""#).unwrap());

/// Find the relative URL of the next page in `blob`, if any.
///
/// # Arguments
///
/// * `blob` - A whole HTML page, or the `script` code of an envelope
///
/// # Returns
///
/// The cursor as a site-relative URL with escapes removed, ready to join
/// onto the base URL. `None` means the listing is exhausted.
pub fn resolve_cursor(blob: &str) -> Option<String> {
    if let Some(caps) = CURSOR_INLINE_RE.captures(blob) {
        debug!("Cursor found in inline link");
        return Some(caps[1].to_string());
    }

    if let Some(caps) = CURSOR_ESCAPED_RE.captures(blob) {
        debug!("Cursor found in escaped script link");
        return Some(unescape_js_path(&caps[1]));
    }

    if let Some(caps) = CURSOR_GROUP_RE.captures(blob) {
        debug!("Cursor found in group feed link");
        let path = unescape_js_path(&caps[1]);
        return Some(html_escape::decode_html_entities(&path).into_owned());
    }

    None
}

fn unescape_js_path(raw: &str) -> String {
    unescape_unicode(raw).replace("\\/", "/")
}
