//! Small helpers shared across the crate.
//!
//! - Escape handling for the JavaScript and CSS fragments the site embeds
//! - Query-string filtering for permalinks
//! - Comment stripping for hidden markup
//! - String truncation for logging and output directory validation

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (rounded down to a char
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Decode backslash escapes the way a `unicode_escape` codec does.
///
/// Handles `\\`, `\'`, `\"`, `\n`, `\r`, `\t`, `\xHH`, `\uHHHH` (joining
/// UTF-16 surrogate pairs) and `\UHHHHHHHH`. Any other escape, `\/` in
/// particular, is left in place so callers can normalise it themselves.
pub fn unescape_unicode(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 >= chars.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let next = chars[i + 1];
        match next {
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                match hex_at(&chars, i + 2, width) {
                    Some(code) if next == 'u' && (0xD800..0xDC00).contains(&code) => {
                        // High surrogate: only meaningful with a trailing low half.
                        let low = (chars.get(i + 6) == Some(&'\\') && chars.get(i + 7) == Some(&'u'))
                            .then(|| hex_at(&chars, i + 8, 4))
                            .flatten()
                            .filter(|low| (0xDC00..0xE000).contains(low));
                        match low.and_then(|low| {
                            char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00))
                        }) {
                            Some(ch) => {
                                out.push(ch);
                                i += 12;
                            }
                            None => {
                                out.push(char::REPLACEMENT_CHARACTER);
                                i += 6;
                            }
                        }
                        continue;
                    }
                    Some(code) => {
                        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                        i += 2 + width;
                        continue;
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        i += 2;
    }

    out
}

fn hex_at(chars: &[char], start: usize, width: usize) -> Option<u32> {
    let digits = chars.get(start..start + width)?;
    digits
        .iter()
        .try_fold(0u32, |acc, c| c.to_digit(16).map(|d| acc * 16 + d))
}

/// Keep only whitelisted query parameters on `url`, preserving their order.
///
/// The query is dropped entirely when no parameter survives.
pub fn filter_query_params(url: &Url, whitelist: &[&str]) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| whitelist.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut filtered = url.clone();
    if kept.is_empty() {
        filtered.set_query(None);
    } else {
        filtered.query_pairs_mut().clear().extend_pairs(kept);
    }
    filtered
}

/// Remove HTML comment delimiters while keeping what they wrap.
///
/// The mobile site hides part of each page inside `<!-- ... -->` so that
/// naive parsers skip it.
pub fn strip_html_comments(html: &str) -> String {
    html.replace("<!--", "").replace("-->", "")
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
