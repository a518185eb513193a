//! JSON output for scraped posts.
//!
//! Posts are either streamed to stdout as JSON Lines while the crawl runs, or
//! collected and written as one JSON array per target:
//! `{output_dir}/{target}.json`.

use facebook_scraper::Post;
use std::error::Error;
use std::io::Write;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write one post as a single JSON line.
pub fn write_json_line(out: &mut impl Write, post: &Post) -> Result<(), Box<dyn Error>> {
    serde_json::to_writer(&mut *out, post)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Write `posts` to `{output_dir}/{target}.json`, returning the path.
///
/// Path separators in `target` are replaced so the file always lands
/// directly inside `output_dir`.
#[instrument(level = "info", skip_all, fields(%output_dir, %target, count = posts.len()))]
pub async fn write_posts(
    posts: &[Post],
    output_dir: &str,
    target: &str,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(posts)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let file_stem = target.replace(['/', '\\'], "_");
    let path = format!("{}/{}.json", output_dir.trim_end_matches('/'), file_stem);

    info!(%path, "Writing JSON");
    fs::write(&path, json).await?;
    info!(%path, "Wrote posts");

    Ok(path)
}
