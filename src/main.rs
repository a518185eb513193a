//! # facebook_scraper
//!
//! Command-line front end for the scraper library: crawls a page or group
//! timeline and prints each post as a JSON line, or writes the collected
//! posts to `<output-dir>/<target>.json`.
//!
//! ## Usage
//!
//! ```sh
//! facebook_scraper nintendo --pages 3
//! facebook_scraper 4242 --group -o ./out
//! ```
//!
//! Logs go to stderr (`RUST_LOG` controls the level) so stdout stays valid
//! JSON Lines.

use clap::Parser;
use facebook_scraper::config::load_config;
use facebook_scraper::utils::ensure_writable_dir;
use facebook_scraper::{CrawlOptions, FacebookScraper, Post, ScraperConfig};
use futures::StreamExt;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod outputs;

use cli::Cli;
use outputs::json;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("facebook_scraper starting up");

    let args = Cli::parse();
    debug!(account = %args.target, group = args.group, pages = args.pages, "Parsed CLI arguments");

    let mut config = match &args.config {
        Some(path) => load_config(path).await?,
        None => ScraperConfig::default(),
    };
    if args.no_full_size_images {
        config.full_size_images = false;
    }

    // Early check: fail before crawling if the output can't be written
    if let Some(dir) = &args.output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable");
            return Err(e);
        }
    }

    let scraper = FacebookScraper::new(config)?;

    match (&args.email, &args.password) {
        (Some(email), Some(password)) => {
            if let Err(e) = scraper.login(email, password).await {
                warn!(error = %e, "Login failed; continuing anonymously");
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            warn!("Both --email and --password are needed to log in; continuing anonymously");
        }
        (None, None) => {}
    }

    let options = CrawlOptions {
        pages: args.pages,
        extra_info: args.extra_info,
    };
    let mut posts = if args.group {
        scraper.get_group_posts(&args.target, options).boxed_local()
    } else {
        scraper.get_posts(&args.target, options).boxed_local()
    };

    let mut collected: Vec<Post> = Vec::new();
    let mut count = 0usize;
    let mut failure = None;
    let stdout = std::io::stdout();

    while let Some(item) = posts.next().await {
        match item {
            Ok(post) => {
                count += 1;
                if args.output_dir.is_some() {
                    collected.push(post);
                } else {
                    json::write_json_line(&mut stdout.lock(), &post)?;
                }
            }
            Err(e) => {
                error!(error = %e, scraped = count, "Crawl stopped early");
                failure = Some(e);
                break;
            }
        }
    }
    drop(posts);

    // Partial results are still worth keeping
    if let Some(dir) = &args.output_dir {
        if let Err(e) = json::write_posts(&collected, dir, &args.target).await {
            error!(error = %e, "Failed to write JSON output");
            return Err(e);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        posts = count,
        "Execution complete"
    );

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
