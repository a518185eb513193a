//! Command-line interface definitions for the scraper binary.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Credentials can also come from environment variables so they stay out of
//! shell history.

use clap::Parser;
use facebook_scraper::models::DEFAULT_PAGES;

/// Command-line arguments for the scraper.
///
/// # Examples
///
/// ```sh
/// # Two pages of a page timeline, JSON Lines on stdout
/// facebook_scraper nintendo --pages 2
///
/// # A group feed with reaction breakdowns, written to ./out/4242.json
/// facebook_scraper 4242 --group --extra-info -o ./out
///
/// # Logged in (credentials from the environment)
/// FB_EMAIL=me@example.com FB_PASSWORD=... facebook_scraper nintendo
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Page or user name (or group id with --group)
    pub target: String,

    /// Treat the target as a group
    #[arg(short, long)]
    pub group: bool,

    /// Maximum number of listing pages to fetch
    #[arg(short, long, default_value_t = DEFAULT_PAGES)]
    pub pages: usize,

    /// Expand truncated posts and fetch reaction/share breakdowns
    #[arg(long)]
    pub extra_info: bool,

    /// Skip the extra request per photo post for the full-size image
    #[arg(long)]
    pub no_full_size_images: bool,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write `<target>.json` into this directory instead of printing JSON Lines
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Login email
    #[arg(long, env = "FB_EMAIL")]
    pub email: Option<String>,

    /// Login password
    #[arg(long, env = "FB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}
