//! Output writers for scraped posts.
//!
//! # Submodules
//!
//! - [`json`]: JSON Lines for stdout and a JSON array file per target
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── nintendo.json
//! └── 4242.json
//! ```

pub mod json;
