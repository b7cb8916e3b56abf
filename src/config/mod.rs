//! Configuration module for flockmap
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use flockmap::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawl will expand up to {} accounts", config.crawl.max_expansions);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AnnotatorConfig, ApiConfig, Config, CrawlConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

// Remote service hard limits
pub use validation::{validate, FOLLOWER_PAGE_LIMIT, LOOKUP_BATCH_LIMIT};
