//! Configuration module for Sumi-Shelf
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_shelf::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shelf.toml")).unwrap();
//! println!("Crawling {} domains with {} workers", config.domains.len(), config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, UserAgentConfig,
    DEFAULT_PRODUCT_PATTERNS, DEFAULT_STATIC_EXTENSIONS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
