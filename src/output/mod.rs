//! Output module for persisting crawl results
//!
//! This module handles:
//! - Writing the product URLs of each seed domain to a result file
//! - Recording and printing crawl statistics

pub mod stats;
mod text;
mod traits;

pub use stats::{print_statistics, CrawlStatistics};
pub use text::{file_name_for, TextFileSink};
pub use traits::{OutputError, OutputResult, ResultSink};
