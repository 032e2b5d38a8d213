//! State module for tracking crawl progress
//!
//! This module provides the shared state a crawl mutates while it runs.
//!
//! # Components
//!
//! - `UrlState`: Tracks a URL through the pipeline (enqueued, fetching, classified, discarded)
//! - `DomainState`: Tracks per-domain request timing for throttling
//! - `VisitedSet`: URLs already taken up for fetching
//! - `ProductResults`: The capped set of product page URLs

mod domain_state;
mod page_state;
mod results;
mod visited;

// Re-export main types
pub use domain_state::DomainState;
pub use page_state::{DiscardReason, UrlState};
pub use results::{ProductInsert, ProductResults};
pub use visited::VisitedSet;
