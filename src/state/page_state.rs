/// URL state definitions for tracking crawl progress
///
/// Every URL taken off the frontier moves through these states exactly once.
use std::fmt;

/// Represents the current state of a URL in the per-URL pipeline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UrlState {
    // ===== Active States =====
    /// URL is waiting in the frontier
    Enqueued,

    /// URL passed every gate and is being fetched
    Fetching,

    // ===== Terminal States =====
    /// Page was fetched and handed to the classifier and link extractor
    Classified,

    /// URL left the pipeline early
    Discarded(DiscardReason),
}

/// Why a URL left the pipeline without being classified
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiscardReason {
    /// The product cap was reached before work on the URL started
    CapReached,

    /// Path ends in a static-resource extension
    StaticResource,

    /// Registered domain is outside the crawl scope
    OffDomain,

    /// robots.txt disallows the URL for our agent
    RobotsDenied,

    /// URL was already processed
    AlreadyVisited,

    /// URL could not be parsed or normalized
    InvalidUrl,

    /// Server answered with a status other than 200
    HttpStatus(u16),

    /// Body was neither HTML nor XML
    UnsupportedContent(String),

    /// Transport failure or timeout
    FetchFailed,

    /// XML body could not be read as a sitemap
    MalformedSitemap,
}

impl UrlState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if the URL may still be processed
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Enqueued | Self::Fetching)
    }

    /// Returns the discard reason for a discarded URL
    pub fn discard_reason(&self) -> Option<&DiscardReason> {
        match self {
            Self::Discarded(reason) => Some(reason),
            _ => None,
        }
    }
}

impl DiscardReason {
    /// Short stable label used in logs and statistics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CapReached => "cap_reached",
            Self::StaticResource => "static_resource",
            Self::OffDomain => "off_domain",
            Self::RobotsDenied => "robots_denied",
            Self::AlreadyVisited => "already_visited",
            Self::InvalidUrl => "invalid_url",
            Self::HttpStatus(_) => "http_status",
            Self::UnsupportedContent(_) => "unsupported_content",
            Self::FetchFailed => "fetch_failed",
            Self::MalformedSitemap => "malformed_sitemap",
        }
    }

    /// True for discards decided before any network access for the URL
    pub fn is_pre_fetch(&self) -> bool {
        matches!(
            self,
            Self::CapReached
                | Self::StaticResource
                | Self::OffDomain
                | Self::RobotsDenied
                | Self::AlreadyVisited
                | Self::InvalidUrl
        )
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enqueued => write!(f, "enqueued"),
            Self::Fetching => write!(f, "fetching"),
            Self::Classified => write!(f, "classified"),
            Self::Discarded(reason) => write!(f, "discarded ({})", reason),
        }
    }
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(status) => write!(f, "http_status {}", status),
            Self::UnsupportedContent(content_type) => {
                write!(f, "unsupported_content {}", content_type)
            }
            other => write!(f, "{}", other.as_str()),
        }
    }
}
