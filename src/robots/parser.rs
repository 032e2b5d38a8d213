//! Robots.txt parser implementation
//!
//! Allow/disallow matching is delegated to the robotstxt crate; crawl delays
//! and sitemap declarations are read directly from the file.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt policy for one site
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Sitemap URLs declared with `Sitemap:` lines, in file order
    sitemaps: Vec<String>,
}

impl RobotsPolicy {
    /// Creates a policy from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            sitemaps: parse_sitemaps(content),
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// This is used when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns true if this policy carries no rules at all
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Sitemap URLs declared in robots.txt
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// `url` may be a full URL or a path. The agent string is reduced to its
    /// product token (`ShelfBot/1.0 (+...)` → `ShelfBot`) before matching
    /// `User-agent` groups.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token(user_agent), url)
    }

    /// Gets the crawl delay (seconds) for a specific user agent
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.is_empty() {
            return None;
        }

        let normalized_agent = product_token(user_agent).to_lowercase();

        let mut current_user_agents: Vec<String> = Vec::new();
        let mut last_was_user_agent = false;
        let mut crawl_delay_for_wildcard: Option<f64> = None;
        let mut crawl_delay_for_agent: Option<f64> = None;

        for line in self.content.lines() {
            let trimmed = strip_comment(line).trim();
            if trimmed.is_empty() {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // Consecutive User-agent lines share one group
                    if !last_was_user_agent {
                        current_user_agents.clear();
                    }
                    current_user_agents.push(value.to_lowercase());
                    last_was_user_agent = true;
                }
                "crawl-delay" => {
                    last_was_user_agent = false;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if current_user_agents
                        .iter()
                        .any(|ua| ua != "*" && !ua.is_empty() && normalized_agent.contains(ua.as_str()))
                    {
                        crawl_delay_for_agent = Some(delay);
                    } else if current_user_agents.iter().any(|ua| ua == "*") {
                        crawl_delay_for_wildcard = Some(delay);
                    }
                }
                _ => {
                    last_was_user_agent = false;
                }
            }
        }

        crawl_delay_for_agent.or(crawl_delay_for_wildcard)
    }
}

/// Reduces a full agent string to the token robots.txt groups are matched against
pub fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .find(|token| !token.is_empty())
        .unwrap_or(user_agent)
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before)
}

fn parse_sitemaps(content: &str) -> Vec<String> {
    let mut sitemaps: Vec<String> = Vec::new();
    for line in content.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("sitemap") {
            continue;
        }
        let value = value.trim();
        if !value.is_empty() && !sitemaps.iter().any(|s| s == value) {
            sitemaps.push(value.to_string());
        }
    }
    sitemaps
}
