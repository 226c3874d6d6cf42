//! Rate-limit metadata.
//!
//! The API reports quotas through three headers holding comma separated
//! lists, one entry per quota window (shortest window first):
//!
//! ```text
//! X-RateLimit-Limit: 2300, 4500, 8800, 105600
//! X-RateLimit-Remaining: 2299, 4499, 8799, 105599
//! X-RateLimit-Reset: 1700000900, 1700001800, 1700003600, 1700086400
//! ```

use chrono::{DateTime, Utc};
use tracing::debug;

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Quota state of one rate-limit window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitWindow {
    /// Maximum number of calls in the window, when advertised.
    pub limit: Option<u64>,
    /// Calls left in the window.
    pub remaining: u64,
    /// When the window resets, when advertised.
    pub reset: Option<DateTime<Utc>>,
}

/// Rate-limit metadata attached to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    windows: Vec<RateLimitWindow>,
}

impl RateLimitInfo {
    /// Creates metadata from explicit windows.
    #[must_use]
    pub fn new(windows: Vec<RateLimitWindow>) -> Self {
        Self { windows }
    }

    /// Extracts rate-limit metadata from response headers.
    ///
    /// Header names are matched case-insensitively. Returns `None` when the
    /// remaining-quota header is absent or cannot be parsed.
    #[must_use]
    pub fn from_headers(headers: &[(String, String)]) -> Option<Self> {
        let find = |name: &str| {
            headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
        };

        let Some(remaining) = find(REMAINING_HEADER).and_then(parse_list) else {
            debug!("no usable rate-limit headers");
            return None;
        };
        let limits = find(LIMIT_HEADER).and_then(parse_list).unwrap_or_default();
        let resets = find(RESET_HEADER).and_then(parse_list).unwrap_or_default();

        let windows = remaining
            .into_iter()
            .enumerate()
            .map(|(i, remaining)| RateLimitWindow {
                limit: limits.get(i).copied(),
                remaining,
                reset: resets
                    .get(i)
                    .and_then(|secs| i64::try_from(*secs).ok())
                    .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            })
            .collect();

        Some(Self { windows })
    }

    /// All advertised windows, shortest first.
    #[must_use]
    pub fn windows(&self) -> &[RateLimitWindow] {
        &self.windows
    }

    /// The window with the fewest calls left.
    #[must_use]
    pub fn most_restrictive(&self) -> Option<&RateLimitWindow> {
        self.windows.iter().min_by_key(|w| w.remaining)
    }

    /// Returns true when any window has no call left.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.windows.iter().any(|w| w.remaining == 0)
    }
}

fn parse_list(value: &str) -> Option<Vec<u64>> {
    let parsed: Option<Vec<u64>> = value.split(',').map(|v| v.trim().parse().ok()).collect();
    parsed.filter(|values| !values.is_empty())
}
