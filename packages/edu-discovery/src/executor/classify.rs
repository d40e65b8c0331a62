//! Failure classification.
//!
//! Providers signal throttling and bot walls in ad-hoc ways: status
//! codes, interstitial HTML, error strings from client libraries. All of
//! that string matching lives here so backends stay dumb and the
//! heuristics can be tested on their own.

use crate::error::{BackendError, FailureKind};

/// Status codes providers use to ask us to back off. DuckDuckGo answers
/// 202 with an empty page when throttling, some CDNs answer 418.
const RATE_LIMIT_STATUSES: [u16; 3] = [429, 418, 202];

const RATE_LIMIT_MARKERS: [&str; 4] = [
    "too many requests",
    "rate limit",
    "ratelimit",
    "slow down",
];

const CHALLENGE_MARKERS: [&str; 7] = [
    "captcha",
    "unusual traffic",
    "/sorry/",
    "are you a robot",
    "verify you are human",
    "bot detection",
    "anomaly-modal",
];

/// Decide whether a failure is worth retrying in place.
pub fn classify_failure(error: &BackendError) -> FailureKind {
    match error {
        BackendError::Challenge { .. } => FailureKind::Blocked,
        BackendError::Status { status, body } => {
            if RATE_LIMIT_STATUSES.contains(status) || mentions_rate_limit(body) {
                FailureKind::RateLimited
            } else if looks_like_challenge(body) {
                FailureKind::Blocked
            } else {
                FailureKind::Other
            }
        }
        BackendError::Http(source) => classify_text(&source.to_string()),
        BackendError::Parse(detail) | BackendError::Worker(detail) => classify_text(detail),
        BackendError::Timeout { .. } => FailureKind::Other,
    }
}

/// True when an HTML body is an anti-bot interstitial instead of results.
pub fn looks_like_challenge(body: &str) -> bool {
    let lower = body.to_lowercase();
    CHALLENGE_MARKERS.iter().any(|m| lower.contains(m))
}

fn mentions_rate_limit(text: &str) -> bool {
    let lower = text.to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m))
}

fn classify_text(text: &str) -> FailureKind {
    if mentions_rate_limit(text) {
        FailureKind::RateLimited
    } else if looks_like_challenge(text) {
        FailureKind::Blocked
    } else {
        FailureKind::Other
    }
}
