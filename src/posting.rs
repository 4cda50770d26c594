//! Normalized posting records and the dedup identity derived from them.
//!
//! A `NormalizedPosting` is what the fetch layer hands to the engine: free
//! text plus a canonical link. The `PostingIdentity` is the key the state
//! store dedups on — normalized `(company, url)` so re-fetch timing and
//! minor text drift never split one real-world listing into two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    /// Stable id assigned by the source, or derived from the URL if absent.
    pub source_id: String,
    pub title: String,
    pub company: String,
    /// Free-text location; `None` when the source does not expose one.
    pub location: Option<String>,
    pub url: String,
    /// Publication time when the source exposes it.
    pub posted_at: Option<DateTime<Utc>>,
    /// Body text used for keyword matching.
    pub raw_text: String,
}

impl NormalizedPosting {
    /// Dedup key for this posting, if one can be derived.
    pub fn identity(&self) -> Option<PostingIdentity> {
        PostingIdentity::derive(&self.company, &self.url)
    }
}

/// Dedup key: case-folded company + trailing-slash-stripped URL.
///
/// Two postings with equal identity are the same real-world listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingIdentity(String);

impl PostingIdentity {
    /// Derive the identity from raw company and URL fields.
    ///
    /// Returns `None` when both are empty: such a posting cannot be
    /// deduplicated safely and must never be alerted (see the engine).
    pub fn derive(company: &str, url: &str) -> Option<Self> {
        let company = fold(company);
        let url = fold_url(url);
        if company.is_empty() && url.is_empty() {
            return None;
        }
        Some(Self(format!("{company}|{url}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short hex fingerprint for logs; never log the raw key.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

impl std::fmt::Display for PostingIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase and collapse internal whitespace.
fn fold(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase, trim, and strip trailing slashes so `…/jobs/` == `…/jobs`.
fn fold_url(s: &str) -> String {
    let mut out = s.trim().to_lowercase();
    while out.ends_with('/') {
        out.pop();
    }
    out
}
