// src/ingest/mod.rs
pub mod extract;
pub mod greenhouse;
pub mod html;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::counter;

use crate::ingest::types::PostingSource;
use crate::metrics as m;
use crate::posting::NormalizedPosting;

/// Normalize scraped text: decode entities, strip tags, collapse whitespace.
pub fn clean_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 4) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Batch-level filters applied after providers return.
#[derive(Debug, Clone)]
pub struct IngestFilter {
    /// Titles shorter than this are navigation noise, longer are blurbs.
    pub min_title_len: usize,
    pub max_title_len: usize,
    /// Drop postings that look older than this many days.
    pub max_age_days: Option<u32>,
}

impl Default for IngestFilter {
    fn default() -> Self {
        Self {
            min_title_len: 10,
            max_title_len: 200,
            max_age_days: None,
        }
    }
}

/// True if the posting looks older than `max_age_days`. Uses `posted_at`
/// when the source exposes it, otherwise falls back to an "N days ago"
/// marker in the raw text.
pub fn looks_stale(posting: &NormalizedPosting, now: DateTime<Utc>, max_age_days: u32) -> bool {
    if let Some(posted) = posting.posted_at {
        return now.signed_duration_since(posted).num_days() > max_age_days as i64;
    }

    static RE_AGE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_age = RE_AGE.get_or_init(|| regex::Regex::new(r"(\d+)\s+day").unwrap());
    let hay = posting.raw_text.to_lowercase();
    match re_age
        .captures(&hay)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
    {
        Some(days) => days > max_age_days,
        None => false,
    }
}

/// Apply title-length and staleness filters.
/// Returns `(kept, len_filtered, stale_filtered)`.
pub fn filter_batch(
    now: DateTime<Utc>,
    raw: Vec<NormalizedPosting>,
    filter: &IngestFilter,
) -> (Vec<NormalizedPosting>, usize, usize) {
    let mut len_out = 0usize;
    let mut stale_out = 0usize;
    let mut kept = Vec::with_capacity(raw.len());

    for posting in raw {
        let title_len = posting.title.chars().count();
        if title_len < filter.min_title_len || title_len > filter.max_title_len {
            len_out += 1;
            continue;
        }
        if let Some(max_age) = filter.max_age_days {
            if looks_stale(&posting, now, max_age) {
                stale_out += 1;
                continue;
            }
        }
        kept.push(posting);
    }

    (kept, len_out, stale_out)
}

/// Fetch every source once and filter the combined batch. A failing
/// source is logged and counted, never fatal to the run.
/// Returns `(postings, source_error_count)`.
pub async fn run_once(
    providers: &[Box<dyn PostingSource>],
    filter: &IngestFilter,
    now: DateTime<Utc>,
) -> (Vec<NormalizedPosting>, usize) {
    m::ensure_described();

    let mut raw = Vec::new();
    let mut errors = 0usize;
    for p in providers {
        match p.fetch_latest().await {
            Ok(mut v) => {
                tracing::debug!(source = p.name(), count = v.len(), "source fetched");
                raw.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = p.name(), "source error");
                counter!(m::SOURCE_ERRORS).increment(1);
                errors += 1;
            }
        }
    }

    let (kept, len_out, stale_out) = filter_batch(now, raw, filter);
    tracing::info!(
        kept = kept.len(),
        len_filtered = len_out,
        stale_filtered = stale_out,
        "ingest complete"
    );
    counter!(m::POSTINGS_FETCHED).increment(kept.len() as u64);

    (kept, errors)
}
