// src/ingest/types.rs
use anyhow::Result;

use crate::posting::NormalizedPosting;

/// One employer source the monitor polls. Implementations own the fetch
/// and parse mechanics; the engine only ever sees normalized postings.
#[async_trait::async_trait]
pub trait PostingSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<NormalizedPosting>>;
    fn name(&self) -> &str;
}
