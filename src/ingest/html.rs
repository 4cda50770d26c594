// src/ingest/html.rs
//! Generic career-page source: fetch a page over HTTP and scrape anchors.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::extract::extract_jobs;
use super::types::PostingSource;
use crate::posting::NormalizedPosting;

/// Some career sites serve bot-hostile empty shells to default UAs.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

pub struct CareerPageSource {
    company: String,
    url: String,
    client: reqwest::Client,
}

impl CareerPageSource {
    pub fn new(company: impl Into<String>, url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            company: company.into(),
            url: url.into(),
            client,
        }
    }

    fn to_postings(&self, html: &str) -> Vec<NormalizedPosting> {
        extract_jobs(html, &self.url)
            .into_iter()
            .map(|job| NormalizedPosting {
                source_id: job.url.clone(),
                raw_text: job.title.clone(),
                title: job.title,
                company: self.company.clone(),
                location: None,
                url: job.url,
                posted_at: None,
            })
            .collect()
    }
}

#[async_trait]
impl PostingSource for CareerPageSource {
    async fn fetch_latest(&self) -> Result<Vec<NormalizedPosting>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("fetching {}", self.url))?
            .error_for_status()
            .with_context(|| format!("non-2xx from {}", self.url))?
            .text()
            .await
            .context("reading career page body")?;
        Ok(self.to_postings(&body))
    }

    fn name(&self) -> &str {
        &self.company
    }
}
