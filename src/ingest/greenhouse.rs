// src/ingest/greenhouse.rs
//! Greenhouse-style JSON board source. Much more reliable than scraping:
//! the board API exposes titles, locations, and update times directly.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::clean_text;
use super::types::PostingSource;
use crate::posting::NormalizedPosting;

#[derive(Debug, Deserialize)]
struct Board {
    #[serde(default)]
    jobs: Vec<BoardJob>,
}

#[derive(Debug, Deserialize)]
struct BoardJob {
    id: Option<u64>,
    title: String,
    absolute_url: String,
    #[serde(default)]
    location: Option<BoardLocation>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    /// HTML body; present when the board is queried with content=true.
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BoardLocation {
    name: String,
}

pub struct GreenhouseSource {
    company: String,
    board_url: String,
    client: reqwest::Client,
}

impl GreenhouseSource {
    pub fn new(company: impl Into<String>, board_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            company: company.into(),
            board_url: board_url.into(),
            client,
        }
    }

    fn to_postings(&self, board: Board) -> Vec<NormalizedPosting> {
        board
            .jobs
            .into_iter()
            .map(|job| {
                let raw_text = match &job.content {
                    Some(html) => clean_text(html),
                    None => job.title.clone(),
                };
                NormalizedPosting {
                    source_id: job
                        .id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| job.absolute_url.clone()),
                    title: clean_text(&job.title),
                    company: self.company.clone(),
                    location: job.location.map(|l| l.name),
                    url: job.absolute_url,
                    posted_at: job.updated_at,
                    raw_text,
                }
            })
            .collect()
    }
}

#[async_trait]
impl PostingSource for GreenhouseSource {
    async fn fetch_latest(&self) -> Result<Vec<NormalizedPosting>> {
        let board: Board = self
            .client
            .get(&self.board_url)
            .send()
            .await
            .with_context(|| format!("fetching board {}", self.board_url))?
            .error_for_status()
            .with_context(|| format!("non-2xx from {}", self.board_url))?
            .json()
            .await
            .context("parsing board json")?;
        Ok(self.to_postings(board))
    }

    fn name(&self) -> &str {
        &self.company
    }
}
