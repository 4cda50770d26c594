//! Run orchestration: load state, fetch, decide, dispatch, persist.
//!
//! One `run_once` is the whole pipeline for a single invocation; decisions
//! are computed for the full batch before any state is written, and the
//! snapshot is replaced atomically at the end. Config and state problems
//! abort the run; everything per-posting or per-source degrades locally.
//!
//! Digest and weekly items accumulate in memory across continuous-mode
//! ticks and are flushed inside the configured send window (digest daily,
//! weekly summary on Mondays).

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local, NaiveTime, Timelike, Utc, Weekday};
use metrics::{counter, gauge};

use crate::config::{MonitorConfig, SourceConfig, SourceKind};
use crate::engine::DecisionEngine;
use crate::ingest::greenhouse::GreenhouseSource;
use crate::ingest::html::CareerPageSource;
use crate::ingest::types::PostingSource;
use crate::ingest::{self, IngestFilter};
use crate::metrics as m;
use crate::notify::{AlertPayload, Dispatcher};
use crate::scoring::ScoreCalculator;
use crate::state;
use crate::tier::Channel;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub pushed: usize,
    pub queued: usize,
    pub suppressed: usize,
    pub faults: usize,
    pub source_errors: usize,
}

pub struct Monitor {
    cfg: MonitorConfig,
    engine: DecisionEngine,
    providers: Vec<Box<dyn PostingSource>>,
    dispatcher: Dispatcher,
    digest_queue: Vec<AlertPayload>,
    weekly_queue: Vec<AlertPayload>,
}

/// Instantiate the configured sources.
pub fn build_sources(cfgs: &[SourceConfig]) -> Vec<Box<dyn PostingSource>> {
    cfgs.iter()
        .map(|s| match s.kind {
            SourceKind::Html => {
                Box::new(CareerPageSource::new(&s.name, &s.url)) as Box<dyn PostingSource>
            }
            SourceKind::Greenhouse => Box::new(GreenhouseSource::new(&s.name, &s.url)),
        })
        .collect()
}

impl Monitor {
    pub fn new(cfg: MonitorConfig, dispatcher: Dispatcher) -> Self {
        let providers = build_sources(&cfg.sources);
        Self::with_providers(cfg, providers, dispatcher)
    }

    /// Inject providers directly; tests use stub sources.
    pub fn with_providers(
        cfg: MonitorConfig,
        providers: Vec<Box<dyn PostingSource>>,
        dispatcher: Dispatcher,
    ) -> Self {
        let engine = DecisionEngine::new(
            ScoreCalculator::new(cfg.scoring.clone()),
            cfg.thresholds,
            cfg.routes,
        );
        Self {
            cfg,
            engine,
            providers,
            dispatcher,
            digest_queue: Vec::new(),
            weekly_queue: Vec::new(),
        }
    }

    /// One complete check cycle.
    pub async fn run_once(&mut self) -> Result<RunSummary> {
        m::ensure_described();
        let now = Utc::now();

        // Corrupt state is fatal: proceeding with an empty snapshot would
        // re-alert the whole history.
        let mut snapshot = state::load(&self.cfg.state_path).context("loading dedup state")?;

        let filter = IngestFilter {
            max_age_days: self.cfg.max_posting_age_days,
            ..Default::default()
        };
        let (postings, source_errors) = ingest::run_once(&self.providers, &filter, now).await;

        let batch = self.engine.decide(&postings, &snapshot, now);

        let mut summary = RunSummary {
            fetched: postings.len(),
            faults: batch.faults.len(),
            source_errors,
            ..Default::default()
        };
        counter!(m::DECISIONS).increment(batch.decisions.len() as u64);
        counter!(m::FAULTS).increment(batch.faults.len() as u64);

        for decision in &batch.decisions {
            let payload = AlertPayload {
                company: decision.posting.company.clone(),
                title: decision.posting.title.clone(),
                url: decision.posting.url.clone(),
                score: decision.breakdown.total,
                tier: decision.tier,
            };
            match decision.channel {
                Some(Channel::Push) => {
                    summary.pushed += 1;
                    counter!(m::ALERTS_ROUTED).increment(1);
                    self.dispatcher.push(&payload).await;
                }
                Some(Channel::Digest) => {
                    summary.queued += 1;
                    counter!(m::ALERTS_ROUTED).increment(1);
                    self.digest_queue.push(payload);
                }
                Some(Channel::Weekly) => {
                    summary.queued += 1;
                    counter!(m::ALERTS_ROUTED).increment(1);
                    self.weekly_queue.push(payload);
                }
                None => {
                    summary.suppressed += 1;
                    counter!(m::SUPPRESSED).increment(1);
                }
            }
        }

        // All decisions are in; now merge and replace the snapshot
        // atomically. A crash before this point changes nothing on disk.
        for patch in &batch.patches {
            snapshot.apply(patch);
        }
        state::save_atomic(&self.cfg.state_path, &snapshot)
            .await
            .context("persisting dedup state")?;

        gauge!(m::LAST_RUN_TS).set(now.timestamp() as f64);
        gauge!(m::STATE_RECORDS).set(snapshot.len() as f64);
        tracing::info!(
            fetched = summary.fetched,
            pushed = summary.pushed,
            queued = summary.queued,
            suppressed = summary.suppressed,
            faults = summary.faults,
            source_errors = summary.source_errors,
            "run complete"
        );

        Ok(summary)
    }

    /// Run forever with a fixed check interval, flushing the digest and
    /// weekly queues when their windows come around.
    pub async fn run_continuous(&mut self, interval: std::time::Duration) -> Result<()> {
        m::maybe_install_exporter();
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.run_once().await?;

            let local: DateTime<Local> = Local::now();
            if self.digest_due(local.time()) {
                self.flush_digest().await;
            }
            if local.weekday() == Weekday::Mon && self.weekly_due(local.time()) {
                self.flush_weekly().await;
            }
        }
    }

    fn digest_due(&self, now: NaiveTime) -> bool {
        !self.digest_queue.is_empty()
            && in_send_window(now, self.cfg.digest_hour, self.cfg.digest_window_mins)
    }

    fn weekly_due(&self, now: NaiveTime) -> bool {
        !self.weekly_queue.is_empty()
            && in_send_window(now, self.cfg.digest_hour, self.cfg.digest_window_mins)
    }

    pub async fn flush_digest(&mut self) {
        let subject = format!("Daily Job Digest: {} New Roles", self.digest_queue.len());
        let items = std::mem::take(&mut self.digest_queue);
        self.dispatcher.send_batch(&subject, &items).await;
    }

    pub async fn flush_weekly(&mut self) {
        let subject = format!("Weekly Job Summary: {} Roles", self.weekly_queue.len());
        let items = std::mem::take(&mut self.weekly_queue);
        self.dispatcher.send_batch(&subject, &items).await;
    }

    #[cfg(test)]
    fn queued_digest(&self) -> usize {
        self.digest_queue.len()
    }
}

/// True when `now` falls inside `[hour:00, hour:window_mins]`.
fn in_send_window(now: NaiveTime, hour: u32, window_mins: u32) -> bool {
    now.hour() == hour && now.minute() <= window_mins
}
