//! # Decision Engine
//! Pure, testable logic that maps a batch of postings plus the current
//! state snapshot to `(routing decisions, merge patches, faults)`.
//! No I/O, suitable for unit tests and offline evaluation.
//!
//! Policy per posting, in input order: score → classify → derive identity →
//! suppression check → decision + patch. Postings without a resolvable
//! identity are scored but routed to no channel and excluded from state
//! mutation; a malformed posting is recorded as a fault and skipped, never
//! aborting the batch.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PostingFault;
use crate::posting::NormalizedPosting;
use crate::scoring::{ScoreBreakdown, ScoreCalculator};
use std::collections::HashMap;

use crate::state::{merge, should_alert, AlertRecord, MergePatch, StateSnapshot};
use crate::tier::{Channel, RouteMap, Tier, TierThresholds};

/// One routing decision per posting per run. `channel == None` means no
/// alert fires this run (suppressed or unresolvable).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    /// The scored posting, carried along for channel rendering.
    pub posting: NormalizedPosting,
    /// Absent only for postings with no resolvable identity.
    pub identity: Option<crate::posting::PostingIdentity>,
    pub breakdown: ScoreBreakdown,
    pub tier: Tier,
    pub channel: Option<Channel>,
}

/// Everything one batch produces. Patches are applied by the caller after
/// the whole batch is decided, never mid-batch.
#[derive(Debug, Clone, Default)]
pub struct DecisionBatch {
    pub decisions: Vec<RoutingDecision>,
    pub patches: Vec<MergePatch>,
    pub faults: Vec<PostingFault>,
}

pub struct DecisionEngine {
    calc: ScoreCalculator,
    thresholds: TierThresholds,
    routes: RouteMap,
}

impl DecisionEngine {
    pub fn new(calc: ScoreCalculator, thresholds: TierThresholds, routes: RouteMap) -> Self {
        Self {
            calc,
            thresholds,
            routes,
        }
    }

    /// Decide a whole batch against a read-only snapshot.
    pub fn decide(
        &self,
        postings: &[NormalizedPosting],
        snapshot: &StateSnapshot,
        now: DateTime<Utc>,
    ) -> DecisionBatch {
        let mut out = DecisionBatch::default();
        // In-batch overlay: later occurrences of an identity are decided
        // against the state its earlier patches already proposed, so one
        // listing appearing twice in a batch alerts at most once.
        let mut pending: HashMap<String, AlertRecord> = HashMap::new();

        for posting in postings {
            if posting.title.trim().is_empty() {
                let fault = PostingFault::MissingTitle {
                    url: posting.url.clone(),
                };
                tracing::warn!(url = %posting.url, "skipping malformed posting");
                out.faults.push(fault);
                continue;
            }

            let breakdown = self.calc.score(posting);
            let tier = self.thresholds.classify(breakdown.total);

            let Some(identity) = posting.identity() else {
                // No company and no URL: cannot dedup, so never alert and
                // never persist — alerting would repeat forever.
                tracing::debug!(title = %posting.title, "unresolvable identity, routing none");
                out.decisions.push(RoutingDecision {
                    posting: posting.clone(),
                    identity: None,
                    breakdown,
                    tier,
                    channel: None,
                });
                continue;
            };

            let target = self.routes.channel_for(tier);
            let existing = pending
                .get(identity.as_str())
                .or_else(|| snapshot.lookup(&identity));
            let channel = should_alert(existing, tier, target).then_some(target);

            tracing::debug!(
                id = %identity.fingerprint(),
                total = breakdown.total,
                ?tier,
                ?channel,
                "decision"
            );

            let patch = MergePatch {
                identity: identity.clone(),
                score: breakdown.total,
                tier,
                channel,
                seen_at: now,
            };
            let merged = merge(
                pending
                    .get(identity.as_str())
                    .or_else(|| snapshot.lookup(&identity)),
                &patch,
            );
            pending.insert(identity.as_str().to_string(), merged);
            out.patches.push(patch);
            out.decisions.push(RoutingDecision {
                posting: posting.clone(),
                identity: Some(identity),
                breakdown,
                tier,
                channel,
            });
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoringConfig;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn engine() -> DecisionEngine {
        let cfg = ScoringConfig {
            seniority: BTreeMap::from([
                ("principal".to_string(), 40),
                ("senior".to_string(), 20),
            ]),
            seniority_baseline: 5,
            domain: BTreeMap::from([
                ("llm".to_string(), 25),
                ("machine learning".to_string(), 15),
            ]),
            location_allow: vec!["remote".to_string()],
        };
        DecisionEngine::new(
            ScoreCalculator::new(cfg),
            TierThresholds {
                urgent: 80,
                high: 60,
                medium: 40,
            },
            RouteMap {
                urgent: Channel::Push,
                high: Channel::Digest,
                medium: Channel::Digest,
                low: Channel::Weekly,
            },
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap()
    }

    fn posting(title: &str, company: &str, url: &str, location: Option<&str>) -> NormalizedPosting {
        NormalizedPosting {
            source_id: url.to_string(),
            title: title.into(),
            company: company.into(),
            location: location.map(Into::into),
            url: url.into(),
            posted_at: None,
            raw_text: String::new(),
        }
    }

    #[test]
    fn urgent_posting_routes_to_push() {
        // principal(40) + llm(25) + machine learning(15) + remote(20) = 100
        let p = posting(
            "Principal LLM Machine Learning Engineer",
            "Acme",
            "https://acme.example/jobs/1",
            Some("Remote"),
        );
        let batch = engine().decide(&[p], &StateSnapshot::default(), now());
        assert_eq!(batch.decisions.len(), 1);
        assert_eq!(batch.decisions[0].tier, Tier::Urgent);
        assert_eq!(batch.decisions[0].channel, Some(Channel::Push));
        assert_eq!(batch.patches.len(), 1);
    }

    #[test]
    fn second_run_with_unchanged_tier_is_suppressed() {
        let eng = engine();
        let p = posting(
            "Principal LLM Machine Learning Engineer",
            "Acme",
            "https://acme.example/jobs/1",
            Some("Remote"),
        );
        let mut snap = StateSnapshot::default();

        let run1 = eng.decide(std::slice::from_ref(&p), &snap, now());
        assert_eq!(run1.decisions[0].channel, Some(Channel::Push));
        for patch in &run1.patches {
            snap.apply(patch);
        }

        let run2 = eng.decide(std::slice::from_ref(&p), &snap, now());
        assert_eq!(run2.decisions[0].channel, None);
        // Patch is still emitted so last_seen keeps moving.
        assert_eq!(run2.patches.len(), 1);
    }

    #[test]
    fn escalated_tier_realerts_on_new_channel() {
        let eng = engine();
        let mut snap = StateSnapshot::default();

        // Run 1: senior(20) + machine learning(15) + no location(10) = 45 → MEDIUM → digest
        let medium = posting(
            "Senior Machine Learning Engineer",
            "Acme",
            "https://acme.example/jobs/2",
            None,
        );
        let run1 = eng.decide(std::slice::from_ref(&medium), &snap, now());
        assert_eq!(run1.decisions[0].tier, Tier::Medium);
        assert_eq!(run1.decisions[0].channel, Some(Channel::Digest));
        for patch in &run1.patches {
            snap.apply(patch);
        }

        // Run 2: same identity, re-posted as principal remote → URGENT → push fires.
        let urgent = posting(
            "Principal LLM Machine Learning Engineer",
            "Acme",
            "https://acme.example/jobs/2",
            Some("Remote"),
        );
        let run2 = eng.decide(std::slice::from_ref(&urgent), &snap, now());
        assert_eq!(run2.decisions[0].tier, Tier::Urgent);
        assert_eq!(run2.decisions[0].channel, Some(Channel::Push));
    }

    #[test]
    fn unresolvable_identity_scored_but_never_routed_or_persisted() {
        let p = posting("Principal LLM Engineer", "", "", Some("Remote"));
        let batch = engine().decide(&[p], &StateSnapshot::default(), now());
        assert_eq!(batch.decisions.len(), 1);
        assert!(batch.decisions[0].identity.is_none());
        assert_eq!(batch.decisions[0].channel, None);
        assert!(batch.decisions[0].breakdown.total > 0);
        assert!(batch.patches.is_empty());
    }

    #[test]
    fn malformed_posting_is_a_fault_not_an_abort() {
        let bad = posting("   ", "Acme", "https://acme.example/jobs/3", None);
        let good = posting(
            "Senior Machine Learning Engineer",
            "Acme",
            "https://acme.example/jobs/4",
            None,
        );
        let batch = engine().decide(&[bad, good], &StateSnapshot::default(), now());
        assert_eq!(batch.faults.len(), 1);
        assert_eq!(batch.decisions.len(), 1);
        assert_eq!(batch.patches.len(), 1);
    }

    #[test]
    fn duplicate_identity_in_one_batch_alerts_once() {
        let p = posting(
            "Principal LLM Machine Learning Engineer",
            "Acme",
            "https://acme.example/jobs/9",
            Some("Remote"),
        );
        let batch = engine().decide(&[p.clone(), p], &StateSnapshot::default(), now());
        assert_eq!(batch.decisions[0].channel, Some(Channel::Push));
        assert_eq!(batch.decisions[1].channel, None);
    }

    #[test]
    fn decisions_preserve_input_order() {
        let a = posting("Senior Machine Learning Engineer", "A", "https://a.example/1", None);
        let b = posting("Principal LLM Engineer", "B", "https://b.example/1", Some("Remote"));
        let batch = engine().decide(&[a, b], &StateSnapshot::default(), now());
        assert_eq!(
            batch.decisions[0].identity.as_ref().unwrap().as_str(),
            "a|https://a.example/1"
        );
        assert_eq!(
            batch.decisions[1].identity.as_ref().unwrap().as_str(),
            "b|https://b.example/1"
        );
    }
}
